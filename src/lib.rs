//! # simbench
//!
//! Benchmark harness for the different ways of computing a batch of
//! simulated sample means: draw `n` random values, reduce them to their mean,
//! and do that `N` times.
//!
//! Each [`Strategy`] is run under an identically re-seeded [`RandomSource`],
//! timed over several repetitions, checked for numeric equivalence against a
//! reference strategy, and ranked in a [`Report`].
//!
//! ```rust
//! use simbench::{Benchmark, HarnessConfig, Registry};
//!
//! let config = HarnessConfig {
//!     replications: 100,
//!     repetitions: 3,
//!     ..Default::default()
//! };
//! let report = Benchmark::new(config)?.run(&Registry::with_defaults())?;
//! assert!(report.all_equivalent());
//! println!("{}", report.render_text());
//! # Ok::<(), simbench::HarnessError>(())
//! ```

pub mod benchmark;
pub mod config;
pub mod equivalence;
pub mod error;
pub mod grid;
pub mod registry;
pub mod report;
pub mod source;
pub mod strategy;
pub mod timing;

pub use benchmark::Benchmark;
pub use config::{ConfigError, HarnessConfig};
pub use equivalence::{equivalent, Mismatch};
pub use error::{HarnessError, Result, StrategyError};
pub use grid::{Grid, Layout};
pub use registry::Registry;
pub use report::{Equivalence, Report, ReportRow, RowStatus, StrategyOutcome};
pub use source::{Distribution, RandomSource};
pub use strategy::{Simulation, Strategy, StrategyKind};
pub use timing::{SimulationParams, TimingHarness, TrialResult};
