//! Strategies: interchangeable ways of computing a batch of sample means.
//!
//! Every strategy receives a [`Simulation`] holding the seeded
//! [`RandomSource`] and the simulation size, and returns one mean per
//! replication. All default strategies consume draws in the same order
//! (replication by replication, `n` draws each), so for a given seed they
//! agree with each other up to floating-point noise.

use std::fmt;
use std::time::{Duration, Instant};

use crate::error::StrategyError;
use crate::grid::{self, Grid};
use crate::source::RandomSource;
use crate::timing::SimulationParams;

pub const BATCH_REPLICATE: &str = "batch-replicate";
pub const PREALLOCATED_LOOP: &str = "preallocated-loop";
pub const GROWING_LOOP: &str = "growing-loop";
pub const CONCATENATION_LOOP: &str = "concatenation-loop";
pub const MATRIX_REDUCE: &str = "matrix-reduce";
pub const AXIS_APPLY: &str = "axis-apply";
pub const MAP_SIMPLIFY: &str = "map-simplify";
pub const MAP_FLATTEN: &str = "map-flatten";
pub const TYPED_MAP: &str = "typed-map";

/// Signature shared by every strategy.
pub type StrategyFn = dyn Fn(&mut Simulation<'_>) -> Result<Vec<f64>, StrategyError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Competitive,
    /// Quadratic-cost strategies kept for correctness checks; left out of the
    /// timed table unless explicitly requested.
    AntiPattern,
}

pub struct Strategy {
    name: String,
    kind: StrategyKind,
    run: Box<StrategyFn>,
}

impl Strategy {
    pub fn new<F>(name: impl Into<String>, kind: StrategyKind, run: F) -> Self
    where
        F: Fn(&mut Simulation<'_>) -> Result<Vec<f64>, StrategyError> + 'static,
    {
        Self {
            name: name.into(),
            kind,
            run: Box::new(run),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn is_anti_pattern(&self) -> bool {
        self.kind == StrategyKind::AntiPattern
    }

    #[inline]
    pub fn invoke(&self, simulation: &mut Simulation<'_>) -> Result<Vec<f64>, StrategyError> {
        (self.run)(simulation)
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Everything a strategy may touch during one invocation.
pub struct Simulation<'a> {
    source: &'a mut RandomSource,
    params: &'a SimulationParams,
    started: Instant,
    budget: Option<Duration>,
}

impl<'a> Simulation<'a> {
    pub fn new(source: &'a mut RandomSource, params: &'a SimulationParams) -> Self {
        Self {
            source,
            params,
            started: Instant::now(),
            budget: None,
        }
    }

    pub fn with_budget(mut self, budget: Option<Duration>) -> Self {
        self.budget = budget;
        self
    }

    pub fn replications(&self) -> usize {
        self.params.replications
    }

    /// Draws one subsample of `n` values.
    pub fn draw_sample(&mut self) -> Vec<f64> {
        self.source.sample(self.params.distribution, self.params.sample_size)
    }

    /// One replication: draw a subsample and reduce it to its mean.
    #[inline]
    pub fn sample_mean(&mut self) -> f64 {
        grid::mean(&self.draw_sample())
    }

    /// Draws every replication at once as an `n`-by-`N` grid.
    pub fn draw_grid(&mut self) -> Grid {
        Grid::draw(
            &mut *self.source,
            self.params.distribution,
            self.params.sample_size,
            self.params.replications,
            self.params.layout,
        )
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fails once the per-repetition budget has run out.
    pub fn checkpoint(&self) -> Result<(), StrategyError> {
        match self.budget {
            Some(budget) if self.elapsed() > budget => Err(StrategyError::BudgetExceeded {
                budget,
                elapsed: self.elapsed(),
            }),
            _ => Ok(()),
        }
    }
}

pub fn batch_replicate(simulation: &mut Simulation<'_>) -> Result<Vec<f64>, StrategyError> {
    let count = simulation.replications();
    Ok(grid::replicate(count, || simulation.sample_mean()))
}

#[allow(clippy::needless_range_loop)]
pub fn preallocated_loop(simulation: &mut Simulation<'_>) -> Result<Vec<f64>, StrategyError> {
    let mut means = vec![0.0; simulation.replications()];
    for index in 0..means.len() {
        simulation.checkpoint()?;
        means[index] = simulation.sample_mean();
    }
    Ok(means)
}

pub fn growing_loop(simulation: &mut Simulation<'_>) -> Result<Vec<f64>, StrategyError> {
    let mut means: Vec<f64> = Vec::new();
    for _ in 0..simulation.replications() {
        simulation.checkpoint()?;
        let mean = simulation.sample_mean();
        // Grow by exactly one slot so every iteration copies all earlier results.
        let mut grown = Vec::with_capacity(means.len() + 1);
        grown.extend_from_slice(&means);
        grown.push(mean);
        means = grown;
    }
    Ok(means)
}

pub fn concatenation_loop(simulation: &mut Simulation<'_>) -> Result<Vec<f64>, StrategyError> {
    let mut means: Vec<f64> = Vec::new();
    for _ in 0..simulation.replications() {
        simulation.checkpoint()?;
        let mean = simulation.sample_mean();
        means = [means.as_slice(), &[mean]].concat();
    }
    Ok(means)
}

pub fn matrix_reduce(simulation: &mut Simulation<'_>) -> Result<Vec<f64>, StrategyError> {
    Ok(simulation.draw_grid().column_means())
}

pub fn axis_apply(simulation: &mut Simulation<'_>) -> Result<Vec<f64>, StrategyError> {
    Ok(simulation.draw_grid().apply_columns(&grid::mean))
}

pub fn map_simplify(simulation: &mut Simulation<'_>) -> Result<Vec<f64>, StrategyError> {
    let count = simulation.replications();
    grid::map_simplify(count, |_| vec![simulation.sample_mean()])
        .into_vector()
        .ok_or_else(|| StrategyError::failed("per-replication results did not simplify to a vector"))
}

pub fn map_flatten(simulation: &mut Simulation<'_>) -> Result<Vec<f64>, StrategyError> {
    let count = simulation.replications();
    Ok(grid::flatten(grid::map_list(count, |_| vec![simulation.sample_mean()])))
}

pub fn typed_map(simulation: &mut Simulation<'_>) -> Result<Vec<f64>, StrategyError> {
    let count = simulation.replications();
    grid::map_typed(count, 1, |_| vec![simulation.sample_mean()])
}

/// The nine built-in strategies in their canonical order.
pub fn defaults() -> Vec<Strategy> {
    use StrategyKind::{AntiPattern, Competitive};

    vec![
        Strategy::new(BATCH_REPLICATE, Competitive, batch_replicate),
        Strategy::new(PREALLOCATED_LOOP, Competitive, preallocated_loop),
        Strategy::new(GROWING_LOOP, AntiPattern, growing_loop),
        Strategy::new(CONCATENATION_LOOP, AntiPattern, concatenation_loop),
        Strategy::new(MATRIX_REDUCE, Competitive, matrix_reduce),
        Strategy::new(AXIS_APPLY, Competitive, axis_apply),
        Strategy::new(MAP_SIMPLIFY, Competitive, map_simplify),
        Strategy::new(MAP_FLATTEN, Competitive, map_flatten),
        Strategy::new(TYPED_MAP, Competitive, typed_map),
    ]
}
