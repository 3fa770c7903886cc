use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{HarnessError, Result};
use crate::grid::Layout;
use crate::source::Distribution;
use crate::strategy::BATCH_REPLICATE;
use crate::timing::SimulationParams;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub sample_size: usize,
    pub replications: usize,
    pub repetitions: usize,
    /// Untimed runs before the timed repeats.
    pub warmup: usize,
    pub seed: u64,
    /// Element-wise tolerance for equivalence checks.
    pub tolerance: f64,
    pub reference: String,
    /// Time the quadratic anti-pattern strategies as well.
    pub include_anti_patterns: bool,
    /// Wall-clock cap for a single repetition, in milliseconds.
    pub budget_ms: Option<u64>,
    pub distribution: Distribution,
    pub layout: Layout,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            sample_size: 9,
            replications: 1000,
            repetitions: 20,
            warmup: 1,
            seed: 123,
            tolerance: 1e-9,
            reference: BATCH_REPLICATE.to_string(),
            include_anti_patterns: false,
            budget_ms: None,
            distribution: Distribution::Normal,
            layout: Layout::ColumnMajor,
        }
    }
}

impl HarnessConfig {
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn params(&self) -> SimulationParams {
        SimulationParams::new(self.sample_size, self.replications)
            .with_distribution(self.distribution)
            .with_layout(self.layout)
    }

    pub fn budget(&self) -> Option<Duration> {
        self.budget_ms.map(Duration::from_millis)
    }

    /// Rejects values no run could use; called before any timing starts.
    pub fn validate(&self) -> Result<()> {
        self.params().validate()?;
        if self.repetitions == 0 {
            return Err(HarnessError::invalid_parameter(
                "repetitions",
                self.repetitions,
                "must be positive",
            ));
        }
        if !(self.tolerance >= 0.0 && self.tolerance.is_finite()) {
            return Err(HarnessError::invalid_parameter(
                "tolerance",
                self.tolerance,
                "must be a finite, non-negative number",
            ));
        }
        if self.reference.trim().is_empty() {
            return Err(HarnessError::invalid_parameter(
                "reference",
                "\"\"",
                "must name a registered strategy",
            ));
        }
        if self.budget_ms == Some(0) {
            return Err(HarnessError::invalid_parameter(
                "budget_ms",
                0,
                "must be positive when set",
            ));
        }
        Ok(())
    }
}
