//! Error types for the benchmark harness.

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised from inside a strategy while it computes its sample means.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    /// The per-repetition wall-clock budget ran out.
    #[error("exceeded budget of {budget:?} after {elapsed:?}")]
    BudgetExceeded { budget: Duration, elapsed: Duration },

    /// A typed map returned a result whose width differs from the declared one.
    #[error("call {index} returned {actual} values, declared width is {expected}")]
    ShapeMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// Any other failure reported by a user-supplied strategy.
    #[error("{0}")]
    Failed(String),
}

impl StrategyError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("strategy name '{0}' is already registered")]
    DuplicateStrategyName(String),

    #[error("no strategy named '{0}' is registered")]
    UnknownStrategy(String),

    #[error("invalid parameter '{parameter}': value {value} {constraint}")]
    InvalidParameter {
        parameter: &'static str,
        value: String,
        constraint: &'static str,
    },

    #[error("strategy '{name}' failed: {source}")]
    StrategyExecution {
        name: String,
        #[source]
        source: StrategyError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl HarnessError {
    /// Create an error for a parameter that violates a constraint.
    ///
    /// # Example
    /// ```
    /// use simbench::HarnessError;
    ///
    /// let error = HarnessError::invalid_parameter("sample_size", 0, "must be positive");
    /// assert!(error.to_string().contains("sample_size"));
    /// ```
    pub fn invalid_parameter(
        parameter: &'static str,
        value: impl ToString,
        constraint: &'static str,
    ) -> Self {
        Self::InvalidParameter {
            parameter,
            value: value.to_string(),
            constraint,
        }
    }

    pub fn strategy(name: impl Into<String>, source: StrategyError) -> Self {
        Self::StrategyExecution {
            name: name.into(),
            source,
        }
    }

    pub fn strategy_name(&self) -> Option<&str> {
        match self {
            Self::StrategyExecution { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// A specialized `Result` type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_error() {
        let error = HarnessError::invalid_parameter("tolerance", -1.0, "must be non-negative");
        assert_eq!(
            error.to_string(),
            "invalid parameter 'tolerance': value -1 must be non-negative"
        );
    }

    #[test]
    fn test_strategy_execution_carries_name() {
        let error = HarnessError::strategy("growing-loop", StrategyError::failed("boom"));
        assert_eq!(error.strategy_name(), Some("growing-loop"));
        assert_eq!(error.to_string(), "strategy 'growing-loop' failed: boom");
    }

    #[test]
    fn test_shape_mismatch_error() {
        let error = StrategyError::ShapeMismatch {
            index: 4,
            expected: 1,
            actual: 2,
        };
        assert_eq!(
            error.to_string(),
            "call 4 returned 2 values, declared width is 1"
        );
    }

    #[test]
    fn test_duplicate_name_error() {
        let error = HarnessError::DuplicateStrategyName("typed-map".into());
        assert!(error.to_string().contains("typed-map"));
        assert_eq!(error.strategy_name(), None);
    }
}
