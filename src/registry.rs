use tracing::debug;

use crate::error::{HarnessError, Result, StrategyError};
use crate::strategy::{self, Simulation, Strategy, StrategyKind};

#[derive(Debug, Default)]
pub struct Registry {
    strategies: Vec<Strategy>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in strategy.
    pub fn with_defaults() -> Self {
        Self {
            strategies: strategy::defaults(),
        }
    }

    pub fn register<F>(&mut self, name: impl Into<String>, kind: StrategyKind, run: F) -> Result<()>
    where
        F: Fn(&mut Simulation<'_>) -> std::result::Result<Vec<f64>, StrategyError> + 'static,
    {
        self.register_strategy(Strategy::new(name, kind, run))
    }

    pub fn register_strategy(&mut self, strategy: Strategy) -> Result<()> {
        if self.get(strategy.name()).is_some() {
            return Err(HarnessError::DuplicateStrategyName(strategy.name().to_string()));
        }
        debug!(name = strategy.name(), kind = ?strategy.kind(), "strategy registered");
        self.strategies.push(strategy);
        Ok(())
    }

    /// All strategies in registration order.
    pub fn list(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn get(&self, name: &str) -> Option<&Strategy> {
        self.strategies.iter().find(|strategy| strategy.name() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.iter().map(Strategy::name)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
