use tracing::{info, warn};

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::registry::Registry;
use crate::report::{Report, StrategyOutcome};
use crate::strategy::Strategy;
use crate::timing::TimingHarness;

#[derive(Debug, Clone)]
pub struct Benchmark {
    config: HarnessConfig,
}

impl Benchmark {
    pub fn new(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Strategies this benchmark will time, in registration order. The
    /// reference is always included, even when it is an anti-pattern.
    pub fn selected<'r>(&self, registry: &'r Registry) -> Vec<(usize, &'r Strategy)> {
        registry
            .list()
            .iter()
            .enumerate()
            .filter(|(_, strategy)| {
                self.config.include_anti_patterns
                    || !strategy.is_anti_pattern()
                    || strategy.name() == self.config.reference
            })
            .collect()
    }

    /// Times every selected strategy one after another. A strategy that fails
    /// is recorded as failed; the others still run.
    pub fn run(&self, registry: &Registry) -> Result<Report> {
        if registry.get(&self.config.reference).is_none() {
            return Err(HarnessError::UnknownStrategy(self.config.reference.clone()));
        }

        let params = self.config.params();
        let mut harness = TimingHarness::new(self.config.seed).with_warmup(self.config.warmup);
        if let Some(budget) = self.config.budget() {
            harness = harness.with_budget(budget);
        }

        info!(
            sample_size = params.sample_size,
            replications = params.replications,
            repetitions = self.config.repetitions,
            warmup = self.config.warmup,
            seed = self.config.seed,
            "starting benchmark"
        );

        let outcomes: Vec<StrategyOutcome> = self
            .selected(registry)
            .into_iter()
            .map(|(order, strategy)| {
                info!(strategy = strategy.name(), "timing");
                let trials = harness.run(strategy, &params, self.config.repetitions);
                if let Err(error) = &trials {
                    warn!(strategy = strategy.name(), %error, "strategy failed");
                }
                StrategyOutcome {
                    name: strategy.name().to_string(),
                    order,
                    trials,
                }
            })
            .collect();

        let report = Report::build(&outcomes, &self.config.reference, self.config.tolerance);
        if let Some(fastest) = report.fastest() {
            info!(strategy = %fastest.name, "fastest strategy");
        }
        Ok(report)
    }
}
