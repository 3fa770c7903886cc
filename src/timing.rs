use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{HarnessError, Result, StrategyError};
use crate::grid::Layout;
use crate::source::{Distribution, RandomSource};
use crate::strategy::{Simulation, Strategy};

/// Size and shape of one simulation: `replications` means of `sample_size` draws each.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationParams {
    pub sample_size: usize,
    pub replications: usize,
    pub distribution: Distribution,
    pub layout: Layout,
}

impl SimulationParams {
    pub fn new(sample_size: usize, replications: usize) -> Self {
        Self {
            sample_size,
            replications,
            distribution: Distribution::default(),
            layout: Layout::default(),
        }
    }

    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// A replication count of zero is valid and yields empty outputs.
    pub fn validate(&self) -> Result<()> {
        if self.sample_size == 0 {
            return Err(HarnessError::invalid_parameter(
                "sample_size",
                self.sample_size,
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// One strategy's output and wall-clock time for a single repetition.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialResult {
    pub output: Vec<f64>,
    pub elapsed: Duration,
}

/// Owns the random source and re-seeds it before every repetition.
#[derive(Debug)]
pub struct TimingHarness {
    source: RandomSource,
    budget: Option<Duration>,
    warmup: usize,
}

impl TimingHarness {
    pub fn new(seed: u64) -> Self {
        Self {
            source: RandomSource::from_seed(seed),
            budget: None,
            warmup: 1,
        }
    }

    /// Untimed invocations run before the timed repetitions of each strategy.
    pub fn with_warmup(mut self, warmup: usize) -> Self {
        self.warmup = warmup;
        self
    }

    /// Caps the wall-clock time of each repetition.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn seed(&self) -> u64 {
        self.source.seed()
    }

    /// Runs `strategy` `repetitions` times and returns every raw timing.
    ///
    /// The first error raised by the strategy aborts the run and is returned
    /// tagged with the strategy's name.
    pub fn run(
        &mut self,
        strategy: &Strategy,
        params: &SimulationParams,
        repetitions: usize,
    ) -> Result<Vec<TrialResult>> {
        params.validate()?;
        if repetitions == 0 {
            return Err(HarnessError::invalid_parameter(
                "repetitions",
                repetitions,
                "must be positive",
            ));
        }

        for _ in 0..self.warmup {
            self.invoke(strategy, params)?;
        }

        let mut trials = Vec::with_capacity(repetitions);
        for repetition in 0..repetitions {
            let trial = self.invoke(strategy, params)?;
            trace!(
                strategy = strategy.name(),
                repetition,
                elapsed_ns = trial.elapsed.as_nanos() as u64,
                "repetition finished"
            );
            trials.push(trial);
        }

        debug!(
            strategy = strategy.name(),
            repetitions,
            warmup = self.warmup,
            seed = self.seed(),
            "strategy timed"
        );
        Ok(trials)
    }

    fn invoke(&mut self, strategy: &Strategy, params: &SimulationParams) -> Result<TrialResult> {
        self.source.restart();
        let started = Instant::now();
        let output = {
            let mut simulation = Simulation::new(&mut self.source, params).with_budget(self.budget);
            strategy.invoke(&mut simulation)
        }
        .map_err(|source| HarnessError::strategy(strategy.name(), source))?;
        let elapsed = started.elapsed();

        if let Some(budget) = self.budget.filter(|budget| elapsed > *budget) {
            return Err(HarnessError::strategy(
                strategy.name(),
                StrategyError::BudgetExceeded { budget, elapsed },
            ));
        }
        Ok(TrialResult { output, elapsed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;
    use std::rc::Rc;

    use rstest::rstest;

    use crate::strategy::{self, StrategyKind};

    fn failing(_: &mut Simulation<'_>) -> std::result::Result<Vec<f64>, StrategyError> {
        Err(StrategyError::failed("deliberate"))
    }

    #[test]
    fn test_run_returns_every_repetition() {
        let strategy = Strategy::new("replicate", StrategyKind::Competitive, strategy::batch_replicate);
        let mut harness = TimingHarness::new(123);
        let trials = harness.run(&strategy, &SimulationParams::new(9, 10), 5).unwrap();
        assert_eq!(trials.len(), 5);
        assert!(trials.iter().all(|trial| trial.output == trials[0].output));
    }

    #[test]
    fn test_run_is_idempotent() {
        let strategy = Strategy::new("matrix", StrategyKind::Competitive, strategy::matrix_reduce);
        let params = SimulationParams::new(9, 100);
        let outputs = |harness: &mut TimingHarness| -> Vec<Vec<f64>> {
            harness
                .run(&strategy, &params, 3)
                .unwrap()
                .into_iter()
                .map(|trial| trial.output)
                .collect()
        };
        let mut harness = TimingHarness::new(7);
        let first = outputs(&mut harness);
        let second = outputs(&mut harness);
        assert_eq!(first, second);
        assert_eq!(first, outputs(&mut TimingHarness::new(7)));
        assert_ne!(first, outputs(&mut TimingHarness::new(8)));
    }

    #[test]
    fn test_strategy_errors_are_tagged() {
        let strategy = Strategy::new("broken", StrategyKind::Competitive, failing);
        let error = TimingHarness::new(1)
            .run(&strategy, &SimulationParams::new(9, 10), 3)
            .unwrap_err();
        assert_eq!(error.strategy_name(), Some("broken"));
        assert!(matches!(
            error,
            HarnessError::StrategyExecution {
                source: StrategyError::Failed(_),
                ..
            }
        ));
    }

    #[test]
    fn test_budget_applies_after_the_fact() {
        let slow = Strategy::new("slow", StrategyKind::Competitive, |_: &mut Simulation<'_>| {
            std::thread::sleep(Duration::from_millis(5));
            Ok(Vec::new())
        });
        let error = TimingHarness::new(1)
            .with_budget(Duration::from_millis(1))
            .run(&slow, &SimulationParams::new(1, 0), 1)
            .unwrap_err();
        assert!(matches!(
            error,
            HarnessError::StrategyExecution {
                source: StrategyError::BudgetExceeded { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_parameters() {
        let strategy = Strategy::new("replicate", StrategyKind::Competitive, strategy::batch_replicate);
        let mut harness = TimingHarness::new(1);
        assert!(matches!(
            harness.run(&strategy, &SimulationParams::new(0, 10), 1),
            Err(HarnessError::InvalidParameter {
                parameter: "sample_size",
                ..
            })
        ));
        assert!(matches!(
            harness.run(&strategy, &SimulationParams::new(9, 10), 0),
            Err(HarnessError::InvalidParameter {
                parameter: "repetitions",
                ..
            })
        ));
    }

    #[rstest]
    #[case::default(None, 4)]
    #[case::disabled(Some(0), 3)]
    #[case::several(Some(3), 6)]
    fn test_warmup_runs_are_not_timed(#[case] warmup: Option<usize>, #[case] expected_calls: usize) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let counting = Strategy::new("counting", StrategyKind::Competitive, move |simulation: &mut Simulation<'_>| {
            counter.set(counter.get() + 1);
            strategy::batch_replicate(simulation)
        });
        let mut harness = TimingHarness::new(123);
        if let Some(warmup) = warmup {
            harness = harness.with_warmup(warmup);
        }
        let trials = harness.run(&counting, &SimulationParams::new(9, 10), 3).unwrap();
        assert_eq!(trials.len(), 3);
        assert_eq!(calls.get(), expected_calls);
        assert!(trials.iter().all(|trial| trial.output == trials[0].output));
    }

    #[test]
    fn test_zero_replications() {
        let strategy = Strategy::new("typed", StrategyKind::Competitive, strategy::typed_map);
        let trials = TimingHarness::new(1)
            .run(&strategy, &SimulationParams::new(9, 0), 2)
            .unwrap();
        assert!(trials.iter().all(|trial| trial.output.is_empty()));
    }
}
