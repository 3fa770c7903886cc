use std::cmp::Ordering;
use std::fmt::Write as _;
use std::time::Duration;

use num_format::{Locale, ToFormattedString};
use serde::{Serialize, Serializer};
use statrs::statistics::{Data, Median, Min};

use crate::equivalence::{equivalent, Mismatch};
use crate::error::HarnessError;
use crate::timing::TrialResult;

/// Everything the timing harness produced for one strategy.
#[derive(Debug)]
pub struct StrategyOutcome {
    pub name: String,
    /// Registration index, used to break timing ties.
    pub order: usize,
    pub trials: Result<Vec<TrialResult>, HarnessError>,
}

impl StrategyOutcome {
    fn output(&self) -> Option<&[f64]> {
        match &self.trials {
            Ok(trials) => trials.first().map(|trial| trial.output.as_slice()),
            Err(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Equivalence {
    /// This row is the reference every other row was compared against.
    Reference,
    Pass,
    Fail { mismatch: Mismatch },
    /// The reference produced no output to compare against.
    Unverified,
}

impl Equivalence {
    pub fn passed(&self) -> bool {
        matches!(self, Equivalence::Reference | Equivalence::Pass)
    }

    fn label(&self) -> &'static str {
        match self {
            Equivalence::Reference => "reference",
            Equivalence::Pass => "pass",
            Equivalence::Fail { .. } => "FAIL",
            Equivalence::Unverified => "unverified",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowStatus {
    Completed {
        #[serde(rename = "min_ns", serialize_with = "as_nanos")]
        min: Duration,
        #[serde(rename = "median_ns", serialize_with = "as_nanos")]
        median: Duration,
        /// Minimum time divided by the fastest strategy's minimum time.
        relative: f64,
        equivalence: Equivalence,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub order: usize,
    #[serde(flatten)]
    pub status: RowStatus,
}

impl ReportRow {
    pub fn min(&self) -> Option<Duration> {
        match self.status {
            RowStatus::Completed { min, .. } => Some(min),
            RowStatus::Failed { .. } => None,
        }
    }

    pub fn equivalence(&self) -> Option<&Equivalence> {
        match &self.status {
            RowStatus::Completed { equivalence, .. } => Some(equivalence),
            RowStatus::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, RowStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub reference: String,
    pub tolerance: f64,
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// Completed rows come first, fastest minimum first with ties broken by
    /// registration order; failed rows follow in registration order.
    pub fn build(outcomes: &[StrategyOutcome], reference: &str, tolerance: f64) -> Self {
        let reference_output = outcomes
            .iter()
            .find(|outcome| outcome.name == reference)
            .and_then(StrategyOutcome::output);

        let mut rows: Vec<ReportRow> = outcomes
            .iter()
            .map(|outcome| ReportRow {
                name: outcome.name.clone(),
                order: outcome.order,
                status: summarize(outcome, reference, reference_output, tolerance),
            })
            .collect();

        let fastest = rows.iter().filter_map(ReportRow::min).min();
        for row in &mut rows {
            if let (RowStatus::Completed { min, relative, .. }, Some(fastest)) = (&mut row.status, fastest) {
                *relative = ratio(*min, fastest);
            }
        }

        rows.sort_by(|a, b| match (a.min(), b.min()) {
            (Some(left), Some(right)) => left.cmp(&right).then(a.order.cmp(&b.order)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.order.cmp(&b.order),
        });

        Self {
            reference: reference.to_string(),
            tolerance,
            rows,
        }
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn fastest(&self) -> Option<&ReportRow> {
        self.rows.first().filter(|row| !row.is_failed())
    }

    pub fn row(&self, name: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|row| row.name == name)
    }

    pub fn all_equivalent(&self) -> bool {
        self.rows
            .iter()
            .all(|row| row.equivalence().is_some_and(Equivalence::passed))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self) -> String {
        let header = ["strategy", "min (ns)", "median (ns)", "relative", "equivalent"];
        let lines: Vec<[String; 5]> = self
            .rows
            .iter()
            .map(|row| match &row.status {
                RowStatus::Completed {
                    min,
                    median,
                    relative,
                    equivalence,
                } => [
                    row.name.clone(),
                    nanos(*min),
                    nanos(*median),
                    format!("{relative:.2}x"),
                    equivalence.label().to_string(),
                ],
                RowStatus::Failed { error } => [
                    row.name.clone(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    format!("FAILED: {error}"),
                ],
            })
            .collect();

        let mut widths = header.map(str::len);
        for line in &lines {
            for (width, cell) in widths.iter_mut().zip(line) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let mut push_line = |cells: [&str; 5]| {
            let _ = writeln!(
                out,
                "{:<w0$}  {:>w1$}  {:>w2$}  {:>w3$}  {}",
                cells[0],
                cells[1],
                cells[2],
                cells[3],
                cells[4],
                w0 = widths[0],
                w1 = widths[1],
                w2 = widths[2],
                w3 = widths[3],
            );
        };
        push_line(header);
        for line in &lines {
            push_line(line.each_ref().map(String::as_str));
        }
        let _ = write!(out, "reference: {}, tolerance: {:e}", self.reference, self.tolerance);
        out
    }
}

fn summarize(
    outcome: &StrategyOutcome,
    reference: &str,
    reference_output: Option<&[f64]>,
    tolerance: f64,
) -> RowStatus {
    let trials = match &outcome.trials {
        Ok(trials) if !trials.is_empty() => trials,
        Ok(_) => {
            return RowStatus::Failed {
                error: "no repetitions recorded".to_string(),
            }
        }
        Err(error) => {
            return RowStatus::Failed {
                error: error.to_string(),
            }
        }
    };

    let timings = Data::new(
        trials
            .iter()
            .map(|trial| trial.elapsed.as_nanos() as f64)
            .collect::<Vec<_>>(),
    );

    let equivalence = if outcome.name == reference {
        Equivalence::Reference
    } else {
        match reference_output {
            None => Equivalence::Unverified,
            Some(expected) => match equivalent(&trials[0].output, expected, tolerance) {
                Ok(()) => Equivalence::Pass,
                Err(mismatch) => Equivalence::Fail { mismatch },
            },
        }
    };

    RowStatus::Completed {
        min: Duration::from_nanos(timings.min() as u64),
        median: Duration::from_nanos(timings.median().round() as u64),
        relative: 1.0,
        equivalence,
    }
}

fn ratio(value: Duration, fastest: Duration) -> f64 {
    if fastest.is_zero() {
        return if value.is_zero() { 1.0 } else { f64::INFINITY };
    }
    value.as_secs_f64() / fastest.as_secs_f64()
}

fn nanos(duration: Duration) -> String {
    (duration.as_nanos() as u64).to_formatted_string(&Locale::en)
}

fn as_nanos<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_nanos() as u64)
}
