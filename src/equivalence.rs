use std::fmt;

use approx::relative_eq;
use serde::Serialize;
use tracing::warn;

/// The first point at which two sequences disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    Length { left: usize, right: usize },
    Value {
        index: usize,
        left: f64,
        right: f64,
        difference: f64,
    },
}

impl Mismatch {
    /// Size of the disagreement: the length gap or the absolute difference.
    pub fn magnitude(&self) -> f64 {
        match self {
            Mismatch::Length { left, right } => left.abs_diff(*right) as f64,
            Mismatch::Value { difference, .. } => *difference,
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Length { left, right } => {
                write!(f, "lengths differ: {left} vs {right}")
            }
            Mismatch::Value {
                index,
                left,
                right,
                difference,
            } => write!(
                f,
                "element {index} differs: {left} vs {right} (|diff| = {difference:e})"
            ),
        }
    }
}

/// Checks that `left` and `right` have the same length and every pair of
/// elements is within `tolerance`, either absolutely or relative to the
/// larger magnitude. NaN never compares equal.
pub fn equivalent(left: &[f64], right: &[f64], tolerance: f64) -> Result<(), Mismatch> {
    let outcome = first_mismatch(left, right, tolerance);
    if let Err(mismatch) = &outcome {
        warn!(%mismatch, tolerance, "outputs are not equivalent");
    }
    outcome
}

fn first_mismatch(left: &[f64], right: &[f64], tolerance: f64) -> Result<(), Mismatch> {
    if left.len() != right.len() {
        return Err(Mismatch::Length {
            left: left.len(),
            right: right.len(),
        });
    }
    match left
        .iter()
        .zip(right)
        .position(|(l, r)| !relative_eq!(*l, *r, epsilon = tolerance, max_relative = tolerance))
    {
        None => Ok(()),
        Some(index) => Err(Mismatch::Value {
            index,
            left: left[index],
            right: right[index],
            difference: (left[index] - right[index]).abs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::identical(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], 0.0)]
    #[case::empty(&[], &[], 0.0)]
    #[case::absolute(&[0.0, 1e-12], &[1e-12, 0.0], 1e-9)]
    #[case::relative(&[1e6], &[1e6 + 1e-4], 1e-9)]
    fn test_equivalent(#[case] left: &[f64], #[case] right: &[f64], #[case] tolerance: f64) {
        assert_eq!(equivalent(left, right, tolerance), Ok(()));
    }

    #[test]
    fn test_length_mismatch() {
        let mismatch = equivalent(&[1.0, 2.0], &[1.0], 1e-9).unwrap_err();
        assert_eq!(mismatch, Mismatch::Length { left: 2, right: 1 });
        assert_eq!(mismatch.magnitude(), 1.0);
        assert_eq!(mismatch.to_string(), "lengths differ: 2 vs 1");
    }

    #[test]
    fn test_reports_first_differing_index() {
        let mismatch = equivalent(&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.5, 3.0, 5.0], 1e-9).unwrap_err();
        match mismatch {
            Mismatch::Value {
                index,
                left,
                right,
                difference,
            } => {
                assert_eq!(index, 1);
                assert_eq!((left, right), (2.0, 2.5));
                assert_eq!(difference, 0.5);
            }
            other => panic!("expected a value mismatch, got {other:?}"),
        }
        assert!(mismatch_text(&[1.0], &[2.0]).starts_with("element 0 differs: 1 vs 2"));
    }

    #[test]
    fn test_nan_is_never_equivalent() {
        assert!(equivalent(&[f64::NAN], &[f64::NAN], 1.0).is_err());
    }

    #[test]
    fn test_zero_tolerance_is_exact() {
        assert!(equivalent(&[0.1 + 0.2], &[0.3], 0.0).is_err());
        assert!(equivalent(&[0.1 + 0.2], &[0.3], 1e-12).is_ok());
    }

    fn mismatch_text(left: &[f64], right: &[f64]) -> String {
        equivalent(left, right, 0.0).unwrap_err().to_string()
    }
}
