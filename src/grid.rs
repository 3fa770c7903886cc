//! Array primitives the simulation strategies are built from.

use serde::{Deserialize, Serialize};

use crate::error::StrategyError;
use crate::source::{Distribution, RandomSource};

/// How a batch of draws is laid out in a [`Grid`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// Column `j` holds draws `j*rows .. (j+1)*rows`, the same order a
    /// per-replication loop consumes them in.
    #[default]
    ColumnMajor,
    /// Draws fill row by row; column `j` gets every `cols`-th draw.
    RowMajor,
}

impl std::str::FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "column-major" | "column" | "col" => Ok(Layout::ColumnMajor),
            "row-major" | "row" => Ok(Layout::RowMajor),
            other => Err(format!("unknown layout '{other}', expected column-major or row-major")),
        }
    }
}

/// A `rows`-by-`cols` matrix of draws, one subsample per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    layout: Layout,
    values: Vec<f64>,
}

impl Grid {
    /// Draws all `rows * cols` values with a single batch call.
    pub fn draw(
        source: &mut RandomSource,
        distribution: Distribution,
        rows: usize,
        cols: usize,
        layout: Layout,
    ) -> Self {
        let values = source.sample(distribution, rows * cols);
        Self {
            rows,
            cols,
            layout,
            values,
        }
    }

    pub fn from_values(rows: usize, cols: usize, layout: Layout, values: Vec<f64>) -> Option<Self> {
        (values.len() == rows * cols).then_some(Self {
            rows,
            cols,
            layout,
            values,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        match self.layout {
            Layout::ColumnMajor => self.values[col * self.rows + row],
            Layout::RowMajor => self.values[row * self.cols + col],
        }
    }

    /// Specialised column reduction: the mean of every column.
    pub fn column_means(&self) -> Vec<f64> {
        if self.cols == 0 {
            return Vec::new();
        }
        if self.rows == 0 {
            return vec![f64::NAN; self.cols];
        }
        let rows = self.rows as f64;
        match self.layout {
            Layout::ColumnMajor => self
                .values
                .chunks_exact(self.rows)
                .map(|column| column.iter().sum::<f64>() / rows)
                .collect(),
            Layout::RowMajor => {
                let mut sums = vec![0.0; self.cols];
                for row in self.values.chunks_exact(self.cols) {
                    sums.iter_mut().zip(row).for_each(|(sum, value)| *sum += value);
                }
                sums.iter_mut().for_each(|sum| *sum /= rows);
                sums
            }
        }
    }

    /// Generic axis-apply: copies each column into its own vector and hands it
    /// to `reduce`.
    pub fn apply_columns(&self, reduce: &dyn Fn(&[f64]) -> f64) -> Vec<f64> {
        (0..self.cols)
            .map(|col| {
                let column: Vec<f64> = (0..self.rows).map(|row| self.get(row, col)).collect();
                reduce(&column)
            })
            .collect()
    }
}

/// Arithmetic mean; NaN for an empty slice.
#[inline]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Evaluates `expression` `count` times and collects the results.
pub fn replicate<F>(count: usize, mut expression: F) -> Vec<f64>
where
    F: FnMut() -> f64,
{
    (0..count).map(|_| expression()).collect()
}

/// Result of [`map_simplify`], shaped after what every call returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Simplified {
    /// Every call returned exactly one value.
    Vector(Vec<f64>),
    /// Every call returned the same number (other than one) of values; one column per call.
    Matrix(Grid),
    /// Calls disagreed on length.
    List(Vec<Vec<f64>>),
}

impl Simplified {
    pub fn into_vector(self) -> Option<Vec<f64>> {
        match self {
            Simplified::Vector(values) => Some(values),
            _ => None,
        }
    }
}

/// Calls `f` once per index and collects the results as-is.
pub fn map_list<F>(count: usize, f: F) -> Vec<Vec<f64>>
where
    F: FnMut(usize) -> Vec<f64>,
{
    (0..count).map(f).collect()
}

pub fn flatten(nested: Vec<Vec<f64>>) -> Vec<f64> {
    nested.into_iter().flatten().collect()
}

/// Calls `f` once per index, then simplifies the shape of the results.
/// Zero calls simplify to an empty vector.
pub fn map_simplify<F>(count: usize, f: F) -> Simplified
where
    F: FnMut(usize) -> Vec<f64>,
{
    let results = map_list(count, f);
    let width = match results.first() {
        None => return Simplified::Vector(Vec::new()),
        Some(first) => first.len(),
    };
    if results.iter().any(|result| result.len() != width) {
        return Simplified::List(results);
    }
    if width == 1 {
        return Simplified::Vector(flatten(results));
    }
    let cols = results.len();
    Simplified::Matrix(Grid {
        rows: width,
        cols,
        layout: Layout::ColumnMajor,
        values: flatten(results),
    })
}

/// Like [`map_simplify`] but the caller declares the width of every result up
/// front, so the output is allocated once and a deviating call is an error.
pub fn map_typed<F>(count: usize, width: usize, mut f: F) -> Result<Vec<f64>, StrategyError>
where
    F: FnMut(usize) -> Vec<f64>,
{
    let mut values = Vec::with_capacity(count * width);
    for index in 0..count {
        let result = f(index);
        if result.len() != width {
            return Err(StrategyError::ShapeMismatch {
                index,
                expected: width,
                actual: result.len(),
            });
        }
        values.extend_from_slice(&result);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use rstest::rstest;

    fn grid_1_to_6(layout: Layout) -> Grid {
        Grid::from_values(2, 3, layout, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
    }

    #[rstest]
    #[case::column_major(Layout::ColumnMajor, vec![1.5, 3.5, 5.5])]
    #[case::row_major(Layout::RowMajor, vec![2.5, 3.5, 4.5])]
    fn test_column_means(#[case] layout: Layout, #[case] expected: Vec<f64>) {
        let grid = grid_1_to_6(layout);
        assert_eq!(grid.column_means(), expected);
        assert_eq!(grid.apply_columns(&mean), expected);
    }

    #[test]
    fn test_get_respects_layout() {
        assert_eq!(grid_1_to_6(Layout::ColumnMajor).get(1, 0), 2.0);
        assert_eq!(grid_1_to_6(Layout::RowMajor).get(1, 0), 4.0);
    }

    #[test]
    fn test_from_values_rejects_wrong_length() {
        assert!(Grid::from_values(2, 2, Layout::ColumnMajor, vec![1.0; 3]).is_none());
    }

    #[test]
    fn test_zero_columns() {
        let mut source = RandomSource::from_seed(1);
        let grid = Grid::draw(&mut source, Distribution::Normal, 9, 0, Layout::ColumnMajor);
        assert!(grid.column_means().is_empty());
        assert!(grid.apply_columns(&mean).is_empty());
        assert_eq!(source.position(), 0);
    }

    #[test]
    fn test_apply_columns_with_other_reduction() {
        let grid = grid_1_to_6(Layout::ColumnMajor);
        let maxima = grid.apply_columns(&|column: &[f64]| column.iter().copied().fold(f64::MIN, f64::max));
        assert_eq!(maxima, vec![2.0, 4.0, 6.0]);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(17)]
    fn test_replicate_count(#[case] count: usize) {
        let mut calls = 0;
        let values = replicate(count, || {
            calls += 1;
            calls as f64
        });
        assert_eq!(values.len(), count);
        assert_eq!(calls, count);
    }

    #[test]
    fn test_mean() {
        assert_relative_eq!(mean(&[1.0, 2.0, 4.0]), 7.0 / 3.0);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn test_map_simplify_shapes() {
        assert_eq!(
            map_simplify(3, |i| vec![i as f64]),
            Simplified::Vector(vec![0.0, 1.0, 2.0])
        );
        assert_eq!(map_simplify(0, |i| vec![i as f64]), Simplified::Vector(vec![]));

        match map_simplify(3, |i| vec![i as f64, 10.0 * i as f64]) {
            Simplified::Matrix(grid) => {
                assert_eq!((grid.rows(), grid.cols()), (2, 3));
                assert_eq!(grid.get(1, 2), 20.0);
            }
            other => panic!("expected a matrix, got {other:?}"),
        }

        let ragged = map_simplify(2, |i| vec![0.0; i + 1]);
        assert!(matches!(ragged, Simplified::List(ref items) if items.len() == 2));
        assert_eq!(ragged.into_vector(), None);
    }

    #[test]
    fn test_map_list_and_flatten() {
        let nested = map_list(3, |i| vec![i as f64]);
        assert_eq!(nested.len(), 3);
        assert_eq!(flatten(nested), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_map_typed_rejects_wrong_width() {
        assert_eq!(map_typed(4, 1, |i| vec![i as f64]), Ok(vec![0.0, 1.0, 2.0, 3.0]));
        assert_eq!(
            map_typed(4, 1, |i| if i == 2 { vec![] } else { vec![0.0] }),
            Err(StrategyError::ShapeMismatch {
                index: 2,
                expected: 1,
                actual: 0
            })
        );
    }

    #[rstest]
    #[case("column-major", Layout::ColumnMajor)]
    #[case("ROW", Layout::RowMajor)]
    fn test_layout_from_str(#[case] input: &str, #[case] expected: Layout) {
        assert_eq!(input.parse::<Layout>(), Ok(expected));
    }
}
