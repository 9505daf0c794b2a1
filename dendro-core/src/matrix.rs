//! Distance-matrix validation, the mutable working matrix used while merging,
//! and display helpers for reordering matrices.

use std::{collections::HashMap, fmt, sync::Arc};

use thiserror::Error;

use crate::{Result, error::ClusterError};

/// Checks that `matrix` is a non-empty, square, symmetric matrix of finite,
/// non-negative distances and returns its dimension.
///
/// Diagonal entries are checked for validity but otherwise ignored.
pub(crate) fn validate_distance_matrix(matrix: &[Vec<f64>]) -> Result<usize> {
    let rows = matrix.len();
    if rows == 0 {
        return Err(ClusterError::EmptyMatrix);
    }
    if let Some((row, values)) = matrix
        .iter()
        .enumerate()
        .find(|(_, values)| values.len() != rows)
    {
        return Err(ClusterError::NonSquareMatrix {
            rows,
            row,
            columns: values.len(),
        });
    }
    for (row, values) in matrix.iter().enumerate() {
        for (col, &value) in values.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ClusterError::InvalidDistance { row, col, value });
            }
        }
    }
    for (row, values) in matrix.iter().enumerate() {
        for (col, &value) in values.iter().enumerate().skip(row + 1) {
            if matrix[col][row] != value {
                return Err(ClusterError::AsymmetricMatrix { row, col });
            }
        }
    }
    Ok(rows)
}

/// Square distance matrix that grows by one slot per merge.
///
/// Slots are never removed. Retiring a slot clears its live flag and
/// overwrites its row and column with `+∞`, so indices stay stable for the
/// whole run and live clusters can never select a retired one as nearest.
#[derive(Clone, Debug)]
pub(crate) struct WorkingMatrix {
    rows: Vec<Vec<f64>>,
    live: Vec<bool>,
    live_count: usize,
}

impl WorkingMatrix {
    /// Copies a validated matrix, squaring every entry when `squared` is set.
    ///
    /// Capacity is reserved for the `n - 1` slots that merging will append.
    pub(crate) fn new(matrix: &[Vec<f64>], squared: bool) -> Self {
        let n = matrix.len();
        let capacity = (2 * n).saturating_sub(1);
        let mut rows = Vec::with_capacity(capacity);
        rows.extend(matrix.iter().map(|values| {
            let mut row = Vec::with_capacity(capacity);
            row.extend(
                values
                    .iter()
                    .map(|&value| if squared { value * value } else { value }),
            );
            row
        }));
        Self {
            rows,
            live: vec![true; n],
            live_count: n,
        }
    }

    /// Number of slots, live or retired.
    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn live_count(&self) -> usize {
        self.live_count
    }

    pub(crate) fn is_live(&self, index: usize) -> bool {
        self.live.get(index).copied().unwrap_or(false)
    }

    pub(crate) fn first_live(&self) -> Option<usize> {
        self.live.iter().position(|&live| live)
    }

    pub(crate) fn row(&self, index: usize) -> &[f64] {
        &self.rows[index]
    }

    pub(crate) fn distance(&self, left: usize, right: usize) -> f64 {
        self.rows[left][right]
    }

    /// Appends a slot whose distances to existing slots are `row` and returns
    /// its index. The new slot's diagonal is zero.
    pub(crate) fn push(&mut self, mut row: Vec<f64>) -> usize {
        let index = self.rows.len();
        for (existing, &value) in self.rows.iter_mut().zip(&row) {
            existing.push(value);
        }
        row.push(0.0);
        self.rows.push(row);
        self.live.push(true);
        self.live_count += 1;
        index
    }

    /// Marks `index` as merged away.
    pub(crate) fn retire(&mut self, index: usize) {
        if !self.is_live(index) {
            return;
        }
        self.live[index] = false;
        self.live_count -= 1;
        for row in &mut self.rows {
            row[index] = f64::INFINITY;
        }
        self.rows[index].fill(f64::INFINITY);
    }

    /// Finds the live cluster closest to `anchor`, excluding `anchor` itself.
    ///
    /// On an exact tie with the minimum, `preference` wins when it is live;
    /// otherwise the lowest index wins.
    pub(crate) fn nearest(&self, anchor: usize, preference: Option<usize>) -> Option<(usize, f64)> {
        let best = self.scan(anchor, 0)?;
        match preference {
            Some(preferred)
                if preferred != anchor
                    && self.is_live(preferred)
                    && self.distance(anchor, preferred) == best.1 =>
            {
                Some((preferred, best.1))
            }
            _ => Some(best),
        }
    }

    /// Finds the closest live cluster with an index above `anchor`, lowest
    /// index first on ties.
    pub(crate) fn nearest_above(&self, anchor: usize) -> Option<(usize, f64)> {
        self.scan(anchor, anchor + 1)
    }

    fn scan(&self, anchor: usize, start: usize) -> Option<(usize, f64)> {
        let row = self.rows.get(anchor)?;
        row.iter()
            .enumerate()
            .skip(start)
            .filter(|&(index, _)| index != anchor && self.live[index])
            .fold(None, |best: Option<(usize, f64)>, (index, &value)| match best {
                Some((_, current)) if current <= value => best,
                _ => Some((index, value)),
            })
    }
}

/// Returns the transpose of a rectangular matrix.
///
/// # Examples
/// ```
/// use dendro_core::transpose;
///
/// let matrix = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
/// assert_eq!(
///     transpose(&matrix),
///     vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]],
/// );
/// ```
#[must_use]
pub fn transpose(matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let columns = matrix.iter().map(Vec::len).max().unwrap_or(0);
    (0..columns)
        .map(|col| {
            matrix
                .iter()
                .map(|row| row.get(col).copied().unwrap_or(0.0))
                .collect()
        })
        .collect()
}

/// Selects which dimension [`sort_by_names`] reorders.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Axis {
    /// Reorder whole rows.
    Row,
    /// Reorder the entries within every row.
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row => f.write_str("row"),
            Self::Column => f.write_str("column"),
        }
    }
}

/// Errors returned by [`sort_by_names`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SortError {
    /// The current and target name lists have different lengths.
    #[error("{names} names cannot be sorted into an order of {order} names")]
    OrderLengthMismatch {
        /// Number of current names.
        names: usize,
        /// Number of names in the target order.
        order: usize,
    },
    /// The name list does not match the dimension being sorted.
    #[error("{names} names were given but the matrix has {len} entries along the {axis} axis")]
    AxisLengthMismatch {
        /// Axis being sorted.
        axis: Axis,
        /// Number of names supplied.
        names: usize,
        /// Number of entries along the axis.
        len: usize,
    },
    /// A row did not have as many entries as the first row.
    #[error("row {row} has {len} entries but {expected} were expected")]
    RaggedMatrix {
        /// Index of the offending row.
        row: usize,
        /// Entries in the offending row.
        len: usize,
        /// Entries in the first row.
        expected: usize,
    },
    /// A name was missing from the target order.
    #[error("name `{name}` is missing from the target order")]
    UnknownName {
        /// The name that could not be placed.
        name: Arc<str>,
    },
    /// Two names resolved to the same target position.
    #[error("name `{name}` appears more than once")]
    DuplicateName {
        /// The repeated name.
        name: Arc<str>,
    },
}

impl SortError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> SortErrorCode {
        match self {
            Self::OrderLengthMismatch { .. } => SortErrorCode::OrderLengthMismatch,
            Self::AxisLengthMismatch { .. } => SortErrorCode::AxisLengthMismatch,
            Self::RaggedMatrix { .. } => SortErrorCode::RaggedMatrix,
            Self::UnknownName { .. } => SortErrorCode::UnknownName,
            Self::DuplicateName { .. } => SortErrorCode::DuplicateName,
        }
    }
}

/// Machine-readable error codes for [`SortError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SortErrorCode {
    /// The current and target name lists have different lengths.
    OrderLengthMismatch,
    /// The name list does not match the dimension being sorted.
    AxisLengthMismatch,
    /// A row did not have as many entries as the first row.
    RaggedMatrix,
    /// A name was missing from the target order.
    UnknownName,
    /// Two names resolved to the same target position.
    DuplicateName,
}

/// Reorders the rows or columns of `matrix` so that the entry labelled
/// `names[i]` moves to the position of that name in `order`.
///
/// Typically `names` labels the matrix as read and `order` is the leaf order
/// of a clustering.
///
/// # Errors
/// Returns [`SortError`] when the name lists disagree in length, when they do
/// not match the sorted axis, when the matrix is ragged, or when the names are
/// not a permutation of `order`.
///
/// # Examples
/// ```
/// use dendro_core::{Axis, sort_by_names};
///
/// let matrix = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
/// let names = ["a", "b"];
/// let sorted = sort_by_names(&matrix, &names, &["b", "a"], Axis::Row)?;
/// assert_eq!(sorted, vec![vec![3.0, 4.0], vec![1.0, 2.0]]);
/// # Ok::<(), dendro_core::SortError>(())
/// ```
pub fn sort_by_names<N, O>(
    matrix: &[Vec<f64>],
    names: &[N],
    order: &[O],
    axis: Axis,
) -> core::result::Result<Vec<Vec<f64>>, SortError>
where
    N: AsRef<str>,
    O: AsRef<str>,
{
    if names.len() != order.len() {
        return Err(SortError::OrderLengthMismatch {
            names: names.len(),
            order: order.len(),
        });
    }
    let columns = matrix.first().map_or(0, Vec::len);
    if let Some((row, values)) = matrix
        .iter()
        .enumerate()
        .find(|(_, values)| values.len() != columns)
    {
        return Err(SortError::RaggedMatrix {
            row,
            len: values.len(),
            expected: columns,
        });
    }
    let len = match axis {
        Axis::Row => matrix.len(),
        Axis::Column => columns,
    };
    if names.len() != len {
        return Err(SortError::AxisLengthMismatch {
            axis,
            names: names.len(),
            len,
        });
    }

    let targets = target_positions(names, order)?;
    let sorted = match axis {
        Axis::Row => {
            let mut sorted = vec![Vec::new(); matrix.len()];
            for (values, &target) in matrix.iter().zip(&targets) {
                sorted[target] = values.clone();
            }
            sorted
        }
        Axis::Column => matrix
            .iter()
            .map(|values| {
                let mut row = vec![0.0; columns];
                for (&value, &target) in values.iter().zip(&targets) {
                    row[target] = value;
                }
                row
            })
            .collect(),
    };
    Ok(sorted)
}

fn target_positions<N, O>(names: &[N], order: &[O]) -> core::result::Result<Vec<usize>, SortError>
where
    N: AsRef<str>,
    O: AsRef<str>,
{
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(order.len());
    for (index, name) in order.iter().enumerate() {
        positions.entry(name.as_ref()).or_insert(index);
    }
    let mut taken = vec![false; order.len()];
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            let target = *positions.get(name).ok_or_else(|| SortError::UnknownName {
                name: Arc::from(name),
            })?;
            if std::mem::replace(&mut taken[target], true) {
                return Err(SortError::DuplicateName {
                    name: Arc::from(name),
                });
            }
            Ok(target)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn square() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 1.0, 4.0],
            vec![1.0, 0.0, 2.0],
            vec![4.0, 2.0, 0.0],
        ]
    }

    #[test]
    fn validate_accepts_symmetric_matrix() {
        assert_eq!(validate_distance_matrix(&square()), Ok(3));
    }

    #[test]
    fn validate_rejects_empty_matrix() {
        assert_eq!(validate_distance_matrix(&[]), Err(ClusterError::EmptyMatrix));
    }

    #[test]
    fn validate_rejects_extra_row() {
        let mut matrix = vec![vec![0.0; 4]; 4];
        matrix.push(vec![0.0; 4]);
        let err = validate_distance_matrix(&matrix).expect_err("5x4 matrix is not square");
        assert_eq!(
            err,
            ClusterError::NonSquareMatrix {
                rows: 5,
                row: 0,
                columns: 4
            }
        );
    }

    #[rstest]
    #[case::negative(-1.0)]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    fn validate_rejects_invalid_entries(#[case] value: f64) {
        let mut matrix = square();
        matrix[2][1] = value;
        let err = validate_distance_matrix(&matrix).expect_err("entry must be rejected");
        assert!(matches!(
            err,
            ClusterError::InvalidDistance { row: 2, col: 1, .. }
        ));
    }

    #[test]
    fn validate_rejects_asymmetry() {
        let mut matrix = square();
        matrix[0][2] = 5.0;
        let err = validate_distance_matrix(&matrix).expect_err("matrix is asymmetric");
        assert_eq!(err, ClusterError::AsymmetricMatrix { row: 0, col: 2 });
    }

    #[test]
    fn push_extends_every_row_and_retire_tombstones() {
        let mut matrix = WorkingMatrix::new(&square(), false);
        let index = matrix.push(vec![f64::INFINITY, f64::INFINITY, 3.0]);
        assert_eq!(index, 3);
        assert_eq!(matrix.len(), 4);
        assert_eq!(matrix.live_count(), 4);
        assert_eq!(matrix.distance(2, 3), 3.0);
        assert_eq!(matrix.distance(3, 3), 0.0);

        matrix.retire(0);
        matrix.retire(0);
        assert_eq!(matrix.live_count(), 3);
        assert!(!matrix.is_live(0));
        assert!(matrix.distance(1, 0).is_infinite());
        assert!(matrix.row(0).iter().all(|value| value.is_infinite()));
        assert_eq!(matrix.first_live(), Some(1));
    }

    #[test]
    fn squared_matrix_squares_entries() {
        let matrix = WorkingMatrix::new(&square(), true);
        assert_eq!(matrix.distance(0, 2), 16.0);
    }

    #[test]
    fn nearest_prefers_lowest_index_then_preference() {
        let rows = vec![
            vec![0.0, 2.0, 2.0, 5.0],
            vec![2.0, 0.0, 1.0, 1.0],
            vec![2.0, 1.0, 0.0, 1.0],
            vec![5.0, 1.0, 1.0, 0.0],
        ];
        let matrix = WorkingMatrix::new(&rows, false);
        assert_eq!(matrix.nearest(0, None), Some((1, 2.0)));
        assert_eq!(matrix.nearest(0, Some(2)), Some((2, 2.0)));
        assert_eq!(matrix.nearest(0, Some(3)), Some((1, 2.0)));
        assert_eq!(matrix.nearest(3, None), Some((1, 1.0)));
        assert_eq!(matrix.nearest_above(1), Some((2, 1.0)));
        assert_eq!(matrix.nearest_above(3), None);
    }

    #[test]
    fn transpose_swaps_axes() {
        let matrix = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        assert_eq!(
            transpose(&matrix),
            vec![vec![1.0, 3.0, 5.0], vec![2.0, 4.0, 6.0]]
        );
        assert!(transpose(&[]).is_empty());
    }

    #[rstest]
    #[case::rows(
        Axis::Row,
        vec![vec![7.0, 8.0, 9.0], vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]
    )]
    #[case::columns(
        Axis::Column,
        vec![vec![3.0, 1.0, 2.0], vec![6.0, 4.0, 5.0], vec![9.0, 7.0, 8.0]]
    )]
    fn sort_by_names_reorders_axis(#[case] axis: Axis, #[case] expected: Vec<Vec<f64>>) {
        let matrix = vec![
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ];
        let sorted = sort_by_names(&matrix, &["a", "b", "c"], &["c", "a", "b"], axis)
            .expect("names are a permutation of the order");
        assert_eq!(sorted, expected);
    }

    #[test]
    fn sort_by_names_rejects_order_length_mismatch() {
        let matrix = vec![vec![1.0, 2.0]];
        let err = sort_by_names(&matrix, &["a", "b"], &["a"], Axis::Column)
            .expect_err("order is too short");
        assert_eq!(err.code(), SortErrorCode::OrderLengthMismatch);
    }

    #[test]
    fn sort_by_names_rejects_axis_length_mismatch() {
        let matrix = vec![vec![1.0, 2.0]];
        let err = sort_by_names(&matrix, &["a", "b"], &["b", "a"], Axis::Row)
            .expect_err("one row cannot take two names");
        assert_eq!(
            err,
            SortError::AxisLengthMismatch {
                axis: Axis::Row,
                names: 2,
                len: 1
            }
        );
    }

    #[test]
    fn sort_by_names_rejects_missing_and_duplicate_names() {
        let matrix = vec![vec![1.0, 2.0]];
        let missing = sort_by_names(&matrix, &["a", "z"], &["b", "a"], Axis::Column)
            .expect_err("z is not in the order");
        assert_eq!(missing.code(), SortErrorCode::UnknownName);

        let duplicate = sort_by_names(&matrix, &["a", "a"], &["a", "b"], Axis::Column)
            .expect_err("a appears twice");
        assert_eq!(duplicate.code(), SortErrorCode::DuplicateName);
    }
}
