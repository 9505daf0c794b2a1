//! Pairwise distances between feature vectors.
//!
//! [`DistanceMetric`] names the supported metrics and computes them for a
//! single pair of vectors; [`distance_matrix`] applies a metric to every pair
//! of rows (or columns) of a data matrix to produce the symmetric input that
//! clustering expects.

mod helpers;
mod metrics;
mod types;

use std::{fmt, str::FromStr, sync::Arc};

use tracing::instrument;

use crate::matrix::transpose;

use self::helpers::validated_pair;
pub use self::types::{DistanceError, Result, VectorKind};

/// Metric used to compare two feature vectors.
///
/// # Examples
/// ```
/// use dendro_core::DistanceMetric;
///
/// let metric: DistanceMetric = "manhattan".parse()?;
/// assert_eq!(metric.distance(&[1.0, 3.0], &[4.0, 1.0])?, 5.0);
/// assert_eq!(DistanceMetric::default(), DistanceMetric::Euclidean);
/// # Ok::<(), dendro_core::DistanceError>(())
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum DistanceMetric {
    /// Share of occupied positions where exactly one vector is non-zero.
    Binary,
    /// Sum of absolute differences scaled by absolute sums.
    Canberra,
    /// One minus the ratio of summed minima to summed maxima.
    Jaccard,
    /// Sum of absolute differences.
    Manhattan,
    /// Largest absolute difference.
    Maximum,
    /// Square root of the summed squared differences.
    #[default]
    Euclidean,
}

impl DistanceMetric {
    /// Every supported metric in a stable order.
    pub const ALL: [Self; 6] = [
        Self::Binary,
        Self::Canberra,
        Self::Jaccard,
        Self::Manhattan,
        Self::Maximum,
        Self::Euclidean,
    ];

    /// Returns the canonical lowercase name of the metric.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Canberra => "canberra",
            Self::Jaccard => "jaccard",
            Self::Manhattan => "manhattan",
            Self::Maximum => "maximum",
            Self::Euclidean => "euclidean",
        }
    }

    /// Computes the distance between `left` and `right`.
    ///
    /// # Errors
    ///
    /// - [`DistanceError::ZeroLength`] when any input is empty.
    /// - [`DistanceError::DimensionMismatch`] when input lengths differ.
    /// - [`DistanceError::NonFinite`] when a value is NaN or infinite.
    pub fn distance(self, left: &[f64], right: &[f64]) -> Result<f64> {
        let (left, right) = validated_pair(left, right)?;
        let value = match self {
            Self::Binary => metrics::binary(&left, &right),
            Self::Canberra => metrics::canberra(&left, &right),
            Self::Jaccard => metrics::jaccard(&left, &right),
            Self::Manhattan => metrics::manhattan(&left, &right),
            Self::Maximum => metrics::maximum(&left, &right),
            Self::Euclidean => metrics::euclidean(&left, &right),
        };
        Ok(value)
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a metric name case-insensitively. An empty name selects the
/// default, [`DistanceMetric::Euclidean`].
impl FromStr for DistanceMetric {
    type Err = DistanceError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "binary" => Ok(Self::Binary),
            "canberra" => Ok(Self::Canberra),
            "jaccard" => Ok(Self::Jaccard),
            "manhattan" => Ok(Self::Manhattan),
            "maximum" => Ok(Self::Maximum),
            "euclidean" | "" => Ok(Self::Euclidean),
            _ => Err(DistanceError::UnknownMetric {
                name: Arc::from(raw),
            }),
        }
    }
}

/// Computes the symmetric distance matrix between the rows of `data`, or
/// between its columns when `transpose` is set.
///
/// The diagonal is zero and every off-diagonal pair is computed once.
///
/// # Errors
/// Propagates the [`DistanceMetric::distance`] error for the first pair that
/// fails, which includes rows of differing length.
///
/// # Examples
/// ```
/// use dendro_core::{DistanceMetric, distance_matrix};
///
/// let data = vec![vec![0.0, 0.0], vec![3.0, 4.0]];
/// let matrix = distance_matrix(&data, DistanceMetric::Euclidean, false)?;
/// assert_eq!(matrix, vec![vec![0.0, 5.0], vec![5.0, 0.0]]);
///
/// let columns = distance_matrix(&data, DistanceMetric::Maximum, true)?;
/// assert_eq!(columns, vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
/// # Ok::<(), dendro_core::DistanceError>(())
/// ```
#[instrument(
    name = "core.distance_matrix",
    err,
    skip(data),
    fields(rows = data.len(), metric = %metric),
)]
pub fn distance_matrix(
    data: &[Vec<f64>],
    metric: DistanceMetric,
    transpose: bool,
) -> Result<Vec<Vec<f64>>> {
    let transposed;
    let vectors = if transpose {
        transposed = self::transpose(data);
        transposed.as_slice()
    } else {
        data
    };

    let size = vectors.len();
    let mut matrix = vec![vec![0.0; size]; size];
    for i in 0..size {
        for j in (i + 1)..size {
            let value = metric.distance(&vectors[i], &vectors[j])?;
            matrix[i][j] = value;
            matrix[j][i] = value;
        }
    }
    Ok(matrix)
}
