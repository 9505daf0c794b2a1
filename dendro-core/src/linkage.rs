//! Linkage methods and their Lance-Williams distance updates.
//!
//! When clusters `a` and `b` merge, the distance from the merged cluster to
//! every other live cluster `i` is derived from `d(a, i)`, `d(b, i)`,
//! `d(a, b)` and the cluster sizes alone. Ward, centroid and median linkage
//! are only reducible to that form over squared distances, so the drivers
//! square the working matrix for those methods and take square roots of the
//! merge heights once clustering finishes.

use std::{fmt, str::FromStr, sync::Arc};

use crate::{error::ClusterError, matrix::WorkingMatrix};

/// Rule used to compute the distance between a merged cluster and the rest.
///
/// Names parse case-insensitively; `weighted` is accepted as an alias for
/// [`LinkageMethod::McQuitty`].
///
/// # Examples
/// ```
/// use dendro_core::LinkageMethod;
///
/// let method: LinkageMethod = "Ward".parse().expect("ward is a known method");
/// assert_eq!(method, LinkageMethod::Ward);
/// assert_eq!(method.to_string(), "ward");
/// assert!("bogus".parse::<LinkageMethod>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum LinkageMethod {
    /// Minimum distance between members.
    Single,
    /// Size-weighted mean distance between members (UPGMA).
    #[default]
    Average,
    /// Maximum distance between members.
    Complete,
    /// Unweighted mean of the two merged clusters' distances (WPGMA).
    McQuitty,
    /// Minimum increase in within-cluster variance.
    Ward,
    /// Distance between cluster centroids (UPGMC).
    Centroid,
    /// Distance between cluster medians (WPGMC).
    Median,
}

impl LinkageMethod {
    /// Every supported method in a stable order.
    pub const ALL: [Self; 7] = [
        Self::Single,
        Self::Average,
        Self::Complete,
        Self::McQuitty,
        Self::Ward,
        Self::Centroid,
        Self::Median,
    ];

    /// Returns the canonical lowercase name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Average => "average",
            Self::Complete => "complete",
            Self::McQuitty => "mcquitty",
            Self::Ward => "ward",
            Self::Centroid => "centroid",
            Self::Median => "median",
        }
    }

    /// Whether the nearest-neighbour chain algorithm yields the same
    /// hierarchy as greedy global-minimum merging for this method.
    ///
    /// Centroid and median linkage can produce inversions, where a merge
    /// happens below the height of an earlier one.
    #[must_use]
    pub const fn is_reducible(self) -> bool {
        !matches!(self, Self::Centroid | Self::Median)
    }

    /// Whether the Lance-Williams update operates on squared distances.
    #[must_use]
    pub const fn uses_squared_distances(self) -> bool {
        matches!(self, Self::Ward | Self::Centroid | Self::Median)
    }
}

impl fmt::Display for LinkageMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkageMethod {
    type Err = ClusterError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "average" => Ok(Self::Average),
            "complete" => Ok(Self::Complete),
            "mcquitty" | "weighted" => Ok(Self::McQuitty),
            "ward" => Ok(Self::Ward),
            "centroid" => Ok(Self::Centroid),
            "median" => Ok(Self::Median),
            _ => Err(ClusterError::UnknownMethod {
                name: Arc::from(raw),
            }),
        }
    }
}

/// Computes the distance row of the cluster formed by merging `a` and `b`.
///
/// The returned row has one entry per slot currently in `matrix`. Entries for
/// retired slots and for `a` and `b` themselves are `+∞`; the merged
/// cluster's own diagonal is appended by [`WorkingMatrix::push`].
pub(crate) fn merged_row(
    method: LinkageMethod,
    matrix: &WorkingMatrix,
    a: usize,
    b: usize,
    sizes: &[usize],
) -> Vec<f64> {
    let x = matrix.row(a);
    let y = matrix.row(b);
    let ab = matrix.distance(a, b);
    let na = size_of(sizes, a);
    let nb = size_of(sizes, b);

    (0..matrix.len())
        .map(|i| {
            if i == a || i == b || !matrix.is_live(i) {
                return f64::INFINITY;
            }
            let (xi, yi) = (x[i], y[i]);
            let ni = size_of(sizes, i);
            match method {
                LinkageMethod::Single => xi.min(yi),
                LinkageMethod::Average => (na * xi + nb * yi) / (na + nb),
                LinkageMethod::Complete => xi.max(yi),
                LinkageMethod::McQuitty => (xi + yi) / 2.0,
                LinkageMethod::Ward => {
                    ((na + ni) * xi + (nb + ni) * yi - ni * ab) / (na + nb + ni)
                }
                LinkageMethod::Centroid => {
                    let total = na + nb;
                    (na * xi + nb * yi) / total - na * nb * ab / (total * total)
                }
                LinkageMethod::Median => (2.0 * (xi + yi) - ab) / 4.0,
            }
        })
        .collect()
}

fn size_of(sizes: &[usize], index: usize) -> f64 {
    sizes.get(index).copied().unwrap_or(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn three_point_matrix(squared: bool) -> WorkingMatrix {
        let rows = vec![
            vec![0.0, 2.0, 6.0],
            vec![2.0, 0.0, 4.0],
            vec![6.0, 4.0, 0.0],
        ];
        WorkingMatrix::new(&rows, squared)
    }

    #[rstest]
    #[case::single(LinkageMethod::Single, 4.0)]
    #[case::average(LinkageMethod::Average, 5.0)]
    #[case::complete(LinkageMethod::Complete, 6.0)]
    #[case::mcquitty(LinkageMethod::McQuitty, 5.0)]
    fn merged_row_applies_unsquared_formulas(
        #[case] method: LinkageMethod,
        #[case] expected: f64,
    ) {
        let matrix = three_point_matrix(false);
        let row = merged_row(method, &matrix, 0, 1, &[1, 1, 1]);
        assert_eq!(row.len(), 3);
        assert!(row[0].is_infinite());
        assert!(row[1].is_infinite());
        assert!((row[2] - expected).abs() < 1e-12);
    }

    #[rstest]
    // ((1+1)*36 + (1+1)*16 - 1*4) / 3
    #[case::ward(LinkageMethod::Ward, 100.0 / 3.0)]
    // (36 + 16) / 2 - 4 / 4
    #[case::centroid(LinkageMethod::Centroid, 25.0)]
    // (2 * (36 + 16) - 4) / 4
    #[case::median(LinkageMethod::Median, 25.0)]
    fn merged_row_applies_squared_formulas(#[case] method: LinkageMethod, #[case] expected: f64) {
        let matrix = three_point_matrix(true);
        let row = merged_row(method, &matrix, 0, 1, &[1, 1, 1]);
        assert!((row[2] - expected).abs() < 1e-12);
    }

    #[test]
    fn average_weights_by_cluster_size() {
        let matrix = three_point_matrix(false);
        let row = merged_row(LinkageMethod::Average, &matrix, 0, 1, &[3, 1, 1]);
        assert!((row[2] - (3.0 * 6.0 + 4.0) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn retired_slots_stay_unreachable() {
        let mut matrix = three_point_matrix(false);
        matrix.retire(2);
        let row = merged_row(LinkageMethod::Complete, &matrix, 0, 1, &[1, 1, 1]);
        assert!(row.iter().all(|value| value.is_infinite()));
    }

    #[rstest]
    #[case("single", LinkageMethod::Single)]
    #[case("AVERAGE", LinkageMethod::Average)]
    #[case(" complete ", LinkageMethod::Complete)]
    #[case("McQuitty", LinkageMethod::McQuitty)]
    #[case("weighted", LinkageMethod::McQuitty)]
    #[case("ward", LinkageMethod::Ward)]
    #[case("centroid", LinkageMethod::Centroid)]
    #[case("median", LinkageMethod::Median)]
    fn parses_method_names(#[case] raw: &str, #[case] expected: LinkageMethod) {
        assert_eq!(raw.parse::<LinkageMethod>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_method_names() {
        let err = "bogus"
            .parse::<LinkageMethod>()
            .expect_err("bogus is not a linkage method");
        assert_eq!(err.code().as_str(), "DENDRO_UNKNOWN_METHOD");
        assert!(matches!(err, ClusterError::UnknownMethod { name } if &*name == "bogus"));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for method in LinkageMethod::ALL {
            assert_eq!(method.to_string().parse::<LinkageMethod>(), Ok(method));
        }
    }
}
