//! Agglomerative clustering of a distance matrix into a [`Dendrogram`].
//!
//! Three drivers share one pipeline:
//!
//! - single linkage absorbs items one at a time into a growing fragment,
//! - reducible linkages (average, complete, mcquitty, Ward) follow
//!   nearest-neighbour chains until a reciprocal pair is found,
//! - centroid and median linkage pop candidate pairs from a lazily
//!   revalidated priority queue, since their merge heights can invert.
//!
//! Each driver emits raw merges between clusters. The merges are rewritten in
//! terms of a representative leaf per cluster, sorted by height and handed to
//! a union-find labeller that assigns node ids `n..2n-1` and derives branch
//! lengths.

mod generic;
mod nn_chain;
mod single;
mod union_find;

use tracing::{debug, instrument, warn};

use crate::{
    Result,
    dendrogram::Dendrogram,
    error::ClusterError,
    linkage::{LinkageMethod, merged_row},
    matrix::{WorkingMatrix, validate_distance_matrix},
};

/// Clusters `matrix` with the linkage method named `method`.
///
/// # Errors
/// Returns [`ClusterError::UnknownMethod`] when `method` is not a recognised
/// linkage name, and the validation errors of [`cluster_with`] otherwise.
///
/// # Examples
/// ```
/// use dendro_core::cluster;
///
/// let matrix = vec![
///     vec![0.0, 1.0, 5.0],
///     vec![1.0, 0.0, 4.0],
///     vec![5.0, 4.0, 0.0],
/// ];
/// let dendrogram = cluster(&matrix, &["a", "b", "c"], "complete")?;
/// assert_eq!(dendrogram.clusters().len(), 2);
/// assert!(cluster(&matrix, &["a", "b", "c"], "bogus").is_err());
/// # Ok::<(), dendro_core::ClusterError>(())
/// ```
pub fn cluster<S: AsRef<str>>(matrix: &[Vec<f64>], names: &[S], method: &str) -> Result<Dendrogram> {
    let method = method.parse::<LinkageMethod>().inspect_err(|err| {
        warn!(error = %err, "linkage method rejected");
    })?;
    cluster_with(matrix, names, method)
}

/// Clusters `matrix` with `method`, producing `n - 1` labelled merges.
///
/// `names` labels the rows of `matrix`; it is only checked for length here and
/// is consumed by [`Dendrogram::newick`] afterwards.
///
/// # Errors
/// Returns [`ClusterError::EmptyMatrix`], [`ClusterError::NonSquareMatrix`],
/// [`ClusterError::InvalidDistance`] or [`ClusterError::AsymmetricMatrix`]
/// when the matrix is not a valid distance matrix, and
/// [`ClusterError::NameLengthMismatch`] when `names` does not hold one name
/// per row.
///
/// # Examples
/// ```
/// use dendro_core::{LinkageMethod, cluster_with};
///
/// let matrix = vec![vec![0.0, 2.0], vec![2.0, 0.0]];
/// let dendrogram = cluster_with(&matrix, &["a", "b"], LinkageMethod::Single)?;
/// let merge = dendrogram.clusters()[0];
/// assert_eq!((merge.leaf_a, merge.leaf_b, merge.node), (0, 1, 2));
/// assert_eq!((merge.length_a, merge.length_b), (1.0, 1.0));
/// # Ok::<(), dendro_core::ClusterError>(())
/// ```
#[instrument(
    name = "core.cluster",
    err,
    skip(matrix, names),
    fields(items = matrix.len(), method = %method),
)]
pub fn cluster_with<S: AsRef<str>>(
    matrix: &[Vec<f64>],
    names: &[S],
    method: LinkageMethod,
) -> Result<Dendrogram> {
    let n = validate_distance_matrix(matrix).inspect_err(|err| {
        warn!(code = %err.code(), "distance matrix rejected");
    })?;
    if names.len() != n {
        warn!(names = names.len(), items = n, "name count does not match matrix");
        return Err(ClusterError::NameLengthMismatch {
            names: names.len(),
            items: n,
        });
    }

    let merges = match method {
        LinkageMethod::Single => single::cluster(matrix),
        LinkageMethod::Centroid | LinkageMethod::Median => generic::cluster(matrix, method),
        LinkageMethod::Average
        | LinkageMethod::Complete
        | LinkageMethod::McQuitty
        | LinkageMethod::Ward => nn_chain::cluster(matrix, method),
    };
    debug!(merges = merges.len(), "merging completed");

    Ok(Dendrogram::from_labelled(n, union_find::label(n, &merges)))
}

/// A merge between two clusters, named by one leaf from each.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RawMerge {
    pub(crate) leaf_a: usize,
    pub(crate) leaf_b: usize,
    pub(crate) distance: f64,
    /// Sort key: the largest merge height on the path down to any leaf, so
    /// a parent never sorts ahead of a child after an inversion.
    pub(crate) key: f64,
}

/// Collects raw merges in creation order and tracks, per cluster slot, a
/// representative leaf and the sort key of the merge that created it.
#[derive(Debug)]
pub(super) struct MergeLog {
    leaf_count: usize,
    representative: Vec<usize>,
    key: Vec<f64>,
    merges: Vec<RawMerge>,
}

impl MergeLog {
    pub(super) fn new(leaf_count: usize) -> Self {
        let slots = (2 * leaf_count).saturating_sub(1);
        Self {
            leaf_count,
            representative: (0..slots).collect(),
            key: vec![f64::NEG_INFINITY; slots],
            merges: Vec::with_capacity(leaf_count.saturating_sub(1)),
        }
    }

    /// Records the merge of slots `a` and `b` and returns the new slot.
    pub(super) fn record(&mut self, a: usize, b: usize, distance: f64) -> usize {
        let slot = self.leaf_count + self.merges.len();
        let key = distance.max(self.key[a]).max(self.key[b]);
        let merge = RawMerge {
            leaf_a: self.representative[a],
            leaf_b: self.representative[b],
            distance,
            key,
        };
        self.representative[slot] = merge.leaf_a;
        self.key[slot] = key;
        self.merges.push(merge);
        slot
    }

    /// Returns the merges in ascending key order, keeping creation order on
    /// ties. Squared heights are converted back to distances first, with
    /// negative rounding noise clamped to zero.
    pub(super) fn into_sorted(self, squared: bool) -> Vec<RawMerge> {
        let mut merges = self.merges;
        if squared {
            for merge in &mut merges {
                merge.distance = merge.distance.max(0.0).sqrt();
                merge.key = merge.key.max(0.0).sqrt();
            }
        }
        merges.sort_by(|left, right| left.key.total_cmp(&right.key));
        merges
    }
}

/// Working state shared by the drivers that update distances with
/// Lance-Williams formulas.
#[derive(Debug)]
pub(super) struct Agglomeration {
    method: LinkageMethod,
    matrix: WorkingMatrix,
    sizes: Vec<usize>,
    log: MergeLog,
}

impl Agglomeration {
    pub(super) fn new(matrix: &[Vec<f64>], method: LinkageMethod) -> Self {
        let n = matrix.len();
        Self {
            method,
            matrix: WorkingMatrix::new(matrix, method.uses_squared_distances()),
            sizes: vec![1; (2 * n).saturating_sub(1)],
            log: MergeLog::new(n),
        }
    }

    pub(super) const fn matrix(&self) -> &WorkingMatrix {
        &self.matrix
    }

    /// Merges live clusters `a` and `b` and returns the slot of the result.
    pub(super) fn merge(&mut self, a: usize, b: usize) -> usize {
        let distance = self.matrix.distance(a, b);
        let row = merged_row(self.method, &self.matrix, a, b, &self.sizes);
        let node = self.matrix.push(row);
        self.sizes[node] = self.sizes[a] + self.sizes[b];
        self.matrix.retire(a);
        self.matrix.retire(b);
        let slot = self.log.record(a, b, distance);
        debug_assert_eq!(slot, node, "matrix slots and merge ids must agree");
        node
    }

    pub(super) fn into_sorted(self) -> Vec<RawMerge> {
        self.log.into_sorted(self.method.uses_squared_distances())
    }
}
