//! Orchestrates clustering, optional leaf ordering and serialisation.

use tracing::{info, instrument};

use crate::{
    Result, hierarchy::cluster_with, linkage::LinkageMethod, optimize::optimize, result::Hclust,
};

/// Entry point for running a configured clustering.
///
/// # Examples
/// ```
/// use dendro_core::{ClusterBuilder, LinkageMethod};
///
/// let matrix = vec![
///     vec![0.0, 2.0, 6.0],
///     vec![2.0, 0.0, 5.0],
///     vec![6.0, 5.0, 0.0],
/// ];
/// let clusterer = ClusterBuilder::new()
///     .with_method(LinkageMethod::Complete)
///     .with_optimization(true)
///     .build()
///     .expect("builder must succeed");
/// let hclust = clusterer.run(&matrix, &["a", "b", "c"]).expect("run must succeed");
/// assert_eq!(hclust.order().len(), 3);
/// assert_eq!(hclust.dendrogram().root(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clusterer {
    method: LinkageMethod,
    optimization: bool,
    ignore_threshold: usize,
}

impl Clusterer {
    pub(crate) const fn new(method: LinkageMethod, optimization: bool, ignore_threshold: usize) -> Self {
        Self {
            method,
            optimization,
            ignore_threshold,
        }
    }

    /// Returns the linkage method used by [`Self::run`].
    #[must_use]
    pub const fn method(&self) -> LinkageMethod {
        self.method
    }

    /// Returns whether leaves are reordered after clustering.
    #[must_use]
    pub const fn optimization(&self) -> bool {
        self.optimization
    }

    /// Returns the optimiser's ignore threshold.
    #[must_use]
    pub const fn ignore_threshold(&self) -> usize {
        self.ignore_threshold
    }

    /// Clusters `matrix`, optionally reorders the leaves, and serialises the
    /// result using `names` as leaf labels.
    ///
    /// # Errors
    /// Returns the validation errors of [`crate::cluster_with`].
    #[instrument(
        name = "core.run",
        err,
        skip(self, matrix, names),
        fields(
            items = matrix.len(),
            method = %self.method,
            optimization = self.optimization,
            ignore_threshold = self.ignore_threshold,
        ),
    )]
    pub fn run<S: AsRef<str>>(&self, matrix: &[Vec<f64>], names: &[S]) -> Result<Hclust> {
        let mut dendrogram = cluster_with(matrix, names, self.method)?;
        if self.optimization {
            dendrogram = optimize(&dendrogram, matrix, self.ignore_threshold)?;
        }

        let newick = dendrogram.newick(names)?;
        let order: Vec<String> = dendrogram
            .leaf_order()
            .into_iter()
            .map(|leaf| names[leaf].as_ref().to_owned())
            .collect();
        info!(leaves = order.len(), "clustering completed");
        Ok(Hclust::new(dendrogram, newick, order))
    }
}
