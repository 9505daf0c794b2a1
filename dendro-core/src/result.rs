//! Result type for a complete clustering run.

use crate::dendrogram::Dendrogram;

/// Output of [`crate::Clusterer::run`]: the dendrogram together with its
/// Newick serialisation and the leaf names in layout order.
///
/// # Examples
/// ```
/// use dendro_core::{ClusterBuilder, LinkageMethod};
///
/// let matrix = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
/// let clusterer = ClusterBuilder::new().with_method(LinkageMethod::Single).build()?;
/// let hclust = clusterer.run(&matrix, &["x", "y"])?;
/// assert_eq!(hclust.newick(), "(x:0.5,y:0.5)");
/// assert_eq!(hclust.order(), ["x", "y"]);
/// assert_eq!(hclust.dendrogram().clusters().len(), 1);
/// # Ok::<(), dendro_core::ClusterError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Hclust {
    dendrogram: Dendrogram,
    newick: String,
    order: Vec<String>,
}

impl Hclust {
    pub(crate) fn new(dendrogram: Dendrogram, newick: String, order: Vec<String>) -> Self {
        Self {
            dendrogram,
            newick,
            order,
        }
    }

    /// Returns the labelled dendrogram.
    #[must_use]
    pub fn dendrogram(&self) -> &Dendrogram {
        &self.dendrogram
    }

    /// Returns the tree in Newick form, without a trailing `;`.
    #[must_use]
    pub fn newick(&self) -> &str {
        &self.newick
    }

    /// Returns the leaf names in layout order.
    #[must_use]
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Splits the result into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Dendrogram, String, Vec<String>) {
        (self.dendrogram, self.newick, self.order)
    }
}
