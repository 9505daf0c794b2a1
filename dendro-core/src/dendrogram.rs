//! Labelled merge trees and their serialisations.
//!
//! A [`Dendrogram`] over `n` leaves stores `n - 1` [`SubCluster`] records in
//! node-id order: record `i` creates node `n + i` and its children always
//! carry smaller ids. Leaves are `0..n` and the root is `2n - 2`.

use std::fmt::Write as _;

use crate::{Result, error::ClusterError};

/// One merge in a dendrogram.
///
/// `leaf_a` and `leaf_b` are either leaf indices (`< n`) or ids of earlier
/// nodes; `length_a` and `length_b` are the branch lengths from `node` down to
/// each child.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubCluster {
    /// First child.
    pub leaf_a: usize,
    /// Second child.
    pub leaf_b: usize,
    /// Branch length from `node` to `leaf_a`.
    pub length_a: f64,
    /// Branch length from `node` to `leaf_b`.
    pub length_b: f64,
    /// Id of the node created by this merge.
    pub node: usize,
}

impl SubCluster {
    /// Returns the record with its children (and their lengths) exchanged.
    #[must_use]
    pub const fn swapped(self) -> Self {
        Self {
            leaf_a: self.leaf_b,
            leaf_b: self.leaf_a,
            length_a: self.length_b,
            length_b: self.length_a,
            node: self.node,
        }
    }
}

/// Binary merge tree with branch lengths.
///
/// # Examples
/// ```
/// use dendro_core::{Dendrogram, SubCluster};
///
/// let dendrogram = Dendrogram::from_clusters(
///     3,
///     vec![
///         SubCluster { leaf_a: 0, leaf_b: 2, length_a: 1.0, length_b: 1.0, node: 3 },
///         SubCluster { leaf_a: 1, leaf_b: 3, length_a: 2.5, length_b: 1.5, node: 4 },
///     ],
/// )?;
/// assert_eq!(dendrogram.root(), 4);
/// assert_eq!(dendrogram.leaf_order(), vec![1, 0, 2]);
/// assert_eq!(dendrogram.newick(&["a", "b", "c"])?, "(b:2.5,(a:1,c:1):1.5)");
/// # Ok::<(), dendro_core::ClusterError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Dendrogram {
    leaf_count: usize,
    clusters: Vec<SubCluster>,
}

impl Dendrogram {
    /// Builds a dendrogram from merge records, checking that they form a
    /// binary tree in node-id order.
    ///
    /// # Errors
    /// Returns [`ClusterError::EmptyMatrix`] when `leaf_count` is zero and
    /// [`ClusterError::MalformedDendrogram`] when the record count is not
    /// `leaf_count - 1`, when a record's id is out of sequence, when a child
    /// does not precede its parent, or when a node is used as a child twice.
    pub fn from_clusters(leaf_count: usize, clusters: Vec<SubCluster>) -> Result<Self> {
        if leaf_count == 0 {
            return Err(ClusterError::EmptyMatrix);
        }
        if clusters.len() + 1 != leaf_count {
            return Err(ClusterError::MalformedDendrogram {
                node: leaf_count + clusters.len(),
                reason: "expected exactly one record per internal node",
            });
        }
        let mut used = vec![false; 2 * leaf_count - 1];
        for (offset, cluster) in clusters.iter().enumerate() {
            let node = leaf_count + offset;
            if cluster.node != node {
                return Err(ClusterError::MalformedDendrogram {
                    node: cluster.node,
                    reason: "records must be ordered by node id",
                });
            }
            for child in [cluster.leaf_a, cluster.leaf_b] {
                if child >= node {
                    return Err(ClusterError::MalformedDendrogram {
                        node,
                        reason: "children must precede their parent",
                    });
                }
                if std::mem::replace(&mut used[child], true) {
                    return Err(ClusterError::MalformedDendrogram {
                        node,
                        reason: "child already has a parent",
                    });
                }
            }
        }
        Ok(Self {
            leaf_count,
            clusters,
        })
    }

    /// Wraps records produced by the labeller, which are valid by construction.
    pub(crate) const fn from_labelled(leaf_count: usize, clusters: Vec<SubCluster>) -> Self {
        Self {
            leaf_count,
            clusters,
        }
    }

    /// Number of leaves.
    #[must_use]
    pub const fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Merge records in node-id order.
    #[must_use]
    pub fn clusters(&self) -> &[SubCluster] {
        &self.clusters
    }

    /// Id of the root: `2n - 2`, or leaf `0` for a single leaf.
    #[must_use]
    pub fn root(&self) -> usize {
        self.clusters.last().map_or(0, |cluster| cluster.node)
    }

    /// Returns the record that created node `id`.
    #[must_use]
    pub fn cluster(&self, id: usize) -> Option<&SubCluster> {
        id.checked_sub(self.leaf_count)
            .and_then(|offset| self.clusters.get(offset))
    }

    /// Leaf indices in layout order: an in-order walk visiting `leaf_a`
    /// before `leaf_b` at every node.
    #[must_use]
    pub fn leaf_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.leaf_count);
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            match self.cluster(id) {
                Some(cluster) => {
                    stack.push(cluster.leaf_b);
                    stack.push(cluster.leaf_a);
                }
                None => order.push(id),
            }
        }
        order
    }

    /// Leaves beneath every internal node, in layout order, indexed by
    /// `node - n`.
    pub(crate) fn leaf_sets(&self) -> Vec<Vec<usize>> {
        let mut sets: Vec<Vec<usize>> = Vec::with_capacity(self.clusters.len());
        for cluster in &self.clusters {
            let mut leaves = self.leaves_of(&sets, cluster.leaf_a);
            leaves.extend(self.leaves_of(&sets, cluster.leaf_b));
            sets.push(leaves);
        }
        sets
    }

    fn leaves_of(&self, sets: &[Vec<usize>], id: usize) -> Vec<usize> {
        id.checked_sub(self.leaf_count)
            .and_then(|offset| sets.get(offset))
            .map_or_else(|| vec![id], Clone::clone)
    }

    /// Serialises the tree in Newick form, labelling leaf `i` with `names[i]`.
    ///
    /// Branch lengths use the shortest representation that round-trips. The
    /// root carries no length and no trailing `;` is emitted.
    ///
    /// # Errors
    /// Returns [`ClusterError::NameLengthMismatch`] when `names` does not hold
    /// exactly one name per leaf.
    pub fn newick<S: AsRef<str>>(&self, names: &[S]) -> Result<String> {
        if names.len() != self.leaf_count {
            return Err(ClusterError::NameLengthMismatch {
                names: names.len(),
                items: self.leaf_count,
            });
        }

        enum Step {
            Visit(usize, Option<f64>),
            Comma,
            Close(Option<f64>),
        }

        let mut out = String::new();
        let mut stack = vec![Step::Visit(self.root(), None)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Visit(id, length) => match self.cluster(id) {
                    Some(cluster) => {
                        out.push('(');
                        stack.push(Step::Close(length));
                        stack.push(Step::Visit(cluster.leaf_b, Some(cluster.length_b)));
                        stack.push(Step::Comma);
                        stack.push(Step::Visit(cluster.leaf_a, Some(cluster.length_a)));
                    }
                    None => {
                        out.push_str(names[id].as_ref());
                        push_length(&mut out, length);
                    }
                },
                Step::Comma => out.push(','),
                Step::Close(length) => {
                    out.push(')');
                    push_length(&mut out, length);
                }
            }
        }
        Ok(out)
    }

    /// Height of every internal node, indexed by `node - n`: the sum of its two
    /// branch lengths plus the heights of any internal children.
    #[must_use]
    pub fn node_heights(&self) -> Vec<f64> {
        let mut heights: Vec<f64> = Vec::with_capacity(self.clusters.len());
        for cluster in &self.clusters {
            let below = |id: usize| {
                id.checked_sub(self.leaf_count)
                    .and_then(|offset| heights.get(offset))
                    .copied()
                    .unwrap_or(0.0)
            };
            let height =
                cluster.length_a + cluster.length_b + below(cluster.leaf_a) + below(cluster.leaf_b);
            heights.push(height);
        }
        heights
    }
}

fn push_length(out: &mut String, length: Option<f64>) {
    if let Some(length) = length {
        // Writing into a String cannot fail.
        let _ = write!(out, ":{length}");
    }
}
