//! Union-find labelling of raw merges.
//!
//! Drivers describe every merge by one leaf from each side. Replaying the
//! merges in height order through a disjoint-set forest recovers which node
//! currently owns each leaf, so every merge can be rewritten in terms of
//! node ids. Each node remembers half of its merge height, which turns the
//! height of a merge into branch lengths down to the merged children.

use crate::dendrogram::SubCluster;

use super::RawMerge;

#[derive(Clone, Debug)]
struct LabelForest {
    parent: Vec<Option<usize>>,
    height: Vec<Option<f64>>,
    next: usize,
}

impl LabelForest {
    fn new(leaf_count: usize) -> Self {
        let slots = (2 * leaf_count).saturating_sub(1);
        Self {
            parent: vec![None; slots],
            height: vec![None; slots],
            next: leaf_count,
        }
    }

    /// Returns the root currently owning `node` together with the branch
    /// length from a merge at `distance` down to that root.
    fn find(&mut self, mut node: usize, distance: f64) -> (usize, f64) {
        let mut root = node;
        while let Some(parent) = self.parent[root] {
            root = parent;
        }

        while let Some(parent) = self.parent[node] {
            self.parent[node] = Some(root);
            node = parent;
        }

        let length = distance / 2.0 - self.height[root].unwrap_or(0.0);
        (root, length)
    }

    fn add_parent(&mut self, left: usize, right: usize, height: f64) -> usize {
        let node = self.next;
        self.height[node] = Some(height);
        self.parent[left] = Some(node);
        self.parent[right] = Some(node);
        self.next += 1;
        node
    }
}

/// Assigns node ids `leaf_count..` to `merges`, which must be ordered so that
/// every merge follows the merges beneath it.
pub(super) fn label(leaf_count: usize, merges: &[RawMerge]) -> Vec<SubCluster> {
    let mut forest = LabelForest::new(leaf_count);
    merges
        .iter()
        .map(|merge| {
            let (leaf_a, length_a) = forest.find(merge.leaf_a, merge.distance);
            let (leaf_b, length_b) = forest.find(merge.leaf_b, merge.distance);
            let node = forest.add_parent(leaf_a, leaf_b, merge.distance / 2.0);
            SubCluster {
                leaf_a,
                leaf_b,
                length_a,
                length_b,
                node,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(leaf_a: usize, leaf_b: usize, distance: f64) -> RawMerge {
        RawMerge {
            leaf_a,
            leaf_b,
            distance,
            key: distance,
        }
    }

    #[test]
    fn label_assigns_contiguous_ids_and_half_heights() {
        let merges = [
            raw(0, 4, 2.0),
            raw(4, 1, 5.8),
            raw(2, 3, 12.2),
            raw(1, 2, 14.1),
        ];
        let labelled = label(5, &merges);
        let summary: Vec<_> = labelled
            .iter()
            .map(|c| (c.leaf_a, c.leaf_b, c.node))
            .collect();
        assert_eq!(summary, vec![(0, 4, 5), (5, 1, 6), (2, 3, 7), (6, 7, 8)]);

        let lengths: Vec<_> = labelled.iter().map(|c| (c.length_a, c.length_b)).collect();
        let expected = [(1.0, 1.0), (1.9, 2.9), (6.1, 6.1), (4.15, 0.95)];
        for ((a, b), (ea, eb)) in lengths.iter().zip(expected) {
            assert!((a - ea).abs() < 1e-9 && (b - eb).abs() < 1e-9);
        }
    }

    #[test]
    fn label_resolves_leaves_to_their_current_clusters() {
        let merges = [
            raw(0, 3, 0.1),
            raw(2, 5, 0.15),
            raw(1, 3, 0.2),
            raw(4, 3, 0.4),
            raw(5, 4, 0.6),
        ];
        let labelled = label(6, &merges);
        let expected = [
            (0, 3, 0.05, 0.05, 6),
            (2, 5, 0.075, 0.075, 7),
            (1, 6, 0.1, 0.05, 8),
            (4, 8, 0.2, 0.1, 9),
            (7, 9, 0.225, 0.1, 10),
        ];
        for (got, (a, b, la, lb, node)) in labelled.iter().zip(expected) {
            assert_eq!((got.leaf_a, got.leaf_b, got.node), (a, b, node));
            assert!((got.length_a - la).abs() < 1e-9, "{got:?}");
            assert!((got.length_b - lb).abs() < 1e-9, "{got:?}");
        }
    }

    #[test]
    fn find_compresses_paths_to_the_root() {
        let mut forest = LabelForest::new(3);
        let (a, _) = forest.find(0, 1.0);
        let (b, _) = forest.find(1, 1.0);
        let first = forest.add_parent(a, b, 0.5);
        let (c, _) = forest.find(0, 3.0);
        let (d, _) = forest.find(2, 3.0);
        let second = forest.add_parent(c, d, 1.5);
        assert_eq!((first, c, second), (3, 3, 4));

        let (root, length) = forest.find(0, 5.0);
        assert_eq!(root, 4);
        assert!((length - 1.0).abs() < 1e-12);
        assert_eq!(forest.parent[0], Some(4));
    }

    #[test]
    fn single_leaf_yields_no_records() {
        assert!(label(1, &[]).is_empty());
    }
}
