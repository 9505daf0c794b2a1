//! Optimal leaf ordering for a fixed dendrogram topology.
//!
//! Flipping the two children of any internal node leaves the hierarchy
//! unchanged but alters which leaves end up adjacent. [`optimize`] chooses
//! the flips that minimise the sum of distances between neighbouring leaves,
//! using the dynamic program of Bar-Joseph, Gifford and Jaakkola (2001).
//!
//! For every internal node with pools `A` (leaves of the first child) and
//! `B` (leaves of the second), the score `M[node][a][b]` is the cheapest
//! ordering of the node's leaves that starts at `a ∈ A` and ends at `b ∈ B`.
//! Scores are built bottom-up with a branch-and-bound over partner lists
//! sorted by score. Reconstruction runs top-down: the root picks its best
//! pair of outer leaves, and every node passes both outer leaves of each
//! internal child down to it, which fixes that child's orientation.

use tracing::{debug, instrument, warn};

use crate::{
    Result,
    dendrogram::{Dendrogram, SubCluster},
    error::ClusterError,
    matrix::validate_distance_matrix,
};

type Partner = (f64, usize);

/// Dense `|A| x |B|` score block of one internal node.
#[derive(Debug)]
struct ScoreTable {
    left: Vec<usize>,
    right: Vec<usize>,
    scores: Vec<f64>,
    skipped: bool,
}

impl ScoreTable {
    /// Scores keyed by the opposite pool for the leaf at `position` in the
    /// node's pool (`A` followed by `B`).
    fn partners(&self, position: usize) -> Vec<Partner> {
        let width = self.right.len();
        match position.checked_sub(self.left.len()) {
            None => self
                .right
                .iter()
                .enumerate()
                .map(|(col, &leaf)| (self.scores[position * width + col], leaf))
                .collect(),
            Some(col) => self
                .left
                .iter()
                .enumerate()
                .map(|(row, &leaf)| (self.scores[row * width + col], leaf))
                .collect(),
        }
    }

    fn position(&self, leaf: usize) -> Option<usize> {
        self.left.iter().chain(&self.right).position(|&l| l == leaf)
    }

    /// Cheapest pair of outer leaves, returned lowest index first.
    fn best_pair(&self) -> Option<(usize, usize)> {
        let width = self.right.len();
        let mut best: Option<(f64, usize, usize)> = None;
        for (row, &a) in self.left.iter().enumerate() {
            for (col, &b) in self.right.iter().enumerate() {
                let candidate = (self.scores[row * width + col], a.min(b), a.max(b));
                if best.is_none_or(|current| ranks_before(candidate, current)) {
                    best = Some(candidate);
                }
            }
        }
        best.map(|(_, lo, hi)| (lo, hi))
    }
}

fn ranks_before(candidate: (f64, usize, usize), current: (f64, usize, usize)) -> bool {
    candidate
        .0
        .total_cmp(&current.0)
        .then(candidate.1.cmp(&current.1))
        .then(candidate.2.cmp(&current.2))
        .is_lt()
}

/// Reorders the leaves of `dendrogram` to minimise the summed distance between
/// adjacent leaves, without changing its topology or node ids.
///
/// When `ignore_threshold` is non-zero, nodes whose pools satisfy
/// `|A| * |B| > ignore_threshold` skip the exhaustive search and combine each
/// side's best score instead, trading optimality for speed.
///
/// # Errors
/// Returns the validation errors of [`crate::cluster_with`] when `matrix` is
/// not a valid distance matrix and [`ClusterError::DimensionMismatch`] when it
/// does not have one row per leaf.
///
/// # Examples
/// ```
/// use dendro_core::{LinkageMethod, cluster_with, optimize};
///
/// let matrix = vec![
///     vec![0.0, 1.0, 9.0, 2.0],
///     vec![1.0, 0.0, 8.0, 9.0],
///     vec![9.0, 8.0, 0.0, 3.0],
///     vec![2.0, 9.0, 3.0, 0.0],
/// ];
/// let names = ["a", "b", "c", "d"];
/// let dendrogram = cluster_with(&matrix, &names, LinkageMethod::Single)?;
/// let optimized = optimize(&dendrogram, &matrix, 0)?;
/// assert_eq!(optimized.leaf_count(), 4);
/// assert_eq!(optimized.clusters().len(), dendrogram.clusters().len());
/// # Ok::<(), dendro_core::ClusterError>(())
/// ```
#[instrument(
    name = "core.optimize",
    err,
    skip(dendrogram, matrix),
    fields(leaves = dendrogram.leaf_count()),
)]
pub fn optimize(
    dendrogram: &Dendrogram,
    matrix: &[Vec<f64>],
    ignore_threshold: usize,
) -> Result<Dendrogram> {
    let items = validate_distance_matrix(matrix).inspect_err(|err| {
        warn!(code = %err.code(), "distance matrix rejected");
    })?;
    let leaves = dendrogram.leaf_count();
    if items != leaves {
        warn!(leaves, items, "distance matrix does not match dendrogram");
        return Err(ClusterError::DimensionMismatch { leaves, items });
    }

    let tables = score_tables(dendrogram, matrix, ignore_threshold);
    debug!(
        skipped = tables.iter().filter(|table| table.skipped).count(),
        "score tables built"
    );
    let clusters = reconstruct(dendrogram, matrix, &tables);
    Ok(Dendrogram::from_labelled(leaves, clusters))
}

fn score_tables(dendrogram: &Dendrogram, matrix: &[Vec<f64>], threshold: usize) -> Vec<ScoreTable> {
    let n = dendrogram.leaf_count();
    let sets = dendrogram.leaf_sets();
    let pool = |id: usize| {
        id.checked_sub(n)
            .and_then(|offset| sets.get(offset))
            .map_or_else(|| vec![id], Clone::clone)
    };

    let mut tables: Vec<ScoreTable> = Vec::with_capacity(dendrogram.clusters().len());
    for cluster in dendrogram.clusters() {
        let left = pool(cluster.leaf_a);
        let right = pool(cluster.leaf_b);
        let skipped = threshold > 0 && left.len() * right.len() > threshold;
        let floor = left
            .iter()
            .flat_map(|&u| right.iter().map(move |&v| matrix[u][v]))
            .fold(f64::INFINITY, f64::min);

        let left_partners: Vec<Vec<Partner>> = left
            .iter()
            .enumerate()
            .map(|(position, &leaf)| partners(&tables, n, cluster.leaf_a, position, leaf))
            .collect();
        let right_partners: Vec<Vec<Partner>> = right
            .iter()
            .enumerate()
            .map(|(position, &leaf)| partners(&tables, n, cluster.leaf_b, position, leaf))
            .collect();

        let mut scores = Vec::with_capacity(left.len() * right.len());
        for outer_left in &left_partners {
            for outer_right in &right_partners {
                scores.push(if skipped {
                    best_score(outer_left) + best_score(outer_right)
                } else {
                    join(outer_left, outer_right, floor, matrix)
                });
            }
        }
        tables.push(ScoreTable {
            left,
            right,
            scores,
            skipped,
        });
    }
    tables
}

/// Partners of the leaf at `position` in `child`'s pool, ascending by score
/// then leaf index. A leaf child partners only itself.
fn partners(
    tables: &[ScoreTable],
    n: usize,
    child: usize,
    position: usize,
    leaf: usize,
) -> Vec<Partner> {
    let Some(table) = child.checked_sub(n).and_then(|offset| tables.get(offset)) else {
        return vec![(0.0, leaf)];
    };
    let mut list = table.partners(position);
    list.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
    list
}

fn best_score(partners: &[Partner]) -> f64 {
    partners.first().map_or(f64::INFINITY, |&(score, _)| score)
}

/// Cheapest way to join an ordering ending at some `u` with one starting at
/// some `v`. `floor` bounds every `dist[u][v]` from below, so once the
/// partial score plus `floor` cannot beat the best so far the scan stops.
fn join(left: &[Partner], right: &[Partner], floor: f64, matrix: &[Vec<f64>]) -> f64 {
    let right_best = best_score(right);
    let mut best = f64::INFINITY;
    for &(left_score, u) in left {
        if left_score + right_best + floor >= best {
            break;
        }
        for &(right_score, v) in right {
            if left_score + right_score + floor >= best {
                break;
            }
            best = best.min(left_score + right_score + matrix[u][v]);
        }
    }
    best
}

fn pool_position(tables: &[ScoreTable], n: usize, child: usize, leaf: usize) -> usize {
    child
        .checked_sub(n)
        .and_then(|offset| tables.get(offset))
        .and_then(|table| table.position(leaf))
        .unwrap_or(0)
}

fn reconstruct(
    dendrogram: &Dendrogram,
    matrix: &[Vec<f64>],
    tables: &[ScoreTable],
) -> Vec<SubCluster> {
    let n = dendrogram.leaf_count();
    let mut clusters = dendrogram.clusters().to_vec();
    let mut ends: Vec<Option<(usize, usize)>> = vec![None; clusters.len()];

    for index in (0..clusters.len()).rev() {
        let table = &tables[index];
        let Some((outer_left, outer_right)) = ends[index].or_else(|| table.best_pair()) else {
            continue;
        };
        let mut cluster = clusters[index];
        if !table.left.contains(&outer_left) {
            cluster = cluster.swapped();
        }

        let left = partners(
            tables,
            n,
            cluster.leaf_a,
            pool_position(tables, n, cluster.leaf_a, outer_left),
            outer_left,
        );
        let right = partners(
            tables,
            n,
            cluster.leaf_b,
            pool_position(tables, n, cluster.leaf_b, outer_right),
            outer_right,
        );
        let (inner_left, inner_right) = if table.skipped {
            (first_leaf(&left, outer_left), first_leaf(&right, outer_right))
        } else {
            inner_boundary(&left, &right, matrix).unwrap_or((outer_left, outer_right))
        };

        if let Some(child) = cluster.leaf_a.checked_sub(n) {
            ends[child] = Some((outer_left, inner_left));
        }
        if let Some(child) = cluster.leaf_b.checked_sub(n) {
            ends[child] = Some((inner_right, outer_right));
        }
        clusters[index] = cluster;
    }
    clusters
}

fn first_leaf(partners: &[Partner], fallback: usize) -> usize {
    partners.first().map_or(fallback, |&(_, leaf)| leaf)
}

/// The adjacent pair `(u, v)` across the node's split that realises the best
/// score for the chosen outer leaves, lowest `u` then `v` on ties.
fn inner_boundary(left: &[Partner], right: &[Partner], matrix: &[Vec<f64>]) -> Option<(usize, usize)> {
    let mut best: Option<(f64, usize, usize)> = None;
    for &(left_score, u) in left {
        for &(right_score, v) in right {
            let candidate = (left_score + right_score + matrix[u][v], u, v);
            if best.is_none_or(|current| ranks_before(candidate, current)) {
                best = Some(candidate);
            }
        }
    }
    best.map(|(_, u, v)| (u, v))
}
