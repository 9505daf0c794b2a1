//! Priority-queue driver for linkage methods that can produce inversions.
//!
//! Every live cluster remembers a candidate nearest neighbour among the
//! clusters with a higher index, keyed in a min-heap by the remembered
//! distance. Candidates are revalidated lazily when popped: stale heap
//! entries are skipped and stale neighbours are recomputed and re-queued.
//! The popped pair is only merged once its distance is confirmed against
//! the working matrix, so every merge joins a globally closest pair.

use std::{cmp::Ordering, cmp::Reverse, collections::BinaryHeap};

use crate::linkage::LinkageMethod;

use super::{Agglomeration, RawMerge};

#[derive(Clone, Copy, Debug)]
struct NeighbourEntry {
    distance: f64,
    index: usize,
}

impl PartialEq for NeighbourEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NeighbourEntry {}

impl PartialOrd for NeighbourEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NeighbourEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Candidate nearest neighbour per slot. A slot pointing at itself has no
/// neighbour above it; `None` marks a merged slot.
struct Candidates {
    nearest: Vec<Option<(usize, f64)>>,
    heap: BinaryHeap<Reverse<NeighbourEntry>>,
}

impl Candidates {
    fn with_capacity(slots: usize) -> Self {
        Self {
            nearest: vec![None; slots],
            heap: BinaryHeap::with_capacity(slots),
        }
    }

    fn set(&mut self, index: usize, neighbour: usize, distance: f64) {
        self.nearest[index] = Some((neighbour, distance));
        self.heap.push(Reverse(NeighbourEntry { distance, index }));
    }

    fn refresh(&mut self, agglomeration: &Agglomeration, index: usize) {
        let (neighbour, distance) = agglomeration
            .matrix()
            .nearest_above(index)
            .unwrap_or((index, f64::INFINITY));
        self.set(index, neighbour, distance);
    }
}

pub(super) fn cluster(matrix: &[Vec<f64>], method: LinkageMethod) -> Vec<RawMerge> {
    let n = matrix.len();
    let mut agglomeration = Agglomeration::new(matrix, method);
    let mut candidates = Candidates::with_capacity((2 * n).saturating_sub(1));
    for index in 0..n {
        candidates.refresh(&agglomeration, index);
    }

    while agglomeration.matrix().live_count() > 1 {
        let Some(Reverse(entry)) = candidates.heap.pop() else {
            break;
        };
        let a = entry.index;
        let Some((b, remembered)) = candidates.nearest[a] else {
            continue;
        };
        if remembered.total_cmp(&entry.distance) != Ordering::Equal || b == a {
            continue;
        }
        let current = agglomeration.matrix();
        if !current.is_live(b) || current.distance(a, b) != remembered {
            candidates.refresh(&agglomeration, a);
            continue;
        }

        let node = agglomeration.merge(a, b);
        candidates.nearest[a] = None;
        candidates.nearest[b] = None;
        candidates.set(node, node, f64::INFINITY);

        let current = agglomeration.matrix();
        for i in 0..node {
            if !current.is_live(i) {
                continue;
            }
            let Some((neighbour, distance)) = candidates.nearest[i] else {
                continue;
            };
            // The old bound stays valid for the merged cluster until it is
            // revalidated on pop.
            if neighbour == a || neighbour == b {
                candidates.nearest[i] = Some((node, distance));
            }
            let to_node = current.distance(i, node);
            if i + 1 == node || to_node < distance {
                candidates.set(i, node, to_node);
            }
        }
    }

    agglomeration.into_sorted()
}
