//! Nearest-neighbour chain driver for reducible linkage methods.
//!
//! The chain persists across merges: after a reciprocal pair is merged, the
//! remaining prefix is still a valid chain because reducibility guarantees
//! that merging two clusters never brings the result closer to any third
//! cluster than its closer constituent was.

use crate::linkage::LinkageMethod;

use super::{Agglomeration, RawMerge};

pub(super) fn cluster(matrix: &[Vec<f64>], method: LinkageMethod) -> Vec<RawMerge> {
    let mut agglomeration = Agglomeration::new(matrix, method);
    let mut chain: Vec<usize> = Vec::with_capacity(matrix.len());

    while agglomeration.matrix().live_count() > 1 {
        if chain.is_empty() {
            let Some(start) = agglomeration.matrix().first_live() else {
                break;
            };
            chain.push(start);
        }

        loop {
            let len = chain.len();
            let top = chain[len - 1];
            let previous = len.checked_sub(2).map(|index| chain[index]);
            let Some((neighbour, _)) = agglomeration.matrix().nearest(top, previous) else {
                // Unreachable while at least two clusters are live.
                chain.clear();
                break;
            };
            if Some(neighbour) == previous {
                chain.truncate(len - 2);
                agglomeration.merge(neighbour, top);
                break;
            }
            chain.push(neighbour);
        }
    }

    agglomeration.into_sorted()
}
