//! Single linkage as a minimum spanning tree grown from the first item.
//!
//! Each step attaches the unattached item closest to the fragment and records
//! it as a merge between the previously attached item and the new one. The
//! sorted edge list, labelled by union-find, is the single-linkage hierarchy.

use super::{MergeLog, RawMerge};

pub(super) fn cluster(matrix: &[Vec<f64>]) -> Vec<RawMerge> {
    let n = matrix.len();
    let mut log = MergeLog::new(n);
    if n < 2 {
        return log.into_sorted(false);
    }

    let mut current = 0;
    let mut remaining: Vec<usize> = (1..n).collect();
    let mut best: Vec<f64> = remaining.iter().map(|&item| matrix[0][item]).collect();

    while !remaining.is_empty() {
        let position = best
            .iter()
            .enumerate()
            .fold(0, |chosen, (index, &value)| {
                if value < best[chosen] { index } else { chosen }
            });
        let picked = remaining.remove(position);
        let distance = best.remove(position);
        log.record(current, picked, distance);
        current = picked;

        for (slot, &item) in best.iter_mut().zip(&remaining) {
            *slot = slot.min(matrix[current][item]);
        }
    }

    log.into_sorted(false)
}
