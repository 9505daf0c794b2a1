//! Scalar implementations of the supported metrics over validated vectors.

use super::{
    helpers::{components, ratio_or_zero},
    types::Vector,
};

/// Share of positions, among those where either value is non-zero, where
/// exactly one value is non-zero.
pub(super) fn binary(left: &Vector<'_>, right: &Vector<'_>) -> f64 {
    let (differing, occupied) = components(left, right).fold((0_u32, 0_u32), |(diff, any), (x, y)| {
        match (x != 0.0, y != 0.0) {
            (false, false) => (diff, any),
            (true, true) => (diff, any + 1),
            _ => (diff + 1, any + 1),
        }
    });
    ratio_or_zero(f64::from(differing), f64::from(occupied))
}

/// `Σ |x - y| / |x + y|`, skipping positions where the denominator is zero.
pub(super) fn canberra(left: &Vector<'_>, right: &Vector<'_>) -> f64 {
    components(left, right)
        .map(|(x, y)| ratio_or_zero((x - y).abs(), (x + y).abs()))
        .sum()
}

/// `1 - Σ min(x, y) / Σ max(x, y)`; zero when both vectors are all zeros.
pub(super) fn jaccard(left: &Vector<'_>, right: &Vector<'_>) -> f64 {
    let (lower, upper) = components(left, right)
        .fold((0.0, 0.0), |(lower, upper), (x, y)| (lower + x.min(y), upper + x.max(y)));
    if upper == 0.0 {
        0.0
    } else {
        1.0 - lower / upper
    }
}

pub(super) fn manhattan(left: &Vector<'_>, right: &Vector<'_>) -> f64 {
    components(left, right).map(|(x, y)| (x - y).abs()).sum()
}

pub(super) fn maximum(left: &Vector<'_>, right: &Vector<'_>) -> f64 {
    components(left, right)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

pub(super) fn euclidean(left: &Vector<'_>, right: &Vector<'_>) -> f64 {
    components(left, right)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
