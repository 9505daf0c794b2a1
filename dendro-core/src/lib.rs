//! Dendro core library: agglomerative hierarchical clustering over distance
//! matrices, optimal leaf ordering and the supporting distance and matrix
//! utilities.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod clusterer;
mod dendrogram;
mod distance;
mod error;
mod hierarchy;
mod linkage;
mod matrix;
mod optimize;
mod result;
#[cfg(test)]
mod test_utils;

pub use crate::{
    builder::ClusterBuilder,
    clusterer::Clusterer,
    dendrogram::{Dendrogram, SubCluster},
    distance::{DistanceError, DistanceMetric, VectorKind, distance_matrix},
    error::{ClusterError, ClusterErrorCode, Result},
    hierarchy::{cluster, cluster_with},
    linkage::LinkageMethod,
    matrix::{Axis, SortError, SortErrorCode, sort_by_names, transpose},
    optimize::optimize,
    result::Hclust,
};
