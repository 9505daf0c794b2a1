//! Error types for the dendro core library.
//!
//! Defines the error enum exposed by the clustering API, its stable error
//! codes, and a convenient result alias.

use std::{fmt, sync::Arc};

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Error type produced when validating input for, or running, a clustering.
///
/// Every variant is raised before any merge is performed; the clustering
/// loops themselves are total over validated input.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ClusterError {
    /// The distance matrix contained no rows.
    #[error("distance matrix contains no rows")]
    EmptyMatrix,
    /// A row of the distance matrix did not match the number of rows.
    #[error("distance matrix is not square: row {row} has {columns} columns but {rows} rows were given")]
    NonSquareMatrix {
        /// Number of rows in the matrix.
        rows: usize,
        /// Index of the first offending row.
        row: usize,
        /// Number of columns in the offending row.
        columns: usize,
    },
    /// The number of names differs from the matrix dimension.
    #[error("{names} names were given for {items} items")]
    NameLengthMismatch {
        /// Number of names supplied by the caller.
        names: usize,
        /// Number of items described by the matrix or dendrogram.
        items: usize,
    },
    /// The requested linkage method is not recognised.
    #[error("unknown linkage method `{name}`")]
    UnknownMethod {
        /// The unrecognised method name.
        name: Arc<str>,
    },
    /// A matrix entry was negative, NaN or infinite.
    #[error("distance at ({row}, {col}) must be finite and non-negative (got {value})")]
    InvalidDistance {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
        /// The rejected value.
        value: f64,
    },
    /// The matrix was not symmetric.
    #[error("distance matrix is not symmetric at ({row}, {col})")]
    AsymmetricMatrix {
        /// Row of the first asymmetric entry.
        row: usize,
        /// Column of the first asymmetric entry.
        col: usize,
    },
    /// A dendrogram and a distance matrix described different numbers of leaves.
    #[error("dendrogram has {leaves} leaves but the distance matrix has {items} items")]
    DimensionMismatch {
        /// Leaf count of the dendrogram.
        leaves: usize,
        /// Dimension of the distance matrix.
        items: usize,
    },
    /// Merge records did not describe a binary tree in node-id order.
    #[error("merge record for node {node} is malformed: {reason}")]
    MalformedDendrogram {
        /// Node id of the offending record.
        node: usize,
        /// Human-readable description of the violation.
        reason: &'static str,
    },
}

define_error_codes! {
    /// Stable codes describing [`ClusterError`] variants.
    enum ClusterErrorCode for ClusterError {
        /// The distance matrix contained no rows.
        EmptyMatrix => EmptyMatrix => "DENDRO_EMPTY_MATRIX",
        /// A row of the distance matrix did not match the number of rows.
        NonSquareMatrix => NonSquareMatrix { .. } => "DENDRO_NON_SQUARE_MATRIX",
        /// The number of names differs from the matrix dimension.
        NameLengthMismatch => NameLengthMismatch { .. } => "DENDRO_NAME_LENGTH_MISMATCH",
        /// The requested linkage method is not recognised.
        UnknownMethod => UnknownMethod { .. } => "DENDRO_UNKNOWN_METHOD",
        /// A matrix entry was negative, NaN or infinite.
        InvalidDistance => InvalidDistance { .. } => "DENDRO_INVALID_DISTANCE",
        /// The matrix was not symmetric.
        AsymmetricMatrix => AsymmetricMatrix { .. } => "DENDRO_ASYMMETRIC_MATRIX",
        /// A dendrogram and a distance matrix described different numbers of leaves.
        DimensionMismatch => DimensionMismatch { .. } => "DENDRO_DIMENSION_MISMATCH",
        /// Merge records did not describe a binary tree in node-id order.
        MalformedDendrogram => MalformedDendrogram { .. } => "DENDRO_MALFORMED_DENDROGRAM",
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, ClusterError>;
