//! Errors raised while building trees, decoding records and handling artifacts

use thiserror::Error;

use crate::types::Hash;

/// Result alias for this crate
pub type Result<T> = std::result::Result<T, MerkleError>;

/// Merkle tree error types
#[derive(Debug, Error)]
pub enum MerkleError {
    /// A record field does not fit its fixed-width encoding
    #[error("malformed allocation record: {0}")]
    MalformedRecord(String),
    /// Two records share the same allocation index
    #[error("duplicate allocation index {0}")]
    DuplicateIndex(u64),
    /// Position or allocation index is not part of the tree
    #[error("index {index} out of range for tree with {len} leaves")]
    IndexOutOfRange {
        /// Requested index
        index: u64,
        /// Number of leaves in the tree
        len: usize,
    },
    /// Tree construction was given no records
    #[error("allocation list is empty")]
    EmptyAllocation,
    /// A proof digest is not 32 bytes of hex
    #[error("malformed digest: {0}")]
    MalformedDigest(String),
    /// Leaves of a tree artifact do not hash to its declared root
    #[error("root mismatch: artifact declares {declared}, leaves hash to {computed}")]
    RootMismatch {
        /// Root stored in the artifact
        declared: Hash,
        /// Root recomputed from the artifact's leaves
        computed: Hash,
    },
    /// Artifact format or leaf encoding tag is not understood
    #[error("unsupported artifact format: {0}")]
    UnsupportedFormat(String),
    /// Filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON (de)serialization error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
