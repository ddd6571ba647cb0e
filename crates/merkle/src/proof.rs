//! Proof verification

use serde::{Deserialize, Serialize};

use crate::{
    error::{MerkleError, Result},
    hasher::Keccak256Hasher,
    types::Hash,
};

/// Inclusion proof: sibling digests from leaf to root.
///
/// Nodes are combined with sorted-pair hashing, so the proof is a flat digest list
/// with no left/right markers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerkleProof {
    siblings: Vec<Hash>,
}

impl MerkleProof {
    /// Create a proof from sibling digests
    pub const fn new(siblings: Vec<Hash>) -> Self {
        Self { siblings }
    }

    /// Decode a proof from hex digests as submitted by a claimant
    pub fn from_hex<S: AsRef<str>>(digests: &[S]) -> Result<Self> {
        digests
            .iter()
            .map(|digest| parse_digest(digest.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(Self::new)
    }

    /// Sibling digests, leaf level first
    pub fn siblings(&self) -> &[Hash] {
        &self.siblings
    }

    /// Number of siblings
    pub fn len(&self) -> usize {
        self.siblings.len()
    }

    /// Whether the proof is empty (single-leaf tree)
    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }

    /// Compute the root implied by this proof for `leaf`
    pub fn compute_root(&self, leaf: &Hash) -> Hash {
        process_proof(leaf, &self.siblings)
    }

    /// Verify this proof against a trusted root
    pub fn verify(&self, leaf: &Hash, root: &Hash) -> bool {
        verify(leaf, &self.siblings, root)
    }

    /// Hex digests in wire order
    pub fn to_hex(&self) -> Vec<String> {
        self.siblings.iter().map(ToString::to_string).collect()
    }
}

impl From<Vec<Hash>> for MerkleProof {
    fn from(siblings: Vec<Hash>) -> Self {
        Self::new(siblings)
    }
}

impl AsRef<[Hash]> for MerkleProof {
    fn as_ref(&self) -> &[Hash] {
        &self.siblings
    }
}

/// Fold `proof` over `leaf` with sorted-pair hashing
pub fn process_proof(leaf: &Hash, proof: &[Hash]) -> Hash {
    proof.iter().fold(*leaf, |current, sibling| {
        Keccak256Hasher::hash_sorted_pair(&current, sibling)
    })
}

/// Check that `proof` links `leaf` to `root`
pub fn verify(leaf: &Hash, proof: &[Hash], root: &Hash) -> bool {
    process_proof(leaf, proof) == *root
}

/// Parse a single 32-byte hex digest, with or without `0x` prefix
pub fn parse_digest(digest: &str) -> Result<Hash> {
    let trimmed = digest.trim();
    let cleaned = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(cleaned)
        .map_err(|e| MerkleError::MalformedDigest(format!("{trimmed:?}: {e}")))?;
    let bytes: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
        MerkleError::MalformedDigest(format!(
            "{trimmed:?}: expected 32 bytes, got {}",
            bytes.len()
        ))
    })?;
    Ok(Hash::from(bytes))
}
