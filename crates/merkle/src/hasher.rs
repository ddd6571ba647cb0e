//! Keccak256 hasher for leaves and internal nodes

use tiny_keccak::{Hasher, Keccak};

use crate::types::Hash;

/// Keccak256 hasher
#[derive(Debug, Clone, Copy)]
pub struct Keccak256Hasher;

impl Keccak256Hasher {
    /// Hash a single value
    pub fn hash(data: &[u8]) -> Hash {
        let mut hasher = Keccak::v256();
        hasher.update(data);
        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        Hash::from(output)
    }

    /// Hash two nodes together, smaller digest first.
    ///
    /// Both the tree builder and the verifier combine nodes through this function, so a proof
    /// never needs to carry left/right position bits.
    pub fn hash_sorted_pair(a: &Hash, b: &Hash) -> Hash {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let mut hasher = Keccak::v256();
        hasher.update(low.as_slice());
        hasher.update(high.as_slice());
        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        Hash::from(output)
    }

    /// Hash an encoded allocation record into a leaf: `keccak256(keccak256(encoded))`.
    ///
    /// Internal nodes are a single hash over 64 bytes; the second round keeps a 64-byte
    /// node pre-image from ever being accepted as a leaf.
    pub fn hash_leaf(encoded: &[u8]) -> Hash {
        let inner = Self::hash(encoded);
        Self::hash(inner.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EMPTY_HASH;

    #[test]
    fn test_hash_empty() {
        assert_eq!(Keccak256Hasher::hash(&[]), EMPTY_HASH);
    }

    #[test]
    fn test_hash_sorted_pair_is_symmetric() {
        let left = Hash::from([1u8; 32]);
        let right = Hash::from([2u8; 32]);
        let hash = Keccak256Hasher::hash_sorted_pair(&left, &right);
        assert_eq!(hash, Keccak256Hasher::hash_sorted_pair(&right, &left));

        let mut concat = [0u8; 64];
        concat[..32].copy_from_slice(left.as_slice());
        concat[32..].copy_from_slice(right.as_slice());
        assert_eq!(hash, Keccak256Hasher::hash(&concat));
    }

    #[test]
    fn test_hash_leaf_is_double_hash() {
        let data = b"allocation";
        let once = Keccak256Hasher::hash(data);
        assert_eq!(
            Keccak256Hasher::hash_leaf(data),
            Keccak256Hasher::hash(once.as_slice())
        );
        assert_ne!(Keccak256Hasher::hash_leaf(data), once);
    }
}
