//! Merkle commitment engine for token airdrops
//!
//! An allocation list of `(index, address, amount)` records is committed to a single
//! Keccak256 root. Each recipient later proves membership with a short sibling path.
//!
//! - Leaves are double hashed: `keccak256(keccak256(encode(record)))`
//! - Internal nodes use sorted-pair hashing, so proofs carry no position bits
//! - The last node of an odd layer is paired with itself

mod artifact;
mod error;
mod hasher;
mod leaf;
mod proof;
mod tree;
mod types;

pub use artifact::{ProofArtifact, TREE_FORMAT, TreeArtifact, read_json, write_json};
pub use error::{MerkleError, Result};
pub use hasher::Keccak256Hasher;
pub use leaf::{
    AllocationRecord, ENCODED_LEN, LEAF_ENCODING, RawAllocation, RawAmount, parse_address,
    parse_amount,
};
pub use proof::{MerkleProof, parse_digest, process_proof, verify};
pub use tree::MerkleTree;
pub use types::{Address, Amount, Hash};

/// Keccak256 of empty bytes
pub const EMPTY_HASH: Hash = Hash::new([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
]);

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Vec<AllocationRecord> {
        [
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC",
            "0x90F79bf6EB2c4f870365E733f8dF7B7a8C6E5A1f",
        ]
        .iter()
        .zip(0u64..)
        .map(|(address, index)| {
            let amount = (10 * (index + 1)).to_string();
            AllocationRecord::parse(index, address, &amount).unwrap()
        })
        .collect()
    }

    fn digest(hex: &str) -> Hash {
        parse_digest(hex).unwrap()
    }

    #[test]
    fn test_golden_leaves() {
        let leaves: Vec<Hash> = scenario()
            .iter()
            .map(AllocationRecord::leaf_hash)
            .collect();
        assert_eq!(
            leaves[0],
            digest("0x011db736b5f593fe08dedb65ea2b98e523279924a67afe8848836f609a64e626")
        );
        assert_eq!(
            leaves[1],
            digest("0x63eefde331046f6b733e0958847078e3052962c6fb863b67c0e296c1516f369d")
        );
        assert_eq!(
            leaves[2],
            digest("0xb14fa80a48bae00aad7d0d551e77a9887f9c4249ec2da691f59c81fc26daaeb9")
        );
    }

    #[test]
    fn test_golden_root_and_proofs() {
        let tree = MerkleTree::build(scenario()).unwrap();
        assert_eq!(
            tree.root(),
            digest("0x9bb40b97464aca4486d1db37e74973150ba42807d2591ec88733ff29b3dc2a07")
        );

        let proof = tree.proof(0).unwrap();
        assert_eq!(
            proof.to_hex(),
            vec![
                "0x63eefde331046f6b733e0958847078e3052962c6fb863b67c0e296c1516f369d".to_string(),
                "0xc6bd71b9467c0c0edcb59cec7d1b2f87d0eea5dfa756febc40fe9991886aafea".to_string(),
            ]
        );

        let proof = tree.proof(2).unwrap();
        assert_eq!(
            proof.to_hex(),
            vec![
                "0xb14fa80a48bae00aad7d0d551e77a9887f9c4249ec2da691f59c81fc26daaeb9".to_string(),
                "0xfef41a17d1275d3ec12f10fea2827b95039dad471853e6299f341fa5094681ac".to_string(),
            ]
        );
    }

    #[test]
    fn test_mismatched_proof_fails() {
        let tree = MerkleTree::build(scenario()).unwrap();
        let leaf = scenario()[0].leaf_hash();
        assert!(!verify(&leaf, tree.proof(1).unwrap().siblings(), &tree.root()));
        assert!(verify(&leaf, tree.proof(0).unwrap().siblings(), &tree.root()));
    }
}
