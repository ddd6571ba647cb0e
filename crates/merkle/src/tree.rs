//! Merkle tree construction and proof generation

use std::{collections::HashMap, fmt};

use tracing::debug;

use crate::{
    artifact::{ProofArtifact, TREE_FORMAT, TreeArtifact},
    error::{MerkleError, Result},
    hasher::Keccak256Hasher,
    leaf::{AllocationRecord, LEAF_ENCODING},
    proof::MerkleProof,
    types::{Address, Amount, Hash},
};

/// Sorted-pair Merkle tree over allocation records.
///
/// Layer 0 holds the leaves in input order. Each following layer pairs adjacent nodes;
/// the last node of an odd layer is paired with itself.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    /// Records in input order
    records: Vec<AllocationRecord>,
    /// All layers, leaves first, root last
    layers: Vec<Vec<Hash>>,
    /// Record index -> leaf position
    positions: HashMap<u64, usize>,
    /// Sum of all allocated amounts
    total_amount: Amount,
    /// Root hash
    root: Hash,
}

impl MerkleTree {
    /// Build the tree from allocation records.
    ///
    /// Fails on an empty list, on duplicate indices and when the total allocation overflows.
    pub fn build(records: Vec<AllocationRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(MerkleError::EmptyAllocation);
        }

        let mut positions = HashMap::with_capacity(records.len());
        let mut total_amount = Amount::ZERO;
        for (position, record) in records.iter().enumerate() {
            if positions.insert(record.index, position).is_some() {
                return Err(MerkleError::DuplicateIndex(record.index));
            }
            total_amount = total_amount.checked_add(record.amount).ok_or_else(|| {
                MerkleError::MalformedRecord(format!(
                    "total allocation overflows u256 at index {}",
                    record.index
                ))
            })?;
        }

        let leaves: Vec<Hash> = records.iter().map(AllocationRecord::leaf_hash).collect();
        let layers = Self::build_layers(leaves);
        let root = layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or_default();

        debug!(
            leaves = records.len(),
            depth = layers.len() - 1,
            %root,
            "Built merkle tree"
        );

        Ok(Self {
            records,
            layers,
            positions,
            total_amount,
            root,
        })
    }

    fn build_layers(leaves: Vec<Hash>) -> Vec<Vec<Hash>> {
        let mut layers = vec![leaves];

        loop {
            let level = &layers[layers.len() - 1];
            if level.len() <= 1 {
                break;
            }

            let next_level: Vec<Hash> = level
                .chunks(2)
                .map(|pair| {
                    let left = &pair[0];
                    let right = pair.get(1).unwrap_or(left);
                    Keccak256Hasher::hash_sorted_pair(left, right)
                })
                .collect();

            layers.push(next_level);
        }

        layers
    }

    /// Get the root hash
    pub const fn root(&self) -> Hash {
        self.root
    }

    /// Number of leaves
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false: a tree holds at least one leaf
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of proof siblings per leaf
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Records in input order
    pub fn records(&self) -> &[AllocationRecord] {
        &self.records
    }

    /// Leaf digests in input order
    pub fn leaves(&self) -> &[Hash] {
        &self.layers[0]
    }

    /// Sum of all allocations, i.e. the amount a ledger must be funded with
    pub const fn total_amount(&self) -> Amount {
        self.total_amount
    }

    /// Largest record index
    pub fn max_index(&self) -> u64 {
        self.records
            .iter()
            .map(|record| record.index)
            .max()
            .unwrap_or_default()
    }

    /// Leaf position of a record index
    pub fn position_of(&self, index: u64) -> Option<usize> {
        self.positions.get(&index).copied()
    }

    /// First record allocated to `address`, with its position
    pub fn find_by_address(&self, address: &Address) -> Option<(usize, &AllocationRecord)> {
        self.records
            .iter()
            .enumerate()
            .find(|(_, record)| record.address == *address)
    }

    /// Sibling path for the leaf at `position`
    pub fn proof(&self, position: usize) -> Result<MerkleProof> {
        if position >= self.len() {
            return Err(MerkleError::IndexOutOfRange {
                index: position as u64,
                len: self.len(),
            });
        }

        let mut siblings = Vec::with_capacity(self.depth());
        let mut current = position;

        for level in &self.layers[..self.depth()] {
            let sibling = if current.is_multiple_of(2) {
                level.get(current + 1).unwrap_or(&level[current])
            } else {
                &level[current - 1]
            };
            siblings.push(*sibling);
            current /= 2;
        }

        Ok(MerkleProof::new(siblings))
    }

    /// Sibling path for the record with allocation index `index`
    pub fn proof_for_index(&self, index: u64) -> Result<MerkleProof> {
        let position = self
            .position_of(index)
            .ok_or(MerkleError::IndexOutOfRange {
                index,
                len: self.len(),
            })?;
        self.proof(position)
    }

    /// Verify `proof` for the leaf at `position` against this tree's root
    pub fn verify_position(&self, position: usize, proof: &MerkleProof) -> bool {
        self.leaves()
            .get(position)
            .is_some_and(|leaf| proof.verify(leaf, &self.root))
    }

    /// Claim payload for the leaf at `position`
    pub fn proof_artifact(&self, position: usize) -> Result<ProofArtifact> {
        let proof = self.proof(position)?;
        let record = &self.records[position];
        Ok(ProofArtifact {
            index: record.index,
            address: record.address,
            amount: record.amount,
            proof,
        })
    }

    /// Claim payloads for every leaf, in tree order
    pub fn proof_artifacts(&self) -> Result<Vec<ProofArtifact>> {
        (0..self.len())
            .map(|position| self.proof_artifact(position))
            .collect()
    }

    /// Persistable form of this tree
    pub fn to_artifact(&self) -> TreeArtifact {
        TreeArtifact {
            format: TREE_FORMAT.to_string(),
            leaf_encoding: LEAF_ENCODING.iter().map(ToString::to_string).collect(),
            root: self.root,
            total_amount: self.total_amount,
            leaves: self.records.clone(),
        }
    }

    /// Rebuild a tree from its artifact, checking the declared root
    pub fn from_artifact(artifact: &TreeArtifact) -> Result<Self> {
        if artifact.format != TREE_FORMAT {
            return Err(MerkleError::UnsupportedFormat(artifact.format.clone()));
        }
        if artifact.leaf_encoding.iter().map(String::as_str).ne(LEAF_ENCODING) {
            return Err(MerkleError::UnsupportedFormat(format!(
                "leaf encoding {:?}",
                artifact.leaf_encoding
            )));
        }

        let tree = Self::build(artifact.leaves.clone())?;
        if tree.root != artifact.root {
            return Err(MerkleError::RootMismatch {
                declared: artifact.root,
                computed: tree.root,
            });
        }
        Ok(tree)
    }
}

impl fmt::Display for MerkleTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, level) in self.layers.iter().rev().enumerate() {
            let label = if depth == 0 { " (root)" } else { "" };
            writeln!(f, "layer {}{label}", self.layers.len() - 1 - depth)?;
            for (position, node) in level.iter().enumerate() {
                writeln!(f, "  [{position}] {node}")?;
            }
        }
        for (position, record) in self.records.iter().enumerate() {
            writeln!(f, "leaf {position}: {record}")?;
        }
        Ok(())
    }
}
