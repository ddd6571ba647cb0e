//! Persisted tree and proof artifacts

use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    error::Result,
    leaf::{AllocationRecord, decimal_amount},
    proof::MerkleProof,
    types::{Address, Amount, Hash},
};

/// Format tag of [`TreeArtifact`]
pub const TREE_FORMAT: &str = "airdrop-merkle-v1";

/// Everything needed to regenerate proofs offline
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeArtifact {
    /// Artifact format tag
    pub format: String,
    /// Leaf field types, in encoding order
    pub leaf_encoding: Vec<String>,
    /// Merkle root
    pub root: Hash,
    /// Sum of all allocations
    #[serde(with = "decimal_amount")]
    pub total_amount: Amount,
    /// Records in tree order
    pub leaves: Vec<AllocationRecord>,
}

/// Claim payload handed to one recipient
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofArtifact {
    /// Record index
    pub index: u64,
    /// Recipient address
    pub address: Address,
    /// Allocated amount
    #[serde(with = "decimal_amount")]
    pub amount: Amount,
    /// Sibling digests, leaf level first
    pub proof: MerkleProof,
}

impl ProofArtifact {
    /// The allocation record this payload claims
    pub const fn record(&self) -> AllocationRecord {
        AllocationRecord::new(self.index, self.address, self.amount)
    }

    /// Verify the payload against a trusted root
    pub fn verify(&self, root: &Hash) -> bool {
        self.proof.verify(&self.record().leaf_hash(), root)
    }
}

/// Read a JSON artifact
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let file = File::open(path.as_ref())?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Write a JSON artifact atomically (temp file + rename)
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    let tmp = temp_path(path);
    let bytes = serde_json::to_vec_pretty(value)?;
    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MerkleTree;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "airdrop-merkle-{name}-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn tree() -> MerkleTree {
        MerkleTree::build(vec![
            AllocationRecord::new(0, Address::repeat_byte(0xa1), Amount::from(10u64)),
            AllocationRecord::new(1, Address::repeat_byte(0xb2), Amount::from(20u64)),
            AllocationRecord::new(2, Address::repeat_byte(0xc3), Amount::from(30u64)),
        ])
        .unwrap()
    }

    #[test]
    fn test_tree_artifact_json_shape() {
        let json = serde_json::to_value(tree().to_artifact()).unwrap();
        assert_eq!(json["format"], TREE_FORMAT);
        assert_eq!(
            json["leafEncoding"],
            serde_json::json!(["uint256", "address", "uint256"])
        );
        assert_eq!(json["totalAmount"], "60");
        assert_eq!(json["leaves"][1]["amount"], "20");
        assert!(json["root"].as_str().unwrap().starts_with("0x"));
    }

    #[test]
    fn test_write_and_read_tree() {
        let dir = scratch_dir("tree");
        let path = dir.join("tree.json");
        let tree = tree();

        write_json(&path, &tree.to_artifact()).unwrap();
        assert!(!temp_path(&path).exists());

        let artifact: TreeArtifact = read_json(&path).unwrap();
        assert_eq!(
            MerkleTree::from_artifact(&artifact).unwrap().root(),
            tree.root()
        );
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_proof_artifacts_verify() {
        let tree = tree();
        let proofs = tree.proof_artifacts().unwrap();
        assert_eq!(proofs.len(), 3);

        for (position, artifact) in proofs.iter().enumerate() {
            assert_eq!(artifact.proof, tree.proof(position).unwrap());
            assert!(artifact.verify(&tree.root()));
        }

        let json = serde_json::to_string(&proofs[0]).unwrap();
        let back: ProofArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, proofs[0]);
    }

    #[test]
    fn test_proof_artifact_rejects_other_amount() {
        let tree = tree();
        let mut artifact = tree.proof_artifact(0).unwrap();
        artifact.amount = Amount::from(11u64);
        assert!(!artifact.verify(&tree.root()));
    }

    #[test]
    fn test_read_missing_file() {
        let result: Result<TreeArtifact> = read_json("/nonexistent/airdrop/tree.json");
        assert!(matches!(result, Err(crate::MerkleError::Io(_))));
    }
}
