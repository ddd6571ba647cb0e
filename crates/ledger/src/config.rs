//! Ledger configuration

use airdrop_merkle::{Address, Hash, MerkleTree};
use serde::{Deserialize, Serialize};

/// Seconds in one day
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Parameters fixed when a ledger is created
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerConfig {
    /// Trusted Merkle root
    pub root: Hash,
    /// Recipient of the post-deadline sweep
    pub owner: Address,
    /// Unix timestamp at which claims stop and withdrawal opens
    pub deadline: u64,
    /// Largest committed record index
    pub max_index: u64,
}

impl LedgerConfig {
    /// Config for `tree` with a claim window of `duration_days` starting at `now`
    pub fn for_tree(tree: &MerkleTree, owner: Address, now: u64, duration_days: u64) -> Self {
        Self {
            root: tree.root(),
            owner,
            deadline: now.saturating_add(duration_days.saturating_mul(SECONDS_PER_DAY)),
            max_index: tree.max_index(),
        }
    }
}
