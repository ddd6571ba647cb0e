//! Node configuration

use std::{env, path::PathBuf};

use airdrop_merkle::{Address, parse_address};
use anyhow::{Context, Result};

/// Node configuration
#[derive(Clone, Debug)]
pub(crate) struct Config {
    /// Tree artifact to serve
    pub(crate) tree_path: PathBuf,
    /// Recipient of the post-deadline sweep
    pub(crate) owner: Address,
    /// Length of the claim window in days
    pub(crate) duration_days: u64,
    /// RPC listen address
    pub(crate) rpc_addr: String,
}

impl Config {
    /// Load from environment variables
    pub(crate) fn from_env() -> Result<Self> {
        let owner = env::var("OWNER_ADDRESS").context("OWNER_ADDRESS must be set")?;

        Ok(Self {
            tree_path: env::var("TREE_PATH")
                .unwrap_or_else(|_| "merkle-tree.json".to_string())
                .into(),
            owner: parse_address(&owner).context("Invalid OWNER_ADDRESS")?,
            duration_days: env::var("DURATION_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            rpc_addr: env::var("RPC_ADDR").unwrap_or_else(|_| "0.0.0.0:8547".to_string()),
        })
    }
}
