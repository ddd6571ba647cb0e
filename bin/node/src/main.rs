//! Airdrop claim node
//!
//! A minimal node that:
//! - Loads a tree artifact and funds a claim ledger with its total allocation
//! - Serves claims, claimed-bit queries and the post-deadline sweep over JSON-RPC

use std::sync::Arc;

use airdrop_ledger::SystemClock;
use airdrop_merkle::{MerkleTree, TreeArtifact, read_json};
use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post},
};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod config;
mod rpc;

use config::Config;
use rpc::{NodeState, health, rpc_handler};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting airdrop claim node...");

    let config = Config::from_env()?;
    info!("  Tree:     {}", config.tree_path.display());
    info!("  Owner:    {}", config.owner);
    info!("  Duration: {} days", config.duration_days);

    let artifact: TreeArtifact = read_json(&config.tree_path).with_context(|| {
        format!(
            "Failed to read tree artifact {}",
            config.tree_path.display()
        )
    })?;
    let tree = MerkleTree::from_artifact(&artifact).context("Tree artifact is inconsistent")?;

    let state = Arc::new(NodeState::new(
        &tree,
        config.owner,
        Arc::new(SystemClock),
        config.duration_days,
    )?);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/", post(rpc_handler))
        .with_state(state);

    info!("RPC server listening on {}", config.rpc_addr);
    let listener = tokio::net::TcpListener::bind(&config.rpc_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
