use std::path::{Path, PathBuf};

use airdrop_merkle::{MerkleTree, TreeArtifact, read_json, write_json};
use anyhow::{Context, Result};
use tracing::info;

#[derive(clap::Args, Debug)]
pub(crate) struct Args {
    /// Tree artifact written by `build-tree`
    #[arg(short, long, env = "AIRDROP_TREE", default_value = "merkle-tree.json")]
    tree: PathBuf,

    /// Allocation index to prove
    #[arg(short, long)]
    index: u64,

    /// Write the payload to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Load a tree artifact and rebuild the tree, checking its root
pub(crate) fn load_tree(path: &Path) -> Result<MerkleTree> {
    let artifact: TreeArtifact = read_json(path)
        .with_context(|| format!("Failed to read tree artifact {}", path.display()))?;
    let tree = MerkleTree::from_artifact(&artifact).context("Tree artifact is inconsistent")?;
    info!("Loaded tree: root={}, leaves={}", tree.root(), tree.len());
    Ok(tree)
}

pub(crate) fn run(args: &Args) -> Result<()> {
    let tree = load_tree(&args.tree)?;

    let position = tree
        .position_of(args.index)
        .with_context(|| format!("Index {} is not part of the tree", args.index))?;
    let payload = tree.proof_artifact(position)?;

    match &args.output {
        Some(path) => {
            write_json(path, &payload).context("Failed to write proof")?;
            info!("Proof for index {} saved to {:?}", args.index, path);
        }
        None => println!("{}", serde_json::to_string_pretty(&payload)?),
    }

    Ok(())
}
