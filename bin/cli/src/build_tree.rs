use std::path::PathBuf;

use airdrop_merkle::{MerkleTree, RawAllocation, read_json, write_json};
use anyhow::{Context, Result};
use tracing::info;

#[derive(clap::Args, Debug)]
pub(crate) struct Args {
    /// JSON array of `{ "index"?, "address", "amount" }` entries
    #[arg(short, long, env = "AIRDROP_ALLOCATIONS")]
    input: PathBuf,

    /// Output file for the tree artifact
    #[arg(short, long, env = "AIRDROP_TREE", default_value = "merkle-tree.json")]
    tree_output: PathBuf,

    /// Output file for the per-recipient proofs
    #[arg(short, long, env = "AIRDROP_PROOFS", default_value = "proofs.json")]
    proofs_output: PathBuf,

    /// Print the tree structure
    #[arg(long)]
    render: bool,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    info!("Reading allocations from {:?}...", args.input);
    let entries: Vec<RawAllocation> = read_json(&args.input)
        .with_context(|| format!("Failed to read allocations from {}", args.input.display()))?;

    let records = entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| {
            entry
                .into_record(position)
                .with_context(|| format!("Invalid allocation entry {position}"))
        })
        .collect::<Result<Vec<_>>>()?;

    info!("Building Merkle tree over {} allocations...", records.len());
    let tree = MerkleTree::build(records).context("Failed to build Merkle tree")?;

    info!("Merkle root: {}", tree.root());
    info!("Total addresses: {}", tree.len());
    info!("Total amount: {}", tree.total_amount());

    write_json(&args.tree_output, &tree.to_artifact())
        .context("Failed to write tree artifact")?;
    info!("Tree saved to {:?}", args.tree_output);

    let proofs = tree.proof_artifacts()?;
    write_json(&args.proofs_output, &proofs).context("Failed to write proofs")?;
    info!("Proofs saved to {:?}", args.proofs_output);

    if args.render {
        println!("{tree}");
    }

    Ok(())
}
