use std::path::PathBuf;

use airdrop_merkle::{ProofArtifact, parse_address, read_json};
use anyhow::{Context, Result, bail};
use tracing::info;

use crate::prove::load_tree;

#[derive(clap::Args, Debug)]
pub(crate) struct Args {
    /// Tree artifact written by `build-tree`
    #[arg(short, long, env = "AIRDROP_TREE", default_value = "merkle-tree.json")]
    tree: PathBuf,

    /// Recipient address to look up and prove
    #[arg(short, long, required_unless_present = "proof", conflicts_with = "proof")]
    address: Option<String>,

    /// Claim payload file to check against the tree root
    #[arg(short, long)]
    proof: Option<PathBuf>,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    let tree = load_tree(&args.tree)?;

    if let Some(path) = &args.proof {
        let payload: ProofArtifact = read_json(path)
            .with_context(|| format!("Failed to read proof {}", path.display()))?;
        if !payload.verify(&tree.root()) {
            bail!(
                "Proof for index {} does not match root {}",
                payload.index,
                tree.root()
            );
        }
        info!(
            "Verified: index={}, address={}, amount={}",
            payload.index, payload.address, payload.amount
        );
        return Ok(());
    }

    let Some(address) = &args.address else {
        bail!("Either --address or --proof is required");
    };
    let address = parse_address(address)?;

    let Some((position, record)) = tree.find_by_address(&address) else {
        bail!("Address {address} is not in the allocation list");
    };
    let proof = tree.proof(position)?;
    let verified = tree.verify_position(position, &proof);

    info!(
        "Address found: index={}, amount={}",
        record.index, record.amount
    );
    info!("Proof: {:?}", proof.to_hex());
    info!("Verified: {}", verified);

    if !verified {
        bail!("Proof for {address} failed verification");
    }
    Ok(())
}
