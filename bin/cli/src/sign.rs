use std::path::PathBuf;

use airdrop_ledger::{SigningKey, sign_claim, signature_to_hex, signer_address};
use airdrop_merkle::parse_digest;
use anyhow::{Context, Result, bail};
use serde_json::json;
use tracing::info;

use crate::prove::load_tree;

#[derive(clap::Args, Debug)]
pub(crate) struct Args {
    /// Tree artifact written by `build-tree`
    #[arg(short, long, env = "AIRDROP_TREE", default_value = "merkle-tree.json")]
    tree: PathBuf,

    /// Allocation index to claim
    #[arg(short, long)]
    index: u64,

    /// Recipient's secp256k1 private key (32 bytes hex)
    #[arg(long, env = "AIRDROP_PRIVATE_KEY", hide_env_values = true)]
    private_key: String,
}

/// Print the `airdrop_claim` request body for one record, signed by its recipient
pub(crate) fn run(args: &Args) -> Result<()> {
    let tree = load_tree(&args.tree)?;

    let position = tree
        .position_of(args.index)
        .with_context(|| format!("Index {} is not part of the tree", args.index))?;
    let payload = tree.proof_artifact(position)?;

    let secret = parse_digest(&args.private_key).context("Invalid private key")?;
    let key = SigningKey::from_slice(secret.as_slice()).context("Invalid private key")?;
    let signer = signer_address(&key);
    if signer != payload.address {
        bail!(
            "Key for {} cannot claim index {} of {}",
            signer,
            args.index,
            payload.address
        );
    }

    let signature = sign_claim(&tree.root(), &payload.record(), &key)?;
    info!("Signed claim for index {} as {}", args.index, signer);

    let request = json!({
        "index": payload.index,
        "address": payload.address,
        "amount": payload.amount.to_string(),
        "proof": payload.proof.to_hex(),
        "signature": signature_to_hex(&signature),
    });
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}
