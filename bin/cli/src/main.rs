//! Airdrop operator tool
//!
//! - `build-tree`: commit an allocation list to a Merkle root, write tree and proof artifacts
//! - `prove`: print the claim payload for one record
//! - `verify`: check a record or a claim payload against a tree artifact
//! - `sign`: sign the claim for one record with the recipient's key

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod build_tree;
mod prove;
mod sign;
mod verify;

#[derive(Parser, Debug)]
#[command(name = "airdrop")]
#[command(about = "Merkle airdrop tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the Merkle tree and per-recipient proofs
    BuildTree(build_tree::Args),
    /// Print the claim payload for one allocation index
    Prove(prove::Args),
    /// Verify an address or a claim payload against a tree
    Verify(verify::Args),
    /// Sign the claim request for one allocation index
    Sign(sign::Args),
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::BuildTree(args) => build_tree::run(&args),
        Commands::Prove(args) => prove::run(&args),
        Commands::Verify(args) => verify::run(&args),
        Commands::Sign(args) => sign::run(&args),
    }
}
