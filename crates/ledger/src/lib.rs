//! Claim ledger for Merkle-committed airdrops
//!
//! A [`ClaimLedger`] holds the trusted root of an allocation list and pays each
//! allocation out exactly once:
//! - A claim must carry a valid proof and be signed by the recipient itself
//! - The claimed bit is set before the token transfer and rolled back if it fails
//! - After the deadline anyone may sweep the unclaimed balance to the owner

pub mod auth;
mod bitmap;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod ledger;
pub mod token;

pub use auth::{
    Signature, SigningKey, claim_message, parse_signature, recover_claimant, sign_claim,
    signature_to_hex, signer_address,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LedgerConfig, SECONDS_PER_DAY};
pub use error::{LedgerError, Result, TransferError};
pub use event::{ClaimReceipt, LedgerEvent};
pub use ledger::{ClaimLedger, LedgerStatus};
pub use token::{InMemoryToken, TokenAccount, TokenLedger};
