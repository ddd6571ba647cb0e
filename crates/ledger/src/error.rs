//! Ledger and token error types

use airdrop_merkle::{Address, Amount};
use thiserror::Error;

/// Result alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Token transfer error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Sender holds less than the transfer amount
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount requested
        required: Amount,
        /// Amount held by the sender
        available: Amount,
    },
    /// Token refused the transfer for another reason
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// Claim ledger error types.
///
/// Every variant rejects a single call and leaves the ledger unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Proof does not link the claimed record to the root
    #[error("invalid proof for index {0}")]
    InvalidProof(u64),
    /// Index was claimed before
    #[error("index {0} already claimed")]
    AlreadyClaimed(u64),
    /// Caller is not the recipient named in the record
    #[error("caller {caller} is not the recipient {account}")]
    NotAuthorized {
        /// Caller identity
        caller: Address,
        /// Recipient of the record
        account: Address,
    },
    /// Claim signature is malformed or cannot be recovered
    #[error("invalid claim signature: {0}")]
    InvalidSignature(String),
    /// Index lies outside the committed index range
    #[error("index {index} out of range (max {max_index})")]
    IndexOutOfRange {
        /// Requested index
        index: u64,
        /// Largest committed index
        max_index: u64,
    },
    /// Withdrawal attempted before the deadline
    #[error("airdrop still active until {deadline} (now {now})")]
    AirdropActive {
        /// Claim deadline
        deadline: u64,
        /// Current time
        now: u64,
    },
    /// Claim attempted at or after the deadline
    #[error("airdrop ended at {deadline} (now {now})")]
    AirdropEnded {
        /// Claim deadline
        deadline: u64,
        /// Current time
        now: u64,
    },
    /// Token transfer failed; the claim was rolled back
    #[error("token transfer failed: {0}")]
    TransferFailed(#[from] TransferError),
}

impl LedgerError {
    /// Stable name of the failure kind, for clients that branch on it
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidProof(_) => "InvalidProof",
            Self::AlreadyClaimed(_) => "AlreadyClaimed",
            Self::NotAuthorized { .. } | Self::InvalidSignature(_) => "NotAuthorized",
            Self::IndexOutOfRange { .. } => "IndexOutOfRange",
            Self::AirdropActive { .. } => "AirdropActive",
            Self::AirdropEnded { .. } => "AirdropEnded",
            Self::TransferFailed(_) => "TransferFailed",
        }
    }
}
