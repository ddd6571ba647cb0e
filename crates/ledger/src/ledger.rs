//! Claim ledger state machine

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError, TryLockError},
};

use airdrop_merkle::{Address, AllocationRecord, Amount, Hash, ProofArtifact, verify};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    auth::{Signature, recover_claimant},
    bitmap::ClaimBitmap,
    clock::Clock,
    config::LedgerConfig,
    error::{LedgerError, Result},
    event::{ClaimReceipt, LedgerEvent},
    token::TokenLedger,
};

/// Ledger lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerStatus {
    /// Before the deadline: claims accepted
    Active,
    /// Deadline passed: withdrawal open
    Expired,
    /// Airdrop closed by a withdraw
    Swept,
}

#[derive(Debug, Default)]
struct LedgerState {
    total_claimed: Amount,
    events: Vec<LedgerEvent>,
    swept: bool,
}

/// Claim ledger for one committed allocation list.
///
/// Holds the trusted root, one claimed bit per index and a token handle funded with the
/// allocation total. All methods take `&self`; share the ledger behind an `Arc`.
pub struct ClaimLedger {
    config: LedgerConfig,
    claimed: ClaimBitmap,
    token: Arc<dyn TokenLedger>,
    clock: Arc<dyn Clock>,
    state: Mutex<LedgerState>,
    sweep: Mutex<()>,
}

impl ClaimLedger {
    /// Create a ledger; the config is fixed for its lifetime
    pub fn new(config: LedgerConfig, token: Arc<dyn TokenLedger>, clock: Arc<dyn Clock>) -> Self {
        info!(
            "Created claim ledger: root={}, owner={}, deadline={}, max_index={}",
            config.root, config.owner, config.deadline, config.max_index
        );

        Self {
            claimed: ClaimBitmap::new(config.max_index),
            config,
            token,
            clock,
            state: Mutex::new(LedgerState::default()),
            sweep: Mutex::new(()),
        }
    }

    /// Claim the allocation `(index, account, amount)` on behalf of `caller`.
    ///
    /// Checks, in order: claim window, proof, index range, claimed bit, caller. The bit is
    /// set before the token transfer and cleared again if the transfer fails.
    pub fn claim(
        &self,
        index: u64,
        account: Address,
        amount: Amount,
        proof: &[Hash],
        caller: Address,
    ) -> Result<ClaimReceipt> {
        self.claim_as(index, account, amount, proof, Ok(caller))
    }

    /// Claim with the caller recovered from a signature over the claim message.
    ///
    /// An unrecoverable signature is reported where a wrong caller would be.
    pub fn claim_signed(
        &self,
        index: u64,
        account: Address,
        amount: Amount,
        proof: &[Hash],
        signature: &Signature,
    ) -> Result<ClaimReceipt> {
        let record = AllocationRecord::new(index, account, amount);
        let caller = recover_claimant(&self.config.root, &record, signature);
        self.claim_as(index, account, amount, proof, caller)
    }

    fn claim_as(
        &self,
        index: u64,
        account: Address,
        amount: Amount,
        proof: &[Hash],
        caller: Result<Address>,
    ) -> Result<ClaimReceipt> {
        let now = self.clock.now();
        if now >= self.config.deadline {
            return Err(LedgerError::AirdropEnded {
                deadline: self.config.deadline,
                now,
            });
        }

        let leaf = AllocationRecord::new(index, account, amount).leaf_hash();
        if !verify(&leaf, proof, &self.config.root) {
            debug!("Rejected claim {}: invalid proof", index);
            return Err(LedgerError::InvalidProof(index));
        }

        if self.is_claimed(index)? {
            return Err(LedgerError::AlreadyClaimed(index));
        }

        let caller = caller?;
        if caller != account {
            warn!(
                "Rejected claim {}: caller {} is not {}",
                index, caller, account
            );
            return Err(LedgerError::NotAuthorized { caller, account });
        }

        // Mark before transferring so a re-entrant claim sees the bit
        if self.claimed.try_set(index) != Some(true) {
            return Err(LedgerError::AlreadyClaimed(index));
        }

        if let Err(e) = self.token.transfer(account, amount) {
            self.claimed.clear(index);
            warn!("Claim {} rolled back: {}", index, e);
            return Err(e.into());
        }

        let receipt = ClaimReceipt {
            index,
            account,
            amount,
        };
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.total_claimed = state.total_claimed.saturating_add(amount);
            state.events.push(LedgerEvent::from(&receipt));
        }

        info!(
            "Claimed: index={}, account={}, amount={}",
            index, account, amount
        );
        Ok(receipt)
    }

    /// Claim using a distributed proof payload
    pub fn claim_artifact(
        &self,
        artifact: &ProofArtifact,
        caller: Address,
    ) -> Result<ClaimReceipt> {
        self.claim(
            artifact.index,
            artifact.address,
            artifact.amount,
            artifact.proof.siblings(),
            caller,
        )
    }

    /// Whether `index` has been claimed; indices outside the committed range are an error
    pub fn is_claimed(&self, index: u64) -> Result<bool> {
        self.claimed.get(index).ok_or(LedgerError::IndexOutOfRange {
            index,
            max_index: self.claimed.max_index(),
        })
    }

    /// Claimed flags for `indices`, in order; unknown indices read as `false`
    pub fn is_claimed_batch(&self, indices: &[u64]) -> Vec<bool> {
        indices
            .iter()
            .map(|&index| self.claimed.get(index).unwrap_or(false))
            .collect()
    }

    /// Sweep the remaining balance to the owner once the deadline has passed.
    ///
    /// Anyone may call this. Returns the swept amount, zero when nothing is left or when
    /// another sweep is already in flight. The first successful call moves the ledger to
    /// [`LedgerStatus::Swept`] and emits one `Swept` event, with amount zero when every
    /// allocation was claimed.
    pub fn withdraw(&self, caller: Address) -> Result<Amount> {
        let now = self.clock.now();
        if now < self.config.deadline {
            return Err(LedgerError::AirdropActive {
                deadline: self.config.deadline,
                now,
            });
        }

        let _guard = match self.sweep.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                debug!("Withdraw by {} skipped: sweep in progress", caller);
                return Ok(Amount::ZERO);
            }
        };

        let balance = self.token.balance();
        if !balance.is_zero() {
            self.token.transfer(self.config.owner, balance)?;
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if balance.is_zero() && state.swept {
            debug!("Withdraw by {}: nothing left to sweep", caller);
            return Ok(Amount::ZERO);
        }
        state.swept = true;
        state.events.push(LedgerEvent::Swept {
            owner: self.config.owner,
            amount: balance,
        });

        info!(
            "Swept {} to owner {} (requested by {})",
            balance, self.config.owner, caller
        );
        Ok(balance)
    }

    /// Current lifecycle state
    pub fn status(&self) -> LedgerStatus {
        if self.state.lock().unwrap_or_else(PoisonError::into_inner).swept {
            LedgerStatus::Swept
        } else if self.clock.now() >= self.config.deadline {
            LedgerStatus::Expired
        } else {
            LedgerStatus::Active
        }
    }

    /// Trusted root
    pub const fn root(&self) -> Hash {
        self.config.root
    }

    /// Sweep recipient
    pub const fn owner(&self) -> Address {
        self.config.owner
    }

    /// Claim deadline (unix seconds)
    pub const fn deadline(&self) -> u64 {
        self.config.deadline
    }

    /// Ledger configuration
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Sum of all successful claims
    pub fn total_claimed(&self) -> Amount {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .total_claimed
    }

    /// Token balance still held by the ledger
    pub fn balance(&self) -> Amount {
        self.token.balance()
    }

    /// Token balance of any account
    pub fn balance_of(&self, account: Address) -> Amount {
        self.token.balance_of(account)
    }

    /// Events emitted so far, oldest first
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .clone()
    }
}

impl fmt::Debug for ClaimLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimLedger")
            .field("config", &self.config)
            .field("holder", &self.token.holder())
            .finish_non_exhaustive()
    }
}
