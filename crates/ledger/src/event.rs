//! Ledger events and receipts

use airdrop_merkle::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Result of a successful claim
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    /// Claimed record index
    pub index: u64,
    /// Recipient
    pub account: Address,
    /// Transferred amount
    pub amount: Amount,
}

/// Event emitted by a state change
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum LedgerEvent {
    /// An allocation was claimed
    Claimed {
        /// Claimed record index
        index: u64,
        /// Recipient
        account: Address,
        /// Transferred amount
        amount: Amount,
    },
    /// Remaining balance was swept to the owner
    Swept {
        /// Sweep recipient
        owner: Address,
        /// Swept amount
        amount: Amount,
    },
}

impl From<&ClaimReceipt> for LedgerEvent {
    fn from(receipt: &ClaimReceipt) -> Self {
        Self::Claimed {
            index: receipt.index,
            account: receipt.account,
            amount: receipt.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let receipt = ClaimReceipt {
            index: 3,
            account: Address::repeat_byte(0xa1),
            amount: Amount::from(10u64),
        };
        let event = LedgerEvent::from(&receipt);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "claimed");
        assert_eq!(json["index"], 3);

        let decoded: LedgerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, event);

        let swept = LedgerEvent::Swept {
            owner: Address::repeat_byte(0x0f),
            amount: Amount::ZERO,
        };
        assert_eq!(serde_json::to_value(&swept).unwrap()["event"], "swept");
    }
}
