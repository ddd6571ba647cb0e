//! Fungible token capability consumed by the ledger

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use airdrop_merkle::{Address, Amount};

use crate::error::TransferError;

/// Token account bound to one holder: the ledger's view of the token.
pub trait TokenLedger: Send + Sync {
    /// Address whose funds this handle moves
    fn holder(&self) -> Address;

    /// Transfer `amount` from the holder to `to`
    fn transfer(&self, to: Address, amount: Amount) -> Result<(), TransferError>;

    /// Balance of any account
    fn balance_of(&self, account: Address) -> Amount;

    /// Balance of the holder
    fn balance(&self) -> Amount {
        self.balance_of(self.holder())
    }
}

#[derive(Debug, Default)]
struct Balances {
    accounts: HashMap<Address, Amount>,
    total_supply: Amount,
}

/// Standard fungible token ledger kept in memory
#[derive(Debug, Default)]
pub struct InMemoryToken {
    balances: Mutex<Balances>,
}

impl InMemoryToken {
    /// Create a token with no supply
    pub fn new() -> Self {
        Self::default()
    }

    /// Create new tokens for `to`
    pub fn mint(&self, to: Address, amount: Amount) -> Result<(), TransferError> {
        let mut balances = self.balances.lock().unwrap_or_else(PoisonError::into_inner);
        let total_supply = balances
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("total supply overflow".to_string()))?;
        balances.total_supply = total_supply;
        *balances.accounts.entry(to).or_default() += amount;
        Ok(())
    }

    /// Move `amount` from `from` to `to`; all-or-nothing
    pub fn transfer_from(
        &self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let mut balances = self.balances.lock().unwrap_or_else(PoisonError::into_inner);

        // Check balance
        let available = balances.accounts.get(&from).copied().unwrap_or_default();
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                required: amount,
                available,
            });
        }

        // Execute transfer
        balances.accounts.insert(from, available - amount);
        *balances.accounts.entry(to).or_default() += amount;
        Ok(())
    }

    /// Balance of `account`
    pub fn balance_of(&self, account: Address) -> Amount {
        let balances = self.balances.lock().unwrap_or_else(PoisonError::into_inner);
        balances.accounts.get(&account).copied().unwrap_or_default()
    }

    /// Sum of all minted tokens
    pub fn total_supply(&self) -> Amount {
        self.balances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .total_supply
    }

    /// Handle that spends from `holder`'s balance
    pub fn account(self: &Arc<Self>, holder: Address) -> TokenAccount {
        TokenAccount {
            token: Arc::clone(self),
            holder,
        }
    }
}

/// [`InMemoryToken`] account handle
#[derive(Debug, Clone)]
pub struct TokenAccount {
    token: Arc<InMemoryToken>,
    holder: Address,
}

impl TokenLedger for TokenAccount {
    fn holder(&self) -> Address {
        self.holder
    }

    fn transfer(&self, to: Address, amount: Amount) -> Result<(), TransferError> {
        self.token.transfer_from(self.holder, to, amount)
    }

    fn balance_of(&self, account: Address) -> Amount {
        self.token.balance_of(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_transfer() {
        let token = Arc::new(InMemoryToken::new());
        let from = Address::repeat_byte(1);
        let to = Address::repeat_byte(2);

        token.mint(from, Amount::from(1000u64)).unwrap();
        let account = token.account(from);
        account.transfer(to, Amount::from(100u64)).unwrap();

        assert_eq!(account.balance(), Amount::from(900u64));
        assert_eq!(account.balance_of(to), Amount::from(100u64));
        assert_eq!(token.total_supply(), Amount::from(1000u64));
    }

    #[test]
    fn test_insufficient_balance_leaves_state() {
        let token = Arc::new(InMemoryToken::new());
        let from = Address::repeat_byte(1);
        let to = Address::repeat_byte(2);
        token.mint(from, Amount::from(10u64)).unwrap();

        let result = token.transfer_from(from, to, Amount::from(11u64));
        assert_eq!(
            result,
            Err(TransferError::InsufficientBalance {
                required: Amount::from(11u64),
                available: Amount::from(10u64),
            })
        );
        assert_eq!(token.balance_of(from), Amount::from(10u64));
        assert_eq!(token.balance_of(to), Amount::ZERO);
    }

    #[test]
    fn test_mint_overflow_rejected() {
        let token = InMemoryToken::new();
        token.mint(Address::repeat_byte(1), Amount::MAX).unwrap();
        assert!(matches!(
            token.mint(Address::repeat_byte(2), Amount::from(1u64)),
            Err(TransferError::Rejected(_))
        ));
        assert_eq!(token.balance_of(Address::repeat_byte(2)), Amount::ZERO);
    }
}
