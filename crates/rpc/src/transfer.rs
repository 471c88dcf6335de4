//! Fungible token movements between wallets and the market

use lendpool_core::{AccountId, AssetKind, ErrorCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Insufficient {asset} balance for {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        asset: AssetKind,
        account: AccountId,
        available: u128,
        requested: u128,
    },

    #[error("Balance overflow for {account} in {asset}")]
    Overflow { asset: AssetKind, account: AccountId },

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

impl TransferError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::External
    }
}

/// Token collaborator.
///
/// The market's own holdings live under [`AccountId::market`].
pub trait TokenTransfer: Send {
    /// Pay `amount` out of the market to `to`
    fn transfer(&mut self, asset: AssetKind, to: &AccountId, amount: u128) -> Result<(), TransferError>;

    /// Pull `amount` from `from` into the market
    fn transfer_from(&mut self, asset: AssetKind, from: &AccountId, amount: u128) -> Result<(), TransferError>;

    fn balance_of(&self, asset: AssetKind, holder: &AccountId) -> u128;
}

/// Wallet balances kept in memory (and in the CLI snapshot)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryTokenBank {
    #[serde(default)]
    stable: BTreeMap<AccountId, u128>,
    #[serde(default)]
    collateral: BTreeMap<AccountId, u128>,
}

impl InMemoryTokenBank {
    pub fn new() -> Self {
        Self::default()
    }

    fn book(&self, asset: AssetKind) -> &BTreeMap<AccountId, u128> {
        match asset {
            AssetKind::Stable => &self.stable,
            AssetKind::Collateral => &self.collateral,
        }
    }

    fn book_mut(&mut self, asset: AssetKind) -> &mut BTreeMap<AccountId, u128> {
        match asset {
            AssetKind::Stable => &mut self.stable,
            AssetKind::Collateral => &mut self.collateral,
        }
    }

    /// Create tokens out of thin air (test faucet)
    pub fn mint(&mut self, asset: AssetKind, to: &AccountId, amount: u128) -> Result<(), TransferError> {
        let balance = self.balance_of(asset, to);
        let updated = balance.checked_add(amount).ok_or_else(|| TransferError::Overflow {
            asset,
            account: to.clone(),
        })?;
        self.book_mut(asset).insert(to.clone(), updated);
        Ok(())
    }

    /// Move between two wallets; both sides change or neither does
    pub fn move_tokens(
        &mut self,
        asset: AssetKind,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TransferError> {
        if amount == 0 {
            return Err(TransferError::Rejected("zero amount".into()));
        }
        if from == to {
            return Err(TransferError::Rejected(format!("{from} cannot pay itself")));
        }
        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                asset,
                account: from.clone(),
                available,
                requested: amount,
            });
        }
        let credited = self
            .balance_of(asset, to)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow {
                asset,
                account: to.clone(),
            })?;

        let book = self.book_mut(asset);
        book.insert(from.clone(), available - amount);
        book.insert(to.clone(), credited);
        Ok(())
    }

    /// Sum over every wallet, market included
    pub fn total_supply(&self, asset: AssetKind) -> u128 {
        self.book(asset).values().fold(0u128, |acc, b| acc.saturating_add(*b))
    }
}

impl TokenTransfer for InMemoryTokenBank {
    fn transfer(&mut self, asset: AssetKind, to: &AccountId, amount: u128) -> Result<(), TransferError> {
        self.move_tokens(asset, &AccountId::market(), to, amount)
    }

    fn transfer_from(&mut self, asset: AssetKind, from: &AccountId, amount: u128) -> Result<(), TransferError> {
        self.move_tokens(asset, from, &AccountId::market(), amount)
    }

    fn balance_of(&self, asset: AssetKind, holder: &AccountId) -> u128 {
        self.book(asset).get(holder).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    #[test]
    fn test_mint_and_transfer_in_and_out() {
        let mut bank = InMemoryTokenBank::new();
        bank.mint(AssetKind::Stable, &alice(), 100).unwrap();

        bank.transfer_from(AssetKind::Stable, &alice(), 60).unwrap();
        assert_eq!(bank.balance_of(AssetKind::Stable, &alice()), 40);
        assert_eq!(bank.balance_of(AssetKind::Stable, &AccountId::market()), 60);

        bank.transfer(AssetKind::Stable, &alice(), 10).unwrap();
        assert_eq!(bank.balance_of(AssetKind::Stable, &alice()), 50);
        assert_eq!(bank.total_supply(AssetKind::Stable), 100);
    }

    #[test]
    fn test_assets_are_separate() {
        let mut bank = InMemoryTokenBank::new();
        bank.mint(AssetKind::Collateral, &alice(), 5).unwrap();

        assert_eq!(bank.balance_of(AssetKind::Stable, &alice()), 0);
        assert!(matches!(
            bank.transfer_from(AssetKind::Stable, &alice(), 1),
            Err(TransferError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_failed_move_changes_nothing() {
        let mut bank = InMemoryTokenBank::new();
        bank.mint(AssetKind::Stable, &alice(), 10).unwrap();
        bank.mint(AssetKind::Stable, &AccountId::market(), u128::MAX).unwrap();
        let before = bank.clone();

        assert!(matches!(
            bank.transfer_from(AssetKind::Stable, &alice(), 10),
            Err(TransferError::Overflow { .. })
        ));
        assert_eq!(bank, before);
    }

    #[test]
    fn test_self_transfer_rejected() {
        let mut bank = InMemoryTokenBank::new();
        bank.mint(AssetKind::Stable, &AccountId::market(), 100).unwrap();
        let before = bank.clone();

        assert!(matches!(
            bank.transfer_from(AssetKind::Stable, &AccountId::market(), 50),
            Err(TransferError::Rejected(_))
        ));
        assert!(matches!(
            bank.transfer(AssetKind::Stable, &AccountId::market(), 50),
            Err(TransferError::Rejected(_))
        ));
        assert_eq!(bank, before);
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let mut bank = InMemoryTokenBank::new();
        bank.mint(AssetKind::Stable, &alice(), 1_000_000_000_000_000_000_000).unwrap();

        let json = serde_json::to_string(&bank).unwrap();
        let back: InMemoryTokenBank = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bank);
    }
}
