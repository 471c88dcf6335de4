//! Collateral balances and valuation

use lendpool_core::math::{self, MathError};
use lendpool_core::AccountId;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::position::Position;

/// Aggregate collateral ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralLedger {
    total_collateral: u128,
}

impl CollateralLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_collateral(&self) -> u128 {
        self.total_collateral
    }

    pub fn deposit(&mut self, position: &mut Position, amount: u128) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let balance = math::add(position.collateral_amount, amount)?;
        let total = math::add(self.total_collateral, amount)?;

        position.collateral_amount = balance;
        position.exists = true;
        self.total_collateral = total;
        Ok(())
    }

    /// Remove collateral. Any LTV gate must already have passed.
    pub fn withdraw(
        &mut self,
        account: &AccountId,
        position: &mut Position,
        amount: u128,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if position.collateral_amount < amount {
            return Err(LedgerError::InsufficientCollateral {
                account: account.clone(),
                available: position.collateral_amount,
                requested: amount,
            });
        }

        let total = math::sub(self.total_collateral, amount)
            .map_err(|_| LedgerError::Inconsistent("total collateral below position".into()))?;

        position.collateral_amount -= amount;
        self.total_collateral = total;
        Ok(())
    }

    /// Stable-asset value of `amount` collateral at `price`.
    ///
    /// `price` is stable native units per whole collateral token and
    /// `collateral_scale` is `10^collateral_decimals`. Rounds down.
    pub fn value(amount: u128, price: u128, collateral_scale: u128) -> Result<u128, MathError> {
        math::mul_div_floor(amount, price, collateral_scale)
    }
}
