//! Stable-asset liquidity pool with LP shares
//!
//! LP shares are minted at the current LP multiplier and redeemed at the
//! multiplier in force when they are burned; the difference is the yield
//! paid by borrowers. Both conversions round down.

use lendpool_core::math::{self, MathError, SCALE};
use lendpool_core::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::LedgerError;

/// Liquidity pool ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPool {
    total_lp_shares: u128,
    /// Stable units the ledger holds on behalf of LPs
    pool_liquidity: u128,
    balances: BTreeMap<AccountId, u128>,
}

impl LiquidityPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_lp_shares(&self) -> u128 {
        self.total_lp_shares
    }

    pub fn pool_liquidity(&self) -> u128 {
        self.pool_liquidity
    }

    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn balances(&self) -> impl Iterator<Item = (&AccountId, &u128)> {
        self.balances.iter()
    }

    /// Mint shares for `amount` at `lp_multiplier` (must be freshly refreshed)
    pub fn deposit_liquidity(
        &mut self,
        account: &AccountId,
        amount: u128,
        lp_multiplier: u128,
    ) -> Result<u128, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let shares = math::mul_div_floor(amount, SCALE, lp_multiplier)?;
        if shares == 0 {
            return Err(LedgerError::DustAmount(amount));
        }

        let balance = math::add(self.balance_of(account), shares)?;
        let total = math::add(self.total_lp_shares, shares)?;
        let liquidity = math::add(self.pool_liquidity, amount)?;

        self.balances.insert(account.clone(), balance);
        self.total_lp_shares = total;
        self.pool_liquidity = liquidity;
        Ok(shares)
    }

    /// Burn `shares` and release their value at `lp_multiplier`
    pub fn withdraw_liquidity(
        &mut self,
        account: &AccountId,
        shares: u128,
        lp_multiplier: u128,
    ) -> Result<u128, LedgerError> {
        if shares == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let held = self.balance_of(account);
        if held < shares {
            return Err(LedgerError::InsufficientLpShares {
                account: account.clone(),
                held,
                requested: shares,
            });
        }

        let amount = Self::lp_value(shares, lp_multiplier)?;
        if self.pool_liquidity < amount {
            return Err(LedgerError::InsufficientLiquidity {
                available: self.pool_liquidity,
                requested: amount,
            });
        }

        let total = math::sub(self.total_lp_shares, shares)
            .map_err(|_| LedgerError::Inconsistent("total LP shares below holder".into()))?;

        let remaining = held - shares;
        if remaining == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.clone(), remaining);
        }
        self.total_lp_shares = total;
        self.pool_liquidity -= amount;
        Ok(amount)
    }

    /// Draw funds for a borrow or an outbound payment
    pub fn lend_out(&mut self, amount: u128) -> Result<(), LedgerError> {
        if self.pool_liquidity < amount {
            return Err(LedgerError::InsufficientLiquidity {
                available: self.pool_liquidity,
                requested: amount,
            });
        }
        self.pool_liquidity -= amount;
        Ok(())
    }

    /// Take in repayments and liquidation proceeds
    pub fn receive(&mut self, amount: u128) -> Result<(), LedgerError> {
        self.pool_liquidity = math::add(self.pool_liquidity, amount)?;
        Ok(())
    }

    /// Stable value of `shares` at `lp_multiplier`, rounded down
    pub fn lp_value(shares: u128, lp_multiplier: u128) -> Result<u128, MathError> {
        math::mul_div_floor(shares, lp_multiplier, SCALE)
    }

    /// External balance above what the ledger owes LPs
    pub fn surplus(&self, external_balance: u128) -> u128 {
        external_balance.saturating_sub(self.pool_liquidity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    #[test]
    fn test_deposit_at_par() {
        let mut pool = LiquidityPool::new();
        let shares = pool.deposit_liquidity(&alice(), 1_000, SCALE).unwrap();

        assert_eq!(shares, 1_000);
        assert_eq!(pool.balance_of(&alice()), 1_000);
        assert_eq!(pool.total_lp_shares(), 1_000);
        assert_eq!(pool.pool_liquidity(), 1_000);
    }

    #[test]
    fn test_round_trip_loses_at_most_one_unit() {
        let mut pool = LiquidityPool::new();
        // an awkward multiplier: 1.333..
        let multiplier = SCALE + SCALE / 3;
        let shares = pool.deposit_liquidity(&alice(), 1_000, multiplier).unwrap();
        let amount = pool.withdraw_liquidity(&alice(), shares, multiplier).unwrap();

        assert!(amount <= 1_000);
        assert!(1_000 - amount <= 1);
        assert_eq!(pool.total_lp_shares(), 0);
        assert_eq!(pool.balance_of(&alice()), 0);
    }

    #[test]
    fn test_withdraw_more_shares_than_held() {
        let mut pool = LiquidityPool::new();
        pool.deposit_liquidity(&alice(), 1_000, SCALE).unwrap();

        let result = pool.withdraw_liquidity(&alice(), 1_001, SCALE);
        assert!(matches!(result, Err(LedgerError::InsufficientLpShares { .. })));
    }

    #[test]
    fn test_withdraw_blocked_while_funds_are_lent() {
        let mut pool = LiquidityPool::new();
        pool.deposit_liquidity(&alice(), 1_000, SCALE).unwrap();
        pool.lend_out(800).unwrap();

        let result = pool.withdraw_liquidity(&alice(), 500, SCALE);
        assert!(matches!(result, Err(LedgerError::InsufficientLiquidity { .. })));

        // partial withdrawal within the idle liquidity works
        assert_eq!(pool.withdraw_liquidity(&alice(), 200, SCALE).unwrap(), 200);
    }

    #[test]
    fn test_lend_out_and_receive() {
        let mut pool = LiquidityPool::new();
        pool.deposit_liquidity(&alice(), 100, SCALE).unwrap();

        assert!(pool.lend_out(101).is_err());
        pool.lend_out(60).unwrap();
        pool.receive(70).unwrap();
        assert_eq!(pool.pool_liquidity(), 110);
    }

    #[test]
    fn test_surplus_never_counts_owed_funds() {
        let mut pool = LiquidityPool::new();
        pool.deposit_liquidity(&alice(), 1_000, SCALE).unwrap();

        assert_eq!(pool.surplus(1_250), 250);
        assert_eq!(pool.surplus(900), 0);
    }
}
