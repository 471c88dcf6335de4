//! Global ledger state
//!
//! One `LedgerState` is the whole book: every position plus the aggregate
//! counters. Each method either applies all of its position-level and
//! aggregate changes or returns an error having changed nothing.

use lendpool_core::math::{self, SCALE};
use lendpool_core::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::accrual::{AccrualClock, Accrued};
use crate::collateral::CollateralLedger;
use crate::debt::{DebtLedger, DebtReduction};
use crate::error::LedgerError;
use crate::pool::LiquidityPool;
use crate::position::Position;

/// The complete accounting state of one market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    clock: AccrualClock,
    debt: DebtLedger,
    collateral: CollateralLedger,
    pool: LiquidityPool,
    positions: BTreeMap<AccountId, Position>,
}

impl LedgerState {
    /// Create an empty ledger whose accrual starts at `start`
    pub fn new(start: u64) -> Self {
        Self {
            clock: AccrualClock::new(start),
            debt: DebtLedger::new(),
            collateral: CollateralLedger::new(),
            pool: LiquidityPool::new(),
            positions: BTreeMap::new(),
        }
    }

    pub fn clock(&self) -> &AccrualClock {
        &self.clock
    }

    pub fn pool(&self) -> &LiquidityPool {
        &self.pool
    }

    pub fn total_debt_shares(&self) -> u128 {
        self.debt.total_debt_shares()
    }

    pub fn total_collateral(&self) -> u128 {
        self.collateral.total_collateral()
    }

    pub fn total_lp_shares(&self) -> u128 {
        self.pool.total_lp_shares()
    }

    pub fn pool_liquidity(&self) -> u128 {
        self.pool.pool_liquidity()
    }

    pub fn position(&self, account: &AccountId) -> Option<&Position> {
        self.positions.get(account)
    }

    pub fn positions(&self) -> impl Iterator<Item = (&AccountId, &Position)> {
        self.positions.iter()
    }

    /// Position that must already exist
    pub fn require_position(&self, account: &AccountId) -> Result<&Position, LedgerError> {
        self.positions
            .get(account)
            .ok_or_else(|| LedgerError::PositionNotFound(account.clone()))
    }

    // === Accrual ===

    /// Refresh both multipliers to `now` under `apr`
    pub fn accrue(&mut self, now: u64, apr: u128) -> Result<Accrued, LedgerError> {
        let total_debt_shares = self.debt.total_debt_shares();
        let total_lp_shares = self.pool.total_lp_shares();
        Ok(self
            .clock
            .accrue(now, apr, total_debt_shares, total_lp_shares)?)
    }

    /// Debt multiplier at `now` without mutating
    pub fn current_debt_multiplier(&self, now: u64, apr: u128) -> Result<u128, LedgerError> {
        Ok(self.clock.current_debt_multiplier(now, apr)?)
    }

    /// LP multiplier at `now` without mutating
    pub fn current_lp_multiplier(&self, now: u64, apr: u128) -> Result<u128, LedgerError> {
        Ok(self.clock.current_lp_multiplier(
            now,
            apr,
            self.debt.total_debt_shares(),
            self.pool.total_lp_shares(),
        )?)
    }

    /// Debt of `account` at `now`; zero for unknown accounts
    pub fn current_debt(&self, account: &AccountId, now: u64, apr: u128) -> Result<u128, LedgerError> {
        match self.positions.get(account) {
            Some(position) => {
                let multiplier = self.current_debt_multiplier(now, apr)?;
                DebtLedger::current_debt(position, multiplier)
            }
            None => Ok(0),
        }
    }

    /// Total owed by all borrowers at `now`, rounded up
    pub fn total_debt(&self, now: u64, apr: u128) -> Result<u128, LedgerError> {
        let multiplier = self.current_debt_multiplier(now, apr)?;
        Ok(math::mul_div_ceil(self.debt.total_debt_shares(), multiplier, SCALE)?)
    }

    fn fresh_debt_multiplier(&self, now: u64) -> Result<u128, LedgerError> {
        if !self.clock.is_debt_fresh(now) {
            return Err(LedgerError::StaleMultiplier("debt"));
        }
        Ok(self.clock.acc_debt_per_share())
    }

    fn fresh_lp_multiplier(&self, now: u64) -> Result<u128, LedgerError> {
        if !self.clock.is_lp_fresh(now) {
            return Err(LedgerError::StaleMultiplier("LP"));
        }
        Ok(self.clock.acc_lp_per_share())
    }

    // === Collateral ===

    /// Add collateral, opening the position on first deposit
    pub fn deposit_collateral(&mut self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let mut position = self.positions.get(account).cloned().unwrap_or_else(Position::open);
        self.collateral.deposit(&mut position, amount)?;
        self.positions.insert(account.clone(), position);
        Ok(())
    }

    /// Remove collateral. The LTV gate is the caller's job.
    pub fn withdraw_collateral(&mut self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let position = self
            .positions
            .get_mut(account)
            .ok_or_else(|| LedgerError::PositionNotFound(account.clone()))?;
        self.collateral.withdraw(account, position, amount)
    }

    // === Debt ===

    /// Record a borrow and draw the funds from the pool.
    ///
    /// Requires the debt multiplier to have been refreshed at `now`.
    pub fn borrow(&mut self, account: &AccountId, amount: u128, now: u64) -> Result<u128, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let multiplier = self.fresh_debt_multiplier(now)?;
        if self.pool.pool_liquidity() < amount {
            return Err(LedgerError::InsufficientLiquidity {
                available: self.pool.pool_liquidity(),
                requested: amount,
            });
        }

        let position = self
            .positions
            .get_mut(account)
            .ok_or_else(|| LedgerError::PositionNotFound(account.clone()))?;
        let shares = self.debt.borrow(position, amount, multiplier)?;
        // liquidity was checked above, cannot fail
        self.pool.lend_out(amount)?;
        Ok(shares)
    }

    /// Apply a repayment and credit the pool.
    ///
    /// Rejects amounts above the current debt.
    pub fn repay(&mut self, account: &AccountId, amount: u128, now: u64) -> Result<DebtReduction, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let multiplier = self.fresh_debt_multiplier(now)?;
        let position = self
            .positions
            .get_mut(account)
            .ok_or_else(|| LedgerError::PositionNotFound(account.clone()))?;

        let debt = DebtLedger::current_debt(position, multiplier)?;
        if amount > debt {
            return Err(LedgerError::RepayExceedsDebt {
                requested: amount,
                debt,
            });
        }

        // checked up front so the pool credit cannot fail after the debt moved
        math::add(self.pool.pool_liquidity(), amount)?;
        let reduction = self.debt.reduce_debt(position, amount, debt, multiplier)?;
        self.pool.receive(amount)?;
        Ok(reduction)
    }

    /// Settle a liquidation: burn `debt_amount` of debt, seize `payout`
    /// collateral and credit the pool with `debt_amount`.
    ///
    /// Eligibility and payout pricing are decided by the risk engine.
    pub fn liquidate(
        &mut self,
        account: &AccountId,
        debt_amount: u128,
        payout: u128,
        now: u64,
    ) -> Result<DebtReduction, LedgerError> {
        if debt_amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let multiplier = self.fresh_debt_multiplier(now)?;

        let mut position = self.require_position(account)?.clone();
        let debt = DebtLedger::current_debt(&position, multiplier)?;
        if debt_amount > debt {
            return Err(LedgerError::RepayExceedsDebt {
                requested: debt_amount,
                debt,
            });
        }

        // Work on copies so a late failure leaves nothing half-applied.
        let mut debt_ledger = self.debt.clone();
        let mut collateral = self.collateral.clone();
        let mut pool = self.pool.clone();

        collateral.withdraw(account, &mut position, payout)?;
        let reduction = debt_ledger.reduce_debt(&mut position, debt_amount, debt, multiplier)?;
        pool.receive(debt_amount)?;

        self.debt = debt_ledger;
        self.collateral = collateral;
        self.pool = pool;
        self.positions.insert(account.clone(), position);
        Ok(reduction)
    }

    // === Liquidity ===

    /// Mint LP shares. Requires the LP multiplier refreshed at `now`.
    pub fn deposit_liquidity(&mut self, account: &AccountId, amount: u128, now: u64) -> Result<u128, LedgerError> {
        let multiplier = self.fresh_lp_multiplier(now)?;
        self.pool.deposit_liquidity(account, amount, multiplier)
    }

    /// Burn LP shares. Requires the LP multiplier refreshed at `now`.
    pub fn withdraw_liquidity(&mut self, account: &AccountId, shares: u128, now: u64) -> Result<u128, LedgerError> {
        let multiplier = self.fresh_lp_multiplier(now)?;
        self.pool.withdraw_liquidity(account, shares, multiplier)
    }

    // === Invariants ===

    /// Check that the aggregates equal the sums over positions and holders
    pub fn verify_invariants(&self) -> Result<(), LedgerError> {
        let collateral: u128 = self.positions.values().map(|p| p.collateral_amount).sum();
        if collateral != self.collateral.total_collateral() {
            return Err(LedgerError::Inconsistent(format!(
                "total collateral {} != sum of positions {}",
                self.collateral.total_collateral(),
                collateral
            )));
        }

        let shares: u128 = self.positions.values().map(|p| p.debt_shares).sum();
        if shares != self.debt.total_debt_shares() {
            return Err(LedgerError::Inconsistent(format!(
                "total debt shares {} != sum of positions {}",
                self.debt.total_debt_shares(),
                shares
            )));
        }

        let lp: u128 = self.pool.balances().map(|(_, b)| *b).sum();
        if lp != self.pool.total_lp_shares() {
            return Err(LedgerError::Inconsistent(format!(
                "total LP shares {} != sum of holders {}",
                self.pool.total_lp_shares(),
                lp
            )));
        }

        Ok(())
    }
}
