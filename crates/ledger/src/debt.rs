//! Debt bookkeeping in shares of a globally accruing pool
//!
//! A borrower holds debt shares; what they owe is
//! `ceil(shares * debt_multiplier / SCALE)`. Owed amounts round up and
//! removed shares round down, so rounding always favours the ledger.

use lendpool_core::math::{self, SCALE};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::position::Position;

/// Outcome of a debt reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebtReduction {
    pub shares_removed: u128,
    /// The position's debt was closed entirely
    pub closed: bool,
}

/// Global debt share ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtLedger {
    total_debt_shares: u128,
}

impl DebtLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_debt_shares(&self) -> u128 {
        self.total_debt_shares
    }

    /// Record a new borrow at `multiplier` (must be freshly refreshed).
    ///
    /// Returns the shares minted.
    pub fn borrow(
        &mut self,
        position: &mut Position,
        amount: u128,
        multiplier: u128,
    ) -> Result<u128, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let shares = math::mul_div_floor(amount, SCALE, multiplier)?;
        if shares == 0 {
            return Err(LedgerError::DustAmount(amount));
        }

        let debt_shares = math::add(position.debt_shares, shares)?;
        let principal = math::add(position.original_principal, amount)?;
        let total = math::add(self.total_debt_shares, shares)?;

        position.debt_shares = debt_shares;
        position.original_principal = principal;
        self.total_debt_shares = total;

        Ok(shares)
    }

    /// Owed amount of a position at `multiplier`, rounded up
    pub fn current_debt(position: &Position, multiplier: u128) -> Result<u128, LedgerError> {
        Ok(math::mul_div_ceil(position.debt_shares, multiplier, SCALE)?)
    }

    /// Remove `repay_amount` worth of debt.
    ///
    /// The caller guarantees `repay_amount <= current_debt` on the repay
    /// path; the liquidation path passes an already validated amount.
    pub fn reduce_debt(
        &mut self,
        position: &mut Position,
        repay_amount: u128,
        current_debt: u128,
        multiplier: u128,
    ) -> Result<DebtReduction, LedgerError> {
        let held = position.debt_shares;
        let shares_to_remove = math::mul_div_floor(repay_amount, SCALE, multiplier)?;

        // One unit of slack absorbs the ceiling in `current_debt`.
        let full_close =
            math::add(repay_amount, 1)? >= current_debt || shares_to_remove >= held;

        if full_close {
            self.total_debt_shares = math::sub(self.total_debt_shares, held)
                .map_err(|_| LedgerError::Inconsistent("total debt shares below position".into()))?;
            position.debt_shares = 0;
            position.original_principal = 0;

            return Ok(DebtReduction {
                shares_removed: held,
                closed: true,
            });
        }

        let principal_paid =
            math::mul_div_floor(position.original_principal, repay_amount, current_debt)?;
        let total = math::sub(self.total_debt_shares, shares_to_remove)
            .map_err(|_| LedgerError::Inconsistent("total debt shares below position".into()))?;

        position.debt_shares -= shares_to_remove;
        position.original_principal = position.original_principal.saturating_sub(principal_paid);
        self.total_debt_shares = total;

        Ok(DebtReduction {
            shares_removed: shares_to_remove,
            closed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position() -> Position {
        Position::open()
    }

    #[test]
    fn test_borrow_at_par_mints_one_share_per_unit() {
        let mut ledger = DebtLedger::new();
        let mut pos = position();

        let shares = ledger.borrow(&mut pos, 1_000, SCALE).unwrap();

        assert_eq!(shares, 1_000);
        assert_eq!(pos.debt_shares, 1_000);
        assert_eq!(pos.original_principal, 1_000);
        assert_eq!(ledger.total_debt_shares(), 1_000);
    }

    #[test]
    fn test_borrow_after_accrual_mints_fewer_shares() {
        let mut ledger = DebtLedger::new();
        let mut pos = position();

        // multiplier 2.0
        let shares = ledger.borrow(&mut pos, 1_000, 2 * SCALE).unwrap();
        assert_eq!(shares, 500);
        assert_eq!(DebtLedger::current_debt(&pos, 2 * SCALE).unwrap(), 1_000);
    }

    #[test]
    fn test_borrow_rejects_zero_and_dust() {
        let mut ledger = DebtLedger::new();
        let mut pos = position();

        assert_eq!(ledger.borrow(&mut pos, 0, SCALE), Err(LedgerError::ZeroAmount));
        assert_eq!(
            ledger.borrow(&mut pos, 1, 3 * SCALE),
            Err(LedgerError::DustAmount(1))
        );
        assert_eq!(ledger.total_debt_shares(), 0);
    }

    #[test]
    fn test_current_debt_rounds_up() {
        let mut pos = position();
        pos.debt_shares = 3;
        // 3 * 1.5 = 4.5 -> 5
        assert_eq!(DebtLedger::current_debt(&pos, SCALE + SCALE / 2).unwrap(), 5);
    }

    #[test]
    fn test_full_repay_closes_position() {
        let mut ledger = DebtLedger::new();
        let mut pos = position();
        ledger.borrow(&mut pos, 1_000, SCALE).unwrap();

        let multiplier = SCALE + SCALE / 20;
        let debt = DebtLedger::current_debt(&pos, multiplier).unwrap();
        let reduction = ledger.reduce_debt(&mut pos, debt, debt, multiplier).unwrap();

        assert!(reduction.closed);
        assert_eq!(reduction.shares_removed, 1_000);
        assert_eq!(pos.debt_shares, 0);
        assert_eq!(pos.original_principal, 0);
        assert_eq!(ledger.total_debt_shares(), 0);
    }

    #[test]
    fn test_repay_within_one_unit_closes_position() {
        let mut ledger = DebtLedger::new();
        let mut pos = position();
        ledger.borrow(&mut pos, 1_000, SCALE).unwrap();

        let reduction = ledger.reduce_debt(&mut pos, 999, 1_000, SCALE).unwrap();
        assert!(reduction.closed);
        assert_eq!(ledger.total_debt_shares(), 0);
    }

    #[test]
    fn test_partial_repay_reduces_proportionally() {
        let mut ledger = DebtLedger::new();
        let mut pos = position();
        ledger.borrow(&mut pos, 1_000, SCALE).unwrap();

        // multiplier 2.0: debt 2000, repay 500 -> remove 250 shares, 25% principal
        let reduction = ledger.reduce_debt(&mut pos, 500, 2_000, 2 * SCALE).unwrap();

        assert!(!reduction.closed);
        assert_eq!(reduction.shares_removed, 250);
        assert_eq!(pos.debt_shares, 750);
        assert_eq!(pos.original_principal, 750);
        assert_eq!(ledger.total_debt_shares(), 750);
    }

    #[test]
    fn test_totals_track_multiple_positions() {
        let mut ledger = DebtLedger::new();
        let mut alice = position();
        let mut bob = position();

        ledger.borrow(&mut alice, 300, SCALE).unwrap();
        ledger.borrow(&mut bob, 700, SCALE).unwrap();
        ledger.reduce_debt(&mut alice, 100, 300, SCALE).unwrap();

        assert_eq!(
            ledger.total_debt_shares(),
            alice.debt_shares + bob.debt_shares
        );
    }
}
