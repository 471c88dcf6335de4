//! Risk engine errors

use lendpool_core::{AccountId, ErrorCategory, MathError};
use lendpool_ledger::LedgerError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Borrow exceeds LTV for {account}: collateral value {collateral_value}, debt after borrow {debt_after}")]
    BorrowExceedsLtv {
        account: AccountId,
        collateral_value: u128,
        debt_after: u128,
    },

    #[error("Withdrawal exceeds LTV for {account}: remaining value {remaining_value}, debt {debt}")]
    WithdrawExceedsLtv {
        account: AccountId,
        remaining_value: u128,
        debt: u128,
    },

    #[error("Position {0} is healthy")]
    PositionHealthy(AccountId),

    #[error("Position {0} has no debt")]
    NoDebt(AccountId),

    #[error("Liquidation amount {requested} exceeds current debt {debt}")]
    LiquidationExceedsDebt { requested: u128, debt: u128 },

    #[error("Liquidating {debt_amount} pays out no collateral at the current price")]
    PayoutRoundsToZero { debt_amount: u128 },

    #[error("Insufficient collateral for liquidation payout: available {available}, payout {payout}")]
    InsufficientCollateralForPayout { available: u128, payout: u128 },

    #[error("Price change too large: current {current}, requested {requested}, max {max_bps} bps")]
    PriceChangeTooLarge {
        current: u128,
        requested: u128,
        max_bps: u128,
    },

    #[error("APR change too large: current {current}, requested {requested}, max {max_bps} bps")]
    AprChangeTooLarge {
        current: u128,
        requested: u128,
        max_bps: u128,
    },

    #[error("APR update on cooldown for another {remaining_secs}s")]
    AprCooldown { remaining_secs: u64 },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Math(#[from] MathError),
}

impl RiskError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RiskError::InvalidParameter { .. } | RiskError::PayoutRoundsToZero { .. } => {
                ErrorCategory::Validation
            }
            RiskError::Ledger(e) => e.category(),
            RiskError::Math(_) => ErrorCategory::Fatal,
            _ => ErrorCategory::Invariant,
        }
    }

    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        RiskError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
