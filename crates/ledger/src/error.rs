//! Ledger errors

use lendpool_core::{AccountId, ErrorCategory, MathError};
use thiserror::Error;

/// Errors that can occur in ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Position not found: {0}")]
    PositionNotFound(AccountId),

    #[error("Insufficient collateral for {account}: available {available}, requested {requested}")]
    InsufficientCollateral {
        account: AccountId,
        available: u128,
        requested: u128,
    },

    #[error("Insufficient pool liquidity: available {available}, requested {requested}")]
    InsufficientLiquidity { available: u128, requested: u128 },

    #[error("Insufficient LP shares for {account}: held {held}, requested {requested}")]
    InsufficientLpShares {
        account: AccountId,
        held: u128,
        requested: u128,
    },

    #[error("Repay amount {requested} exceeds current debt {debt}")]
    RepayExceedsDebt { requested: u128, debt: u128 },

    #[error("Amount {0} is too small to mint a share at the current multiplier")]
    DustAmount(u128),

    #[error("{0} multiplier not refreshed for the current timestamp")]
    StaleMultiplier(&'static str),

    #[error("Ledger invariant broken: {0}")]
    Inconsistent(String),

    #[error(transparent)]
    Math(#[from] MathError),
}

impl LedgerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LedgerError::ZeroAmount | LedgerError::PositionNotFound(_) => ErrorCategory::Validation,
            LedgerError::Math(_) | LedgerError::Inconsistent(_) => ErrorCategory::Fatal,
            _ => ErrorCategory::Invariant,
        }
    }
}
