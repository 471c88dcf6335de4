//! Market-level errors

use lendpool_core::{AccountId, AssetError, AssetKind, ErrorCategory, MathError};
use lendpool_ledger::LedgerError;
use lendpool_oracle::OracleError;
use lendpool_risk::RiskError;
use thiserror::Error;

use crate::access::AuthorizationError;
use crate::transfer::TransferError;

/// Why a market operation was rejected. Nothing was changed.
#[derive(Error, Debug)]
pub enum LendingError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Risk error: {0}")]
    Risk(#[from] RiskError),

    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthorizationError),

    #[error("Transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("No surplus of the {0} asset to sweep")]
    NoSurplus(AssetKind),

    #[error("{0} is the market's custody account and cannot take part in a transaction")]
    CustodyAccount(AccountId),
}

impl LendingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LendingError::Ledger(e) => e.category(),
            LendingError::Risk(e) => e.category(),
            LendingError::Unauthorized(e) => e.category(),
            LendingError::Transfer(e) => e.category(),
            LendingError::Math(_) => ErrorCategory::Fatal,
            LendingError::Asset(_) => ErrorCategory::Validation,
            LendingError::Oracle(_) => ErrorCategory::External,
            LendingError::NoSurplus(_) => ErrorCategory::Invariant,
            LendingError::CustodyAccount(_) => ErrorCategory::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            LendingError::from(LedgerError::ZeroAmount).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            LendingError::from(RiskError::PositionHealthy(AccountId::new("a"))).category(),
            ErrorCategory::Invariant
        );
        assert_eq!(
            LendingError::from(AuthorizationError::NotOwner {
                caller: AccountId::new("a")
            })
            .category(),
            ErrorCategory::Authorization
        );
        assert_eq!(
            LendingError::from(MathError::Overflow).category(),
            ErrorCategory::Fatal
        );
        assert_eq!(
            LendingError::from(RiskError::Ledger(LedgerError::Math(MathError::Overflow))).category(),
            ErrorCategory::Fatal
        );
        assert_eq!(
            LendingError::CustodyAccount(AccountId::market()).category(),
            ErrorCategory::Validation
        );
    }
}
