//! Per-borrower position record

use serde::{Deserialize, Serialize};

/// One borrower's collateral and debt.
///
/// Created on the first collateral deposit and never deleted. The debt
/// fields return to zero when the debt is fully repaid or liquidated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Collateral held, in collateral native units
    pub collateral_amount: u128,
    /// Shares of the global debt pool
    pub debt_shares: u128,
    /// Principal borrowed, reduced pro rata on partial repayment
    pub original_principal: u128,
    pub exists: bool,
}

impl Position {
    /// A freshly opened, empty position
    pub fn open() -> Self {
        Self {
            exists: true,
            ..Self::default()
        }
    }

    pub fn has_debt(&self) -> bool {
        self.debt_shares > 0
    }
}
