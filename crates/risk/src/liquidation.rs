//! Liquidation pricing
//!
//! A liquidator repays `debt_amount` of an unhealthy position and receives
//! the equivalent collateral plus the liquidation bonus. Partial fills are
//! not supported: if the position cannot cover the full payout the
//! liquidation is rejected.

use lendpool_core::math::{self, PRECISION_BASE};
use lendpool_core::AccountId;
use serde::{Deserialize, Serialize};

use crate::error::RiskError;

/// Priced liquidation, ready to be settled against the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationQuote {
    pub user: AccountId,
    /// Stable units the liquidator pays in
    pub debt_amount: u128,
    /// Collateral worth exactly `debt_amount` at the current price
    pub base_collateral: u128,
    /// Collateral handed to the liquidator, bonus included
    pub payout: u128,
    /// Position debt before settlement
    pub debt_before: u128,
    /// Collateral value before settlement
    pub collateral_value: u128,
}

impl LiquidationQuote {
    /// Collateral paid on top of the repaid debt's worth
    pub fn bonus_collateral(&self) -> u128 {
        self.payout.saturating_sub(self.base_collateral)
    }
}

/// `(base, payout)` collateral for repaying `debt_amount`. Both round down.
pub fn price_payout(
    debt_amount: u128,
    price: u128,
    collateral_scale: u128,
    bonus: u128,
) -> Result<(u128, u128), RiskError> {
    let base = math::mul_div_floor(debt_amount, collateral_scale, price)?;
    let payout = math::mul_div_floor(base, math::add(PRECISION_BASE, bonus)?, PRECISION_BASE)?;
    Ok((base, payout))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WETH: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn test_payout_includes_bonus() {
        // 1000 USDC (6 dp) at 2000 USDC/WETH -> 0.5 WETH, +5% -> 0.525 WETH
        let (base, payout) = price_payout(1_000_000_000, 2_000_000_000, WETH, 500).unwrap();
        assert_eq!(base, WETH / 2);
        assert_eq!(payout, 525_000_000_000_000_000);
    }

    #[test]
    fn test_payout_rounds_down() {
        // 10 / 3 -> 3, 3 * 1.05 -> 3
        let (base, payout) = price_payout(10, 3, 1, 500).unwrap();
        assert_eq!(base, 3);
        assert_eq!(payout, 3);
    }

    #[test]
    fn test_zero_price_is_math_error() {
        assert!(matches!(
            price_payout(10, 0, 1, 500),
            Err(RiskError::Math(_))
        ));
    }

    #[test]
    fn test_quote_helpers() {
        let quote = LiquidationQuote {
            user: AccountId::new("alice"),
            debt_amount: 400,
            base_collateral: 200,
            payout: 210,
            debt_before: 401,
            collateral_value: 500,
        };
        assert_eq!(quote.bonus_collateral(), 10);
    }
}
