//! Risk parameters and governance limits
//!
//! All ratios are basis points of `PRECISION_BASE` (10_000 = 100%).

use lendpool_core::math::PRECISION_BASE;
use serde::{Deserialize, Serialize};

use crate::error::RiskError;

/// Market risk parameters, mutated only through the engine's setters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParams {
    /// Stable native units per whole collateral token
    pub collateral_price: u128,
    /// `10^collateral_decimals`
    pub collateral_scale: u128,
    pub ltv: u128,
    pub liquidation_threshold: u128,
    pub liquidation_bonus: u128,
    pub apr: u128,
    /// Timestamp of the last accepted APR change
    #[serde(default)]
    pub last_apr_update: Option<u64>,
}

impl RiskParams {
    /// Check the parameters against each other and against `limits`
    pub fn validate(&self, limits: &GovernanceLimits) -> Result<(), RiskError> {
        if self.collateral_scale == 0 {
            return Err(RiskError::invalid("collateral_scale", "must be positive"));
        }
        if self.collateral_price == 0 {
            return Err(RiskError::invalid("collateral_price", "must be positive"));
        }
        check_ltv(self.ltv, self.liquidation_threshold)?;
        check_threshold(self.liquidation_threshold, self.ltv)?;
        check_bonus(self.liquidation_bonus, limits.max_liquidation_bonus)?;
        if self.apr > limits.max_apr {
            return Err(RiskError::invalid(
                "apr",
                format!("{} exceeds max {}", self.apr, limits.max_apr),
            ));
        }
        Ok(())
    }
}

/// How far and how often governance may move the parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceLimits {
    pub max_price_change_bps: u128,
    pub max_apr_change_bps: u128,
    pub apr_update_cooldown_secs: u64,
    pub max_liquidation_bonus: u128,
    pub max_apr: u128,
}

impl Default for GovernanceLimits {
    fn default() -> Self {
        Self {
            max_price_change_bps: 1_000,      // 10%
            max_apr_change_bps: 200,          // 2 points
            apr_update_cooldown_secs: 86_400, // 1 day
            max_liquidation_bonus: 2_000,     // 20%
            max_apr: 5_000,                   // 50%
        }
    }
}

pub(crate) fn check_ltv(ltv: u128, threshold: u128) -> Result<(), RiskError> {
    if ltv == 0 {
        return Err(RiskError::invalid("ltv", "must be positive"));
    }
    if ltv > PRECISION_BASE {
        return Err(RiskError::invalid("ltv", format!("{ltv} exceeds {PRECISION_BASE}")));
    }
    if ltv >= threshold {
        return Err(RiskError::invalid(
            "ltv",
            format!("{ltv} must stay below liquidation threshold {threshold}"),
        ));
    }
    Ok(())
}

pub(crate) fn check_threshold(threshold: u128, ltv: u128) -> Result<(), RiskError> {
    if threshold > PRECISION_BASE {
        return Err(RiskError::invalid(
            "liquidation_threshold",
            format!("{threshold} exceeds {PRECISION_BASE}"),
        ));
    }
    if threshold <= ltv {
        return Err(RiskError::invalid(
            "liquidation_threshold",
            format!("{threshold} must stay above ltv {ltv}"),
        ));
    }
    Ok(())
}

pub(crate) fn check_bonus(bonus: u128, max: u128) -> Result<(), RiskError> {
    if bonus > max {
        return Err(RiskError::invalid(
            "liquidation_bonus",
            format!("{bonus} exceeds max {max}"),
        ));
    }
    Ok(())
}
