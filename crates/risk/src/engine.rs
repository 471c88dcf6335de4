//! Risk engine implementation

use lendpool_core::math::{self, PRECISION_BASE};
use lendpool_core::AccountId;
use lendpool_ledger::{LedgerError, LedgerState, LiquidityPool};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::RiskError;
use crate::liquidation::{price_payout, LiquidationQuote};
use crate::params::{check_bonus, check_ltv, check_threshold, GovernanceLimits, RiskParams};

/// Health factor of a position sitting exactly on the liquidation boundary
pub const HEALTH_FACTOR_ONE: u128 = PRECISION_BASE * PRECISION_BASE;

/// Health factor reported for positions without debt
pub const INFINITE_HEALTH_FACTOR: u128 = u128::MAX;

/// Lifecycle of a borrower position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PositionStatus {
    /// No position, or nothing left in it
    Empty,
    Collateralized,
    CollateralizedWithDebt,
    Liquidatable,
}

/// Risk Engine - pre-commit gatekeeper
///
/// Owns the risk parameters and validates borrows, withdrawals and
/// liquidations against the ledger before the ledger is mutated. Every
/// check reads debt at `now`; callers accrue first so the figures match
/// what the ledger will settle at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskEngine {
    params: RiskParams,
    limits: GovernanceLimits,
}

impl RiskEngine {
    pub fn new(params: RiskParams, limits: GovernanceLimits) -> Result<Self, RiskError> {
        params.validate(&limits)?;
        Ok(Self { params, limits })
    }

    pub fn params(&self) -> &RiskParams {
        &self.params
    }

    pub fn limits(&self) -> &GovernanceLimits {
        &self.limits
    }

    pub fn apr(&self) -> u128 {
        self.params.apr
    }

    /// Stable value of `amount` collateral at the current price, rounded down
    pub fn collateral_value(&self, amount: u128) -> Result<u128, RiskError> {
        Ok(math::mul_div_floor(
            amount,
            self.params.collateral_price,
            self.params.collateral_scale,
        )?)
    }

    fn debt_of(&self, ledger: &LedgerState, account: &AccountId, now: u64) -> Result<u128, RiskError> {
        Ok(ledger.current_debt(account, now, self.params.apr)?)
    }

    fn is_below_threshold(&self, value: u128, debt: u128) -> Result<bool, RiskError> {
        if debt == 0 {
            return Ok(false);
        }
        let weighted = math::mul(value, self.params.liquidation_threshold)?;
        Ok(weighted < math::mul(debt, PRECISION_BASE)?)
    }

    // === Gates ===

    /// `value(collateral) * ltv >= (debt + amount) * PRECISION_BASE`
    pub fn check_borrow(
        &self,
        ledger: &LedgerState,
        account: &AccountId,
        amount: u128,
        now: u64,
    ) -> Result<(), RiskError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount.into());
        }
        let position = ledger.require_position(account)?;
        let collateral_value = self.collateral_value(position.collateral_amount)?;
        let debt_after = math::add(self.debt_of(ledger, account, now)?, amount)?;

        let capacity = math::mul(collateral_value, self.params.ltv)?;
        if capacity < math::mul(debt_after, PRECISION_BASE)? {
            return Err(RiskError::BorrowExceedsLtv {
                account: account.clone(),
                collateral_value,
                debt_after,
            });
        }
        Ok(())
    }

    /// Remaining collateral must still back the debt at `ltv`.
    /// Positions without debt may withdraw everything.
    pub fn check_withdraw(
        &self,
        ledger: &LedgerState,
        account: &AccountId,
        amount: u128,
        now: u64,
    ) -> Result<(), RiskError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount.into());
        }
        let position = ledger.require_position(account)?;
        let remaining = position.collateral_amount.checked_sub(amount).ok_or_else(|| {
            LedgerError::InsufficientCollateral {
                account: account.clone(),
                available: position.collateral_amount,
                requested: amount,
            }
        })?;

        let debt = self.debt_of(ledger, account, now)?;
        if debt == 0 {
            return Ok(());
        }

        let remaining_value = self.collateral_value(remaining)?;
        let capacity = math::mul(remaining_value, self.params.ltv)?;
        if capacity < math::mul(debt, PRECISION_BASE)? {
            return Err(RiskError::WithdrawExceedsLtv {
                account: account.clone(),
                remaining_value,
                debt,
            });
        }
        Ok(())
    }

    /// Price a liquidation of `debt_amount` against `user`.
    ///
    /// Fails unless the position is below the liquidation threshold, the
    /// amount does not exceed its debt and the collateral covers the
    /// whole payout.
    pub fn quote_liquidation(
        &self,
        ledger: &LedgerState,
        user: &AccountId,
        debt_amount: u128,
        now: u64,
    ) -> Result<LiquidationQuote, RiskError> {
        if debt_amount == 0 {
            return Err(LedgerError::ZeroAmount.into());
        }
        let position = ledger.require_position(user)?;
        let debt = self.debt_of(ledger, user, now)?;
        if debt == 0 {
            return Err(RiskError::NoDebt(user.clone()));
        }

        let collateral_value = self.collateral_value(position.collateral_amount)?;
        if !self.is_below_threshold(collateral_value, debt)? {
            return Err(RiskError::PositionHealthy(user.clone()));
        }
        if debt_amount > debt {
            return Err(RiskError::LiquidationExceedsDebt {
                requested: debt_amount,
                debt,
            });
        }

        let (base_collateral, payout) = price_payout(
            debt_amount,
            self.params.collateral_price,
            self.params.collateral_scale,
            self.params.liquidation_bonus,
        )?;
        if payout == 0 {
            return Err(RiskError::PayoutRoundsToZero { debt_amount });
        }
        if position.collateral_amount < payout {
            return Err(RiskError::InsufficientCollateralForPayout {
                available: position.collateral_amount,
                payout,
            });
        }

        Ok(LiquidationQuote {
            user: user.clone(),
            debt_amount,
            base_collateral,
            payout,
            debt_before: debt,
            collateral_value,
        })
    }

    // === Views ===

    /// `value * liquidation_threshold * 10_000 / debt`, rounded down.
    ///
    /// Below [`HEALTH_FACTOR_ONE`] the position can be liquidated.
    pub fn health_factor(&self, ledger: &LedgerState, account: &AccountId, now: u64) -> Result<u128, RiskError> {
        let debt = self.debt_of(ledger, account, now)?;
        if debt == 0 {
            return Ok(INFINITE_HEALTH_FACTOR);
        }
        let collateral = ledger.position(account).map_or(0, |p| p.collateral_amount);
        let value = self.collateral_value(collateral)?;
        let weighted = math::mul(value, self.params.liquidation_threshold)?;
        Ok(math::mul_div_floor(weighted, PRECISION_BASE, debt)?)
    }

    pub fn status(&self, ledger: &LedgerState, account: &AccountId, now: u64) -> Result<PositionStatus, RiskError> {
        let Some(position) = ledger.position(account) else {
            return Ok(PositionStatus::Empty);
        };
        let debt = self.debt_of(ledger, account, now)?;
        if debt == 0 {
            return Ok(if position.collateral_amount == 0 {
                PositionStatus::Empty
            } else {
                PositionStatus::Collateralized
            });
        }

        let value = self.collateral_value(position.collateral_amount)?;
        if self.is_below_threshold(value, debt)? {
            Ok(PositionStatus::Liquidatable)
        } else {
            Ok(PositionStatus::CollateralizedWithDebt)
        }
    }

    /// Largest borrow the LTV gate would accept, capped by pool liquidity
    pub fn max_borrowable(&self, ledger: &LedgerState, account: &AccountId, now: u64) -> Result<u128, RiskError> {
        let Some(position) = ledger.position(account) else {
            return Ok(0);
        };
        let value = self.collateral_value(position.collateral_amount)?;
        let limit = math::mul_div_floor(value, self.params.ltv, PRECISION_BASE)?;
        let debt = self.debt_of(ledger, account, now)?;
        Ok(limit.saturating_sub(debt).min(ledger.pool_liquidity()))
    }

    /// Largest collateral withdrawal the LTV gate would accept
    pub fn max_withdrawable(&self, ledger: &LedgerState, account: &AccountId, now: u64) -> Result<u128, RiskError> {
        let Some(position) = ledger.position(account) else {
            return Ok(0);
        };
        let debt = self.debt_of(ledger, account, now)?;
        if debt == 0 {
            return Ok(position.collateral_amount);
        }

        let required_value = math::mul_div_ceil(debt, PRECISION_BASE, self.params.ltv)?;
        let required_amount = math::mul_div_ceil(
            required_value,
            self.params.collateral_scale,
            self.params.collateral_price,
        )?;
        Ok(position.collateral_amount.saturating_sub(required_amount))
    }

    /// Annualised LP yield in bps: `apr * total_debt / total_lp_value`
    pub fn lp_apy(&self, ledger: &LedgerState, now: u64) -> Result<u128, RiskError> {
        let lp_multiplier = ledger.current_lp_multiplier(now, self.params.apr)?;
        let total_lp_value = LiquidityPool::lp_value(ledger.total_lp_shares(), lp_multiplier)?;
        if total_lp_value == 0 {
            return Ok(0);
        }
        let total_debt = ledger.total_debt(now, self.params.apr)?;
        Ok(math::mul_div_floor(self.params.apr, total_debt, total_lp_value)?)
    }

    /// Every position currently below the liquidation threshold, with its
    /// health factor
    pub fn liquidatable_positions(&self, ledger: &LedgerState, now: u64) -> Result<Vec<(AccountId, u128)>, RiskError> {
        let mut result = Vec::new();
        for (account, position) in ledger.positions() {
            if !position.has_debt() {
                continue;
            }
            let debt = self.debt_of(ledger, account, now)?;
            let value = self.collateral_value(position.collateral_amount)?;
            if self.is_below_threshold(value, debt)? {
                result.push((account.clone(), self.health_factor(ledger, account, now)?));
            }
        }
        Ok(result)
    }

    // === Governance ===

    /// Returns the previous value
    pub fn set_ltv(&mut self, ltv: u128) -> Result<u128, RiskError> {
        check_ltv(ltv, self.params.liquidation_threshold)?;
        let old = std::mem::replace(&mut self.params.ltv, ltv);
        tracing::info!(old, new = ltv, "LTV updated");
        Ok(old)
    }

    pub fn set_liquidation_threshold(&mut self, threshold: u128) -> Result<u128, RiskError> {
        check_threshold(threshold, self.params.ltv)?;
        let old = std::mem::replace(&mut self.params.liquidation_threshold, threshold);
        tracing::info!(old, new = threshold, "Liquidation threshold updated");
        Ok(old)
    }

    pub fn set_liquidation_bonus(&mut self, bonus: u128) -> Result<u128, RiskError> {
        check_bonus(bonus, self.limits.max_liquidation_bonus)?;
        let old = std::mem::replace(&mut self.params.liquidation_bonus, bonus);
        tracing::info!(old, new = bonus, "Liquidation bonus updated");
        Ok(old)
    }

    /// Move the collateral price by at most `max_price_change_bps`.
    ///
    /// An unset (zero) price may be set to anything.
    pub fn set_price(&mut self, price: u128) -> Result<u128, RiskError> {
        if price == 0 {
            return Err(RiskError::invalid("collateral_price", "must be positive"));
        }
        let current = self.params.collateral_price;
        if current != 0 {
            let change = math::mul(math::abs_diff(price, current), PRECISION_BASE)?;
            let allowed = math::mul(current, self.limits.max_price_change_bps)?;
            if change > allowed {
                tracing::warn!(current, requested = price, "Price update tripped circuit breaker");
                return Err(RiskError::PriceChangeTooLarge {
                    current,
                    requested: price,
                    max_bps: self.limits.max_price_change_bps,
                });
            }
        }
        self.params.collateral_price = price;
        tracing::info!(old = current, new = price, "Collateral price updated");
        Ok(current)
    }

    /// Change the APR, subject to cooldown and step limits.
    ///
    /// Both multipliers are brought up to `now` under the old rate before
    /// the new one takes effect.
    pub fn set_apr(&mut self, ledger: &mut LedgerState, apr: u128, now: u64) -> Result<u128, RiskError> {
        if apr > self.limits.max_apr {
            return Err(RiskError::invalid(
                "apr",
                format!("{apr} exceeds max {}", self.limits.max_apr),
            ));
        }
        if let Some(last) = self.params.last_apr_update {
            let ready_at = last.saturating_add(self.limits.apr_update_cooldown_secs);
            if now < ready_at {
                return Err(RiskError::AprCooldown {
                    remaining_secs: ready_at - now,
                });
            }
        }

        let current = self.params.apr;
        if math::abs_diff(apr, current) > self.limits.max_apr_change_bps {
            return Err(RiskError::AprChangeTooLarge {
                current,
                requested: apr,
                max_bps: self.limits.max_apr_change_bps,
            });
        }

        ledger.accrue(now, current)?;
        self.params.apr = apr;
        self.params.last_apr_update = Some(now);
        tracing::info!(old = current, new = apr, now, "APR updated");
        Ok(current)
    }
}
