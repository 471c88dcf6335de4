//! Transaction orchestration
//!
//! Every mutating call follows the same flow:
//! Authorize → Accrue → Risk check → Ledger mutation → Transfers → Event.
//! The ledger and risk state are snapshotted first and restored on any
//! failure, so a rejected call leaves no trace.

use lendpool_core::{AccountId, Asset, AssetKind};
use lendpool_events::{EventSink, MarketEvent};
use lendpool_ledger::{DebtReduction, LedgerState, LiquidityPool, Position};
use lendpool_oracle::{OracleError, PriceQuote, TradingPair};
use lendpool_risk::{PositionStatus, RiskEngine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::access::AccessControl;
use crate::clock::{to_datetime, Clock};
use crate::config::{ConfigError, MarketConfig};
use crate::error::LendingError;
use crate::transfer::TokenTransfer;

/// Everything about a market that is persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketState {
    pub stable: Asset,
    pub collateral: Asset,
    pub ledger: LedgerState,
    pub risk: RiskEngine,
    pub access: AccessControl,
    pub sweep_sink: AccountId,
}

impl MarketState {
    /// Fresh market from configuration, accruing from `start`
    pub fn from_config(config: &MarketConfig, start: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            stable: config.stable_asset()?,
            collateral: config.collateral_asset()?,
            ledger: LedgerState::new(start),
            risk: RiskEngine::new(config.risk_params()?, config.limits.clone())?,
            access: AccessControl::new(config.owner(), config.operator()),
            sweep_sink: config.sweep_sink(),
        })
    }

    pub fn asset(&self, kind: AssetKind) -> &Asset {
        match kind {
            AssetKind::Stable => &self.stable,
            AssetKind::Collateral => &self.collateral,
        }
    }
}

/// One borrower's position with its derived risk figures
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionView {
    pub account: AccountId,
    pub collateral_amount: u128,
    pub collateral_value: u128,
    pub debt: u128,
    pub debt_shares: u128,
    pub original_principal: u128,
    pub health_factor: u128,
    pub status: PositionStatus,
    pub max_borrowable: u128,
    pub max_withdrawable: u128,
}

/// Market-wide figures at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketSummary {
    pub timestamp: u64,
    pub total_collateral: u128,
    pub total_debt: u128,
    pub total_debt_shares: u128,
    pub total_lp_shares: u128,
    pub total_lp_value: u128,
    pub pool_liquidity: u128,
    /// Borrowed share of LP funds, in bps
    pub utilization: u128,
    pub debt_multiplier: u128,
    pub lp_multiplier: u128,
    pub collateral_price: u128,
    pub ltv: u128,
    pub liquidation_threshold: u128,
    pub liquidation_bonus: u128,
    pub apr: u128,
    pub lp_apy: u128,
}

/// A single lending market and its collaborators.
///
/// Methods take `&mut self`: one transaction at a time. Wrap it in
/// [`crate::SharedMarket`] to share it between tasks.
pub struct LendingMarket<T: TokenTransfer> {
    state: MarketState,
    tokens: T,
    events: Box<dyn EventSink>,
    clock: Arc<dyn Clock>,
    correlation_id: Option<String>,
}

impl<T: TokenTransfer> LendingMarket<T> {
    pub fn new(state: MarketState, tokens: T, events: Box<dyn EventSink>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state,
            tokens,
            events,
            clock,
            correlation_id: None,
        }
    }

    pub fn state(&self) -> &MarketState {
        &self.state
    }

    pub fn ledger(&self) -> &LedgerState {
        &self.state.ledger
    }

    pub fn risk(&self) -> &RiskEngine {
        &self.state.risk
    }

    pub fn access(&self) -> &AccessControl {
        &self.state.access
    }

    pub fn tokens(&self) -> &T {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut T {
        &mut self.tokens
    }

    pub fn events(&self) -> &dyn EventSink {
        self.events.as_ref()
    }

    pub fn events_mut(&mut self) -> &mut dyn EventSink {
        self.events.as_mut()
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn stable_asset(&self) -> &Asset {
        &self.state.stable
    }

    pub fn collateral_asset(&self) -> &Asset {
        &self.state.collateral
    }

    pub fn trading_pair(&self) -> TradingPair {
        TradingPair::of(&self.state.collateral, &self.state.stable)
    }

    /// Tag the next journal record with `id` instead of a fresh UUID
    pub fn set_correlation_id(&mut self, id: impl Into<String>) {
        self.correlation_id = Some(id.into());
    }

    /// Run `op` against a snapshot; restore it if `op` fails
    fn atomically<R>(
        &mut self,
        operation: &'static str,
        op: impl FnOnce(&mut Self) -> Result<R, LendingError>,
    ) -> Result<R, LendingError> {
        let ledger = self.state.ledger.clone();
        let risk = self.state.risk.clone();

        let result = op(self);
        if let Err(ref e) = result {
            self.state.ledger = ledger;
            self.state.risk = risk;
            self.correlation_id = None;
            tracing::warn!(operation, error = %e, category = %e.category(), "Operation rejected");
        }
        result
    }

    /// Wallet-side parties must not be the market's own custody account
    fn require_external(account: &AccountId) -> Result<(), LendingError> {
        if *account == AccountId::market() {
            return Err(LendingError::CustodyAccount(account.clone()));
        }
        Ok(())
    }

    fn accrue(&mut self, now: u64) -> Result<(), LendingError> {
        let apr = self.state.risk.apr();
        self.state.ledger.accrue(now, apr)?;
        Ok(())
    }

    /// Append to the journal. The operation is already committed, so a
    /// sink failure is logged rather than returned.
    fn emit(&mut self, event: MarketEvent, now: u64) {
        let correlation_id = self
            .correlation_id
            .take()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        if let Err(e) = self.events.append(event, to_datetime(now), &correlation_id) {
            tracing::error!(error = %e, correlation_id, "Failed to journal committed event");
        }
    }

    // === Liquidity ===

    /// Deposit stable assets into the pool; returns LP shares minted
    pub fn deposit_liquidity(&mut self, caller: &AccountId, amount: u128) -> Result<u128, LendingError> {
        let now = self.now();
        let shares = self.atomically("deposit_liquidity", |m| {
            Self::require_external(caller)?;
            m.accrue(now)?;
            let shares = m.state.ledger.deposit_liquidity(caller, amount, now)?;
            m.tokens.transfer_from(AssetKind::Stable, caller, amount)?;
            Ok(shares)
        })?;

        tracing::info!(account = %caller, amount, shares, "Liquidity deposited");
        self.emit(
            MarketEvent::LiquidityDeposited {
                account: caller.clone(),
                amount,
                shares,
            },
            now,
        );
        Ok(shares)
    }

    /// Burn LP shares; returns the stable amount paid out
    pub fn withdraw_liquidity(&mut self, caller: &AccountId, shares: u128) -> Result<u128, LendingError> {
        let now = self.now();
        let amount = self.atomically("withdraw_liquidity", |m| {
            Self::require_external(caller)?;
            m.accrue(now)?;
            let amount = m.state.ledger.withdraw_liquidity(caller, shares, now)?;
            m.tokens.transfer(AssetKind::Stable, caller, amount)?;
            Ok(amount)
        })?;

        tracing::info!(account = %caller, shares, amount, "Liquidity withdrawn");
        self.emit(
            MarketEvent::LiquidityWithdrawn {
                account: caller.clone(),
                shares,
                amount,
            },
            now,
        );
        Ok(amount)
    }

    // === Borrowing ===

    pub fn deposit_collateral(&mut self, caller: &AccountId, amount: u128) -> Result<(), LendingError> {
        let now = self.now();
        self.atomically("deposit_collateral", |m| {
            Self::require_external(caller)?;
            m.accrue(now)?;
            m.state.ledger.deposit_collateral(caller, amount)?;
            m.tokens.transfer_from(AssetKind::Collateral, caller, amount)?;
            Ok(())
        })?;

        tracing::info!(account = %caller, amount, "Collateral deposited");
        self.emit(
            MarketEvent::CollateralDeposited {
                account: caller.clone(),
                amount,
            },
            now,
        );
        Ok(())
    }

    /// Borrow against collateral; returns the debt shares minted
    pub fn borrow(&mut self, caller: &AccountId, amount: u128) -> Result<u128, LendingError> {
        let now = self.now();
        let shares = self.atomically("borrow", |m| {
            Self::require_external(caller)?;
            m.accrue(now)?;
            m.state.risk.check_borrow(&m.state.ledger, caller, amount, now)?;
            let shares = m.state.ledger.borrow(caller, amount, now)?;
            m.tokens.transfer(AssetKind::Stable, caller, amount)?;
            Ok(shares)
        })?;

        tracing::info!(account = %caller, amount, shares, "Borrowed");
        self.emit(
            MarketEvent::Borrowed {
                account: caller.clone(),
                amount,
                shares,
            },
            now,
        );
        Ok(shares)
    }

    /// Repay up to the current debt
    pub fn repay(&mut self, caller: &AccountId, amount: u128) -> Result<DebtReduction, LendingError> {
        let now = self.now();
        let reduction = self.atomically("repay", |m| {
            Self::require_external(caller)?;
            m.accrue(now)?;
            let reduction = m.state.ledger.repay(caller, amount, now)?;
            m.tokens.transfer_from(AssetKind::Stable, caller, amount)?;
            Ok(reduction)
        })?;

        tracing::info!(
            account = %caller,
            amount,
            shares_removed = reduction.shares_removed,
            closed = reduction.closed,
            "Repaid"
        );
        self.emit(
            MarketEvent::Repaid {
                account: caller.clone(),
                amount,
                shares_removed: reduction.shares_removed,
                closed: reduction.closed,
            },
            now,
        );
        Ok(reduction)
    }

    pub fn withdraw_collateral(&mut self, caller: &AccountId, amount: u128) -> Result<(), LendingError> {
        let now = self.now();
        self.atomically("withdraw_collateral", |m| {
            Self::require_external(caller)?;
            m.accrue(now)?;
            m.state.risk.check_withdraw(&m.state.ledger, caller, amount, now)?;
            m.state.ledger.withdraw_collateral(caller, amount)?;
            m.tokens.transfer(AssetKind::Collateral, caller, amount)?;
            Ok(())
        })?;

        tracing::info!(account = %caller, amount, "Collateral withdrawn");
        self.emit(
            MarketEvent::CollateralWithdrawn {
                account: caller.clone(),
                amount,
            },
            now,
        );
        Ok(())
    }

    /// Repay `debt_amount` of `user`'s debt in exchange for collateral at
    /// a bonus; returns the collateral seized
    pub fn liquidate(
        &mut self,
        caller: &AccountId,
        user: &AccountId,
        debt_amount: u128,
    ) -> Result<u128, LendingError> {
        let now = self.now();
        let (quote, closed) = self.atomically("liquidate", |m| {
            Self::require_external(caller)?;
            Self::require_external(user)?;
            m.accrue(now)?;
            let quote = m
                .state
                .risk
                .quote_liquidation(&m.state.ledger, user, debt_amount, now)?;
            let reduction = m.state.ledger.liquidate(user, debt_amount, quote.payout, now)?;

            m.tokens.transfer_from(AssetKind::Stable, caller, debt_amount)?;
            if let Err(e) = m.tokens.transfer(AssetKind::Collateral, caller, quote.payout) {
                // give the liquidator their stable back before unwinding
                if let Err(refund) = m.tokens.transfer(AssetKind::Stable, caller, debt_amount) {
                    tracing::error!(liquidator = %caller, error = %refund, "Liquidation refund failed");
                }
                return Err(e.into());
            }
            Ok((quote, reduction.closed))
        })?;
        let payout = quote.payout;
        let bonus = quote.bonus_collateral();

        tracing::info!(
            liquidator = %caller,
            user = %user,
            debt_amount,
            collateral_seized = payout,
            bonus,
            closed,
            "Position liquidated"
        );
        self.emit(
            MarketEvent::Liquidated {
                liquidator: caller.clone(),
                user: user.clone(),
                debt_amount,
                collateral_seized: payout,
                bonus,
                closed,
            },
            now,
        );
        Ok(payout)
    }

    // === Governance ===

    /// Owner or operator; bounded by the price circuit breaker
    pub fn set_price(&mut self, caller: &AccountId, price: u128) -> Result<(), LendingError> {
        let now = self.now();
        self.state.access.require_operator(caller)?;
        let old = self.atomically("set_price", |m| Ok(m.state.risk.set_price(price)?))?;
        self.emit(MarketEvent::PriceUpdated { old, new: price }, now);
        Ok(())
    }

    /// Owner or operator; accrues under the old rate first
    pub fn set_apr(&mut self, caller: &AccountId, apr: u128) -> Result<(), LendingError> {
        let now = self.now();
        self.state.access.require_operator(caller)?;
        let old = self.atomically("set_apr", |m| {
            Ok(m.state.risk.set_apr(&mut m.state.ledger, apr, now)?)
        })?;
        self.emit(MarketEvent::AprUpdated { old, new: apr }, now);
        Ok(())
    }

    pub fn set_ltv(&mut self, caller: &AccountId, ltv: u128) -> Result<(), LendingError> {
        let now = self.now();
        self.state.access.require_owner(caller)?;
        let old = self.atomically("set_ltv", |m| Ok(m.state.risk.set_ltv(ltv)?))?;
        self.emit(MarketEvent::LtvUpdated { old, new: ltv }, now);
        Ok(())
    }

    pub fn set_liquidation_threshold(&mut self, caller: &AccountId, threshold: u128) -> Result<(), LendingError> {
        let now = self.now();
        self.state.access.require_owner(caller)?;
        let old = self.atomically("set_liquidation_threshold", |m| {
            Ok(m.state.risk.set_liquidation_threshold(threshold)?)
        })?;
        self.emit(
            MarketEvent::LiquidationThresholdUpdated { old, new: threshold },
            now,
        );
        Ok(())
    }

    pub fn set_liquidation_bonus(&mut self, caller: &AccountId, bonus: u128) -> Result<(), LendingError> {
        let now = self.now();
        self.state.access.require_owner(caller)?;
        let old = self.atomically("set_liquidation_bonus", |m| {
            Ok(m.state.risk.set_liquidation_bonus(bonus)?)
        })?;
        self.emit(MarketEvent::LiquidationBonusUpdated { old, new: bonus }, now);
        Ok(())
    }

    pub fn set_operator(&mut self, caller: &AccountId, operator: Option<AccountId>) -> Result<(), LendingError> {
        let now = self.now();
        self.state.access.require_owner(caller)?;
        let old = self.state.access.set_operator(operator.clone());
        tracing::info!(old = ?old, new = ?operator, "Operator updated");
        self.emit(MarketEvent::OperatorUpdated { old, new: operator }, now);
        Ok(())
    }

    /// Send tokens the market holds beyond what it owes to the sweep sink.
    ///
    /// Owed is `pool_liquidity` for the stable asset and
    /// `total_collateral` for the collateral asset.
    pub fn sweep_surplus(&mut self, caller: &AccountId, asset: AssetKind) -> Result<u128, LendingError> {
        let now = self.now();
        self.state.access.require_owner(caller)?;
        let sink = self.state.sweep_sink.clone();

        let surplus = self.atomically("sweep_surplus", |m| {
            let held = m.tokens.balance_of(asset, &AccountId::market());
            let owed = match asset {
                AssetKind::Stable => m.state.ledger.pool_liquidity(),
                AssetKind::Collateral => m.state.ledger.total_collateral(),
            };
            let surplus = held.saturating_sub(owed);
            if surplus == 0 {
                return Err(LendingError::NoSurplus(asset));
            }
            m.tokens.transfer(asset, &sink, surplus)?;
            Ok(surplus)
        })?;

        tracing::info!(%asset, amount = surplus, sink = %sink, "Surplus swept");
        self.emit(
            MarketEvent::SurplusSwept {
                asset,
                amount: surplus,
                sink,
            },
            now,
        );
        Ok(surplus)
    }

    /// Set the price from an oracle quote (still subject to the breaker)
    pub fn apply_quote(&mut self, caller: &AccountId, quote: &PriceQuote) -> Result<u128, LendingError> {
        let pair = self.trading_pair();
        if quote.pair != pair {
            return Err(LendingError::Oracle(OracleError::PairNotFound {
                pair: quote.pair.to_string(),
            }));
        }
        let price = quote.to_native(&self.state.stable)?;
        self.set_price(caller, price)?;
        Ok(price)
    }

    // === Views ===

    pub fn current_debt(&self, user: &AccountId) -> Result<u128, LendingError> {
        Ok(self.state.ledger.current_debt(user, self.now(), self.state.risk.apr())?)
    }

    pub fn max_borrowable(&self, user: &AccountId) -> Result<u128, LendingError> {
        Ok(self.state.risk.max_borrowable(&self.state.ledger, user, self.now())?)
    }

    pub fn max_withdrawable(&self, user: &AccountId) -> Result<u128, LendingError> {
        Ok(self.state.risk.max_withdrawable(&self.state.ledger, user, self.now())?)
    }

    pub fn health_factor(&self, user: &AccountId) -> Result<u128, LendingError> {
        Ok(self.state.risk.health_factor(&self.state.ledger, user, self.now())?)
    }

    /// Stable value of `shares` if redeemed now
    pub fn lp_value(&self, shares: u128) -> Result<u128, LendingError> {
        let multiplier = self
            .state
            .ledger
            .current_lp_multiplier(self.now(), self.state.risk.apr())?;
        Ok(LiquidityPool::lp_value(shares, multiplier)?)
    }

    /// LP yield in bps
    pub fn lp_apy(&self) -> Result<u128, LendingError> {
        Ok(self.state.risk.lp_apy(&self.state.ledger, self.now())?)
    }

    pub fn position(&self, user: &AccountId) -> Option<&Position> {
        self.state.ledger.position(user)
    }

    pub fn lp_balance(&self, user: &AccountId) -> u128 {
        self.state.ledger.pool().balance_of(user)
    }

    pub fn status(&self, user: &AccountId) -> Result<PositionStatus, LendingError> {
        Ok(self.state.risk.status(&self.state.ledger, user, self.now())?)
    }

    /// Positions below the liquidation threshold with their health factor
    pub fn liquidatable_positions(&self) -> Result<Vec<(AccountId, u128)>, LendingError> {
        Ok(self.state.risk.liquidatable_positions(&self.state.ledger, self.now())?)
    }

    pub fn position_view(&self, user: &AccountId) -> Result<PositionView, LendingError> {
        let position = self.position(user).cloned().unwrap_or_default();
        Ok(PositionView {
            account: user.clone(),
            collateral_amount: position.collateral_amount,
            collateral_value: self.state.risk.collateral_value(position.collateral_amount)?,
            debt: self.current_debt(user)?,
            debt_shares: position.debt_shares,
            original_principal: position.original_principal,
            health_factor: self.health_factor(user)?,
            status: self.status(user)?,
            max_borrowable: self.max_borrowable(user)?,
            max_withdrawable: self.max_withdrawable(user)?,
        })
    }

    pub fn summary(&self) -> Result<MarketSummary, LendingError> {
        let now = self.now();
        let apr = self.state.risk.apr();
        let ledger = &self.state.ledger;
        let params = self.state.risk.params();

        let debt_multiplier = ledger.current_debt_multiplier(now, apr)?;
        let lp_multiplier = ledger.current_lp_multiplier(now, apr)?;
        let total_debt = ledger.total_debt(now, apr)?;
        let total_lp_value = LiquidityPool::lp_value(ledger.total_lp_shares(), lp_multiplier)?;
        let funds = ledger.pool_liquidity().saturating_add(total_debt);
        let utilization = if funds == 0 {
            0
        } else {
            lendpool_core::math::mul_div_floor(total_debt, lendpool_core::PRECISION_BASE, funds)?
        };

        Ok(MarketSummary {
            timestamp: now,
            total_collateral: ledger.total_collateral(),
            total_debt,
            total_debt_shares: ledger.total_debt_shares(),
            total_lp_shares: ledger.total_lp_shares(),
            total_lp_value,
            pool_liquidity: ledger.pool_liquidity(),
            utilization,
            debt_multiplier,
            lp_multiplier,
            collateral_price: params.collateral_price,
            ltv: params.ltv,
            liquidation_threshold: params.liquidation_threshold,
            liquidation_bonus: params.liquidation_bonus,
            apr,
            lp_apy: self.state.risk.lp_apy(ledger, now)?,
        })
    }

    /// Ledger bookkeeping plus custody: the market must hold at least what
    /// it owes in each asset
    pub fn verify(&self) -> Result<(), LendingError> {
        self.state.ledger.verify_invariants()?;
        for (asset, owed) in [
            (AssetKind::Stable, self.state.ledger.pool_liquidity()),
            (AssetKind::Collateral, self.state.ledger.total_collateral()),
        ] {
            let held = self.tokens.balance_of(asset, &AccountId::market());
            if held < owed {
                return Err(lendpool_ledger::LedgerError::Inconsistent(format!(
                    "market holds {held} {asset} but owes {owed}"
                ))
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AuthorizationError;
    use crate::clock::ManualClock;
    use crate::transfer::{InMemoryTokenBank, TransferError};
    use lendpool_core::{ErrorCategory, SECONDS_PER_YEAR};
    use lendpool_events::MemorySink;
    use lendpool_risk::{GovernanceLimits, RiskError, RiskParams};

    const YEAR: u64 = SECONDS_PER_YEAR as u64;

    fn owner() -> AccountId {
        AccountId::new("owner")
    }
    fn alice() -> AccountId {
        AccountId::new("alice")
    }
    fn bob() -> AccountId {
        AccountId::new("bob")
    }
    fn carol() -> AccountId {
        AccountId::new("carol")
    }

    /// 100 USD per GOLD (2 decimals): collateral value == native amount
    fn state() -> MarketState {
        MarketState {
            stable: Asset::new("USD", 0).unwrap(),
            collateral: Asset::new("GOLD", 2).unwrap(),
            ledger: LedgerState::new(0),
            risk: RiskEngine::new(
                RiskParams {
                    collateral_price: 100,
                    collateral_scale: 100,
                    ltv: 5_000,
                    liquidation_threshold: 7_500,
                    liquidation_bonus: 500,
                    apr: 500,
                    last_apr_update: None,
                },
                GovernanceLimits {
                    max_price_change_bps: 5_000,
                    ..GovernanceLimits::default()
                },
            )
            .unwrap(),
            access: AccessControl::new(owner(), None),
            sweep_sink: AccountId::new("treasury"),
        }
    }

    fn market() -> (LendingMarket<InMemoryTokenBank>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let mut bank = InMemoryTokenBank::new();
        for user in [alice(), bob(), carol()] {
            bank.mint(AssetKind::Stable, &user, 100_000).unwrap();
            bank.mint(AssetKind::Collateral, &user, 100_000).unwrap();
        }
        let market = LendingMarket::new(state(), bank, Box::new(MemorySink::new()), clock.clone());
        (market, clock)
    }

    #[test]
    fn test_borrow_flow_moves_tokens() {
        let (mut m, _) = market();
        m.deposit_liquidity(&bob(), 10_000).unwrap();
        m.deposit_collateral(&alice(), 1_000).unwrap();
        m.borrow(&alice(), 500).unwrap();

        assert_eq!(m.tokens().balance_of(AssetKind::Stable, &alice()), 100_500);
        assert_eq!(m.tokens().balance_of(AssetKind::Collateral, &alice()), 99_000);
        assert_eq!(m.ledger().pool_liquidity(), 9_500);
        assert_eq!(m.events().last_record().map(|r| r.sequence), Some(3));
        m.verify().unwrap();
    }

    #[test]
    fn test_rejected_borrow_leaves_no_trace() {
        let (mut m, clock) = market();
        m.deposit_liquidity(&bob(), 10_000).unwrap();
        m.deposit_collateral(&alice(), 1_000).unwrap();
        clock.set(100);
        let before = m.state().clone();

        let result = m.borrow(&alice(), 501);
        assert!(matches!(
            result,
            Err(LendingError::Risk(RiskError::BorrowExceedsLtv { .. }))
        ));
        // not even the accrual refresh survived
        assert_eq!(m.state(), &before);
        assert_eq!(m.events().last_record().map(|r| r.sequence), Some(2));
    }

    #[test]
    fn test_transfer_failure_rolls_back_ledger() {
        let (mut m, _) = market();
        m.deposit_liquidity(&bob(), 10_000).unwrap();
        let before = m.state().clone();

        // dave has no tokens: the ledger mutation must be undone
        let result = m.deposit_collateral(&AccountId::new("dave"), 10);
        assert!(matches!(
            result,
            Err(LendingError::Transfer(TransferError::InsufficientBalance { .. }))
        ));
        assert_eq!(m.state(), &before);
        assert!(m.position(&AccountId::new("dave")).is_none());
    }

    #[test]
    fn test_interest_and_full_repay() {
        let (mut m, clock) = market();
        m.deposit_liquidity(&bob(), 10_000).unwrap();
        m.deposit_collateral(&alice(), 4_000).unwrap();
        m.borrow(&alice(), 1_000).unwrap();

        clock.set(YEAR);
        let debt = m.current_debt(&alice()).unwrap();
        assert_eq!(debt, 1_050);

        let reduction = m.repay(&alice(), debt).unwrap();
        assert!(reduction.closed);
        assert_eq!(m.current_debt(&alice()).unwrap(), 0);
        assert_eq!(m.status(&alice()).unwrap(), PositionStatus::Collateralized);

        m.withdraw_collateral(&alice(), 4_000).unwrap();
        assert_eq!(m.status(&alice()).unwrap(), PositionStatus::Empty);
        m.verify().unwrap();
    }

    #[test]
    fn test_liquidation_pays_bonus() {
        let (mut m, _) = market();
        m.deposit_liquidity(&bob(), 10_000).unwrap();
        m.deposit_collateral(&alice(), 1_000).unwrap();
        m.borrow(&alice(), 500).unwrap();

        assert!(matches!(
            m.liquidate(&carol(), &alice(), 100),
            Err(LendingError::Risk(RiskError::PositionHealthy(_)))
        ));

        // price halves: value 500, 500 * 0.75 < 500
        m.set_price(&owner(), 50).unwrap();
        assert_eq!(m.status(&alice()).unwrap(), PositionStatus::Liquidatable);
        assert_eq!(m.liquidatable_positions().unwrap().len(), 1);

        // 200 at 0.5 per unit -> 400, +5% -> 420
        let seized = m.liquidate(&carol(), &alice(), 200).unwrap();
        assert_eq!(seized, 420);
        assert_eq!(m.tokens().balance_of(AssetKind::Collateral, &carol()), 100_420);
        assert_eq!(m.tokens().balance_of(AssetKind::Stable, &carol()), 99_800);

        let position = m.position(&alice()).unwrap();
        assert_eq!(position.collateral_amount, 580);
        assert_eq!(m.current_debt(&alice()).unwrap(), 300);
        assert_eq!(m.ledger().pool_liquidity(), 9_700);
        assert!(matches!(
            m.events().last_record().map(|r| &r.event),
            Some(MarketEvent::Liquidated { bonus: 20, closed: false, .. })
        ));
        m.verify().unwrap();
    }

    #[test]
    fn test_liquidation_over_debt_rejected() {
        let (mut m, _) = market();
        m.deposit_liquidity(&bob(), 10_000).unwrap();
        m.deposit_collateral(&alice(), 1_000).unwrap();
        m.borrow(&alice(), 500).unwrap();
        m.set_price(&owner(), 50).unwrap();
        let before = m.state().clone();

        assert!(matches!(
            m.liquidate(&carol(), &alice(), 501),
            Err(LendingError::Risk(RiskError::LiquidationExceedsDebt { .. }))
        ));
        assert_eq!(m.state(), &before);
    }

    #[test]
    fn test_admin_calls_require_roles() {
        let (mut m, _) = market();

        let result = m.set_ltv(&alice(), 6_000);
        assert!(matches!(
            result,
            Err(LendingError::Unauthorized(AuthorizationError::NotOwner { .. }))
        ));
        assert_eq!(result.unwrap_err().category(), ErrorCategory::Authorization);

        assert!(m.set_price(&alice(), 110).is_err());
        m.set_operator(&owner(), Some(alice())).unwrap();
        assert!(m.set_price(&alice(), 110).is_ok());
        assert!(m.set_ltv(&alice(), 6_000).is_err());
        assert!(m.set_ltv(&owner(), 6_000).is_ok());
        assert_eq!(m.risk().params().ltv, 6_000);
    }

    #[test]
    fn test_sweep_only_takes_surplus() {
        let (mut m, _) = market();
        m.deposit_liquidity(&bob(), 1_000).unwrap();

        assert!(matches!(
            m.sweep_surplus(&owner(), AssetKind::Stable),
            Err(LendingError::NoSurplus(AssetKind::Stable))
        ));

        // someone sends tokens straight to the market
        m.tokens_mut()
            .move_tokens(AssetKind::Stable, &carol(), &AccountId::market(), 250)
            .unwrap();
        assert_eq!(m.sweep_surplus(&owner(), AssetKind::Stable).unwrap(), 250);
        assert_eq!(
            m.tokens().balance_of(AssetKind::Stable, &AccountId::new("treasury")),
            250
        );
        assert_eq!(m.withdraw_liquidity(&bob(), 1_000).unwrap(), 1_000);
    }

    #[test]
    fn test_summary() {
        let (mut m, _) = market();
        m.deposit_liquidity(&bob(), 10_000).unwrap();
        m.deposit_collateral(&alice(), 10_000).unwrap();
        m.borrow(&alice(), 2_500).unwrap();

        let summary = m.summary().unwrap();
        assert_eq!(summary.total_debt, 2_500);
        assert_eq!(summary.pool_liquidity, 7_500);
        assert_eq!(summary.utilization, 2_500);
        assert_eq!(summary.lp_apy, 125);
        assert_eq!(summary.total_lp_value, 10_000);
    }
}
