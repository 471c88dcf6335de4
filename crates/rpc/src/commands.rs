//! CLI commands

use anyhow::Context;
use lendpool_core::{AccountId, Asset, AssetKind};
use lendpool_events::EventReader;
use lendpool_risk::{HEALTH_FACTOR_ONE, INFINITE_HEALTH_FACTOR};
use rust_decimal::Decimal;

use crate::context::AppContext;
use crate::transfer::TokenTransfer;

fn amount(asset: &Asset, native: u128) -> String {
    match asset.to_decimal(native) {
        Ok(value) => format!("{} {}", value, asset),
        Err(_) => format!("{} {} (native)", native, asset),
    }
}

fn bps(value: u128) -> String {
    match i64::try_from(value) {
        Ok(v) => format!("{}%", Decimal::new(v, 2)),
        Err(_) => format!("{} bps", value),
    }
}

fn health(factor: u128) -> String {
    if factor == INFINITE_HEALTH_FACTOR {
        return "∞".to_string();
    }
    let scale = HEALTH_FACTOR_ONE.ilog10();
    i64::try_from(factor)
        .map(|v| Decimal::new(v, scale).round_dp(4).to_string())
        .unwrap_or_else(|_| format!("{} (raw)", factor))
}

/// Fund a simulated wallet
pub fn mint(ctx: &mut AppContext, user: &str, asset: AssetKind, value: Decimal) -> anyhow::Result<()> {
    let user = AccountId::new(user);
    let token = ctx.market.state().asset(asset).clone();
    let native = token.to_native(value)?;

    ctx.market.tokens_mut().mint(asset, &user, native)?;
    ctx.save()?;

    println!("✅ Minted {} to {}", amount(&token, native), user);
    Ok(())
}

/// Supply stable liquidity
pub fn deposit_liquidity(ctx: &mut AppContext, user: &str, value: Decimal) -> anyhow::Result<()> {
    let user = AccountId::new(user);
    let stable = ctx.market.stable_asset().clone();
    let native = stable.to_native(value)?;

    let shares = ctx.market.deposit_liquidity(&user, native)?;
    ctx.save()?;

    println!(
        "✅ {} supplied {} for {} LP shares",
        user,
        amount(&stable, native),
        shares
    );
    Ok(())
}

/// Redeem LP shares; `None` redeems the whole balance
pub fn withdraw_liquidity(ctx: &mut AppContext, user: &str, shares: Option<u128>) -> anyhow::Result<()> {
    let user = AccountId::new(user);
    let shares = shares.unwrap_or_else(|| ctx.market.lp_balance(&user));
    if shares == 0 {
        anyhow::bail!("{} holds no LP shares", user);
    }

    let paid = ctx.market.withdraw_liquidity(&user, shares)?;
    ctx.save()?;

    println!(
        "✅ {} redeemed {} LP shares for {}",
        user,
        shares,
        amount(ctx.market.stable_asset(), paid)
    );
    Ok(())
}

pub fn deposit_collateral(ctx: &mut AppContext, user: &str, value: Decimal) -> anyhow::Result<()> {
    let user = AccountId::new(user);
    let collateral = ctx.market.collateral_asset().clone();
    let native = collateral.to_native(value)?;

    ctx.market.deposit_collateral(&user, native)?;
    ctx.save()?;

    println!("✅ {} deposited {} as collateral", user, amount(&collateral, native));
    Ok(())
}

pub fn borrow(ctx: &mut AppContext, user: &str, value: Decimal) -> anyhow::Result<()> {
    let user = AccountId::new(user);
    let stable = ctx.market.stable_asset().clone();
    let native = stable.to_native(value)?;

    ctx.market.borrow(&user, native)?;
    ctx.save()?;

    println!(
        "✅ {} borrowed {} (debt now {})",
        user,
        amount(&stable, native),
        amount(&stable, ctx.market.current_debt(&user)?)
    );
    Ok(())
}

/// Repay debt; `None` repays everything owed now
pub fn repay(ctx: &mut AppContext, user: &str, value: Option<Decimal>) -> anyhow::Result<()> {
    let user = AccountId::new(user);
    let stable = ctx.market.stable_asset().clone();
    let native = match value {
        Some(v) => stable.to_native(v)?,
        None => ctx.market.current_debt(&user)?,
    };
    if native == 0 {
        anyhow::bail!("{} has no debt to repay", user);
    }

    let reduction = ctx.market.repay(&user, native)?;
    ctx.save()?;

    if reduction.closed {
        println!("✅ {} repaid {} and closed the loan", user, amount(&stable, native));
    } else {
        println!(
            "✅ {} repaid {} (debt now {})",
            user,
            amount(&stable, native),
            amount(&stable, ctx.market.current_debt(&user)?)
        );
    }
    Ok(())
}

pub fn withdraw_collateral(ctx: &mut AppContext, user: &str, value: Decimal) -> anyhow::Result<()> {
    let user = AccountId::new(user);
    let collateral = ctx.market.collateral_asset().clone();
    let native = collateral.to_native(value)?;

    ctx.market.withdraw_collateral(&user, native)?;
    ctx.save()?;

    println!("✅ {} withdrew {} of collateral", user, amount(&collateral, native));
    Ok(())
}

pub fn liquidate(ctx: &mut AppContext, liquidator: &str, user: &str, value: Decimal) -> anyhow::Result<()> {
    let liquidator = AccountId::new(liquidator);
    let user = AccountId::new(user);
    let stable = ctx.market.stable_asset().clone();
    let native = stable.to_native(value)?;

    let seized = ctx.market.liquidate(&liquidator, &user, native)?;
    ctx.save()?;

    println!(
        "✅ {} repaid {} of {}'s debt and seized {}",
        liquidator,
        amount(&stable, native),
        user,
        amount(ctx.market.collateral_asset(), seized)
    );
    Ok(())
}

/// Set the collateral price, quoted in the stable asset per whole collateral token
pub fn set_price(ctx: &mut AppContext, caller: &str, price: Decimal) -> anyhow::Result<()> {
    let caller = AccountId::new(caller);
    let native = ctx.market.stable_asset().to_native(price)?;

    ctx.market.set_price(&caller, native)?;
    ctx.save()?;

    println!(
        "✅ {} price set to {} {}",
        ctx.market.collateral_asset(),
        price,
        ctx.market.stable_asset()
    );
    Ok(())
}

pub fn set_apr(ctx: &mut AppContext, caller: &str, apr: u128) -> anyhow::Result<()> {
    let caller = AccountId::new(caller);
    ctx.market.set_apr(&caller, apr)?;
    ctx.save()?;
    println!("✅ APR set to {}", bps(apr));
    Ok(())
}

pub fn set_ltv(ctx: &mut AppContext, caller: &str, ltv: u128) -> anyhow::Result<()> {
    let caller = AccountId::new(caller);
    ctx.market.set_ltv(&caller, ltv)?;
    ctx.save()?;
    println!("✅ LTV set to {}", bps(ltv));
    Ok(())
}

pub fn set_threshold(ctx: &mut AppContext, caller: &str, threshold: u128) -> anyhow::Result<()> {
    let caller = AccountId::new(caller);
    ctx.market.set_liquidation_threshold(&caller, threshold)?;
    ctx.save()?;
    println!("✅ Liquidation threshold set to {}", bps(threshold));
    Ok(())
}

pub fn set_bonus(ctx: &mut AppContext, caller: &str, bonus: u128) -> anyhow::Result<()> {
    let caller = AccountId::new(caller);
    ctx.market.set_liquidation_bonus(&caller, bonus)?;
    ctx.save()?;
    println!("✅ Liquidation bonus set to {}", bps(bonus));
    Ok(())
}

pub fn set_operator(ctx: &mut AppContext, caller: &str, operator: Option<&str>) -> anyhow::Result<()> {
    let caller = AccountId::new(caller);
    let operator = operator.map(AccountId::new);
    ctx.market.set_operator(&caller, operator.clone())?;
    ctx.save()?;

    match operator {
        Some(op) => println!("✅ Operator set to {}", op),
        None => println!("✅ Operator removed"),
    }
    Ok(())
}

pub fn sweep(ctx: &mut AppContext, caller: &str, asset: AssetKind) -> anyhow::Result<()> {
    let caller = AccountId::new(caller);
    let swept = ctx.market.sweep_surplus(&caller, asset)?;
    ctx.save()?;

    let state = ctx.market.state();
    println!(
        "✅ Swept {} to {}",
        amount(state.asset(asset), swept),
        state.sweep_sink
    );
    Ok(())
}

/// Show one account's position and LP holdings
pub fn position(ctx: &AppContext, user: &str) -> anyhow::Result<()> {
    let user = AccountId::new(user);
    let view = ctx.market.position_view(&user)?;
    let stable = ctx.market.stable_asset();
    let collateral = ctx.market.collateral_asset();

    println!("Position for {} ({})", user, view.status);
    println!("  Collateral:       {}", amount(collateral, view.collateral_amount));
    println!("  Collateral value: {}", amount(stable, view.collateral_value));
    println!("  Debt:             {}", amount(stable, view.debt));
    println!("  Principal:        {}", amount(stable, view.original_principal));
    println!("  Health factor:    {}", health(view.health_factor));
    println!("  Max borrowable:   {}", amount(stable, view.max_borrowable));
    println!("  Max withdrawable: {}", amount(collateral, view.max_withdrawable));

    let lp_shares = ctx.market.lp_balance(&user);
    if lp_shares > 0 {
        println!(
            "  LP shares:        {} (worth {})",
            lp_shares,
            amount(stable, ctx.market.lp_value(lp_shares)?)
        );
    }

    println!(
        "  Wallet:           {}, {}",
        amount(stable, ctx.market.tokens().balance_of(AssetKind::Stable, &user)),
        amount(collateral, ctx.market.tokens().balance_of(AssetKind::Collateral, &user))
    );
    Ok(())
}

/// Show market totals, parameters and unhealthy positions
pub fn market(ctx: &AppContext) -> anyhow::Result<()> {
    let summary = ctx.market.summary()?;
    let stable = ctx.market.stable_asset();
    let collateral = ctx.market.collateral_asset();

    println!("Market {}/{} at t={}", collateral, stable, summary.timestamp);
    println!("{:-<60}", "");
    println!("  Pool liquidity:   {}", amount(stable, summary.pool_liquidity));
    println!("  Total debt:       {}", amount(stable, summary.total_debt));
    println!("  LP value:         {}", amount(stable, summary.total_lp_value));
    println!("  Collateral:       {}", amount(collateral, summary.total_collateral));
    println!("  Utilization:      {}", bps(summary.utilization));
    println!("  Price:            {}", amount(stable, summary.collateral_price));
    println!(
        "  LTV / threshold:  {} / {}",
        bps(summary.ltv),
        bps(summary.liquidation_threshold)
    );
    println!("  Bonus:            {}", bps(summary.liquidation_bonus));
    println!("  APR / LP APY:     {} / {}", bps(summary.apr), bps(summary.lp_apy));
    println!("{:-<60}", "");

    let liquidatable = ctx.market.liquidatable_positions()?;
    if liquidatable.is_empty() {
        println!("No liquidatable positions");
    } else {
        println!("Liquidatable positions:");
        for (account, factor) in liquidatable {
            println!("  {:<20} health {}", account.as_str(), health(factor));
        }
    }
    Ok(())
}

/// Verify the journal hash chain and the ledger invariants
pub fn audit(ctx: &AppContext) -> anyhow::Result<()> {
    let journal = AppContext::journal_path(ctx.data_path());
    let reader = EventReader::from_directory(&journal)?;

    match reader.verify() {
        Ok(count) => println!("✅ Hash chain verified ({} events)", count),
        Err(e) => {
            println!("❌ Hash chain broken: {}", e);
            return Ok(());
        }
    }

    ctx.market
        .verify()
        .context("ledger invariants do not hold")?;
    println!("✅ Ledger invariants hold, custody covers all owed funds");
    Ok(())
}
