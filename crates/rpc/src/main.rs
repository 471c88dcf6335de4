//! LendPool CLI - Main entry point

use clap::{Parser, Subcommand};
use lendpool_core::AssetKind;
use lendpool_rpc::{commands, AppContext, Clock, ManualClock, MarketConfig, SystemClock};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "lendpool")]
#[command(about = "LendPool - collateralized lending market", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// Market time in unix seconds (defaults to the system clock)
    #[arg(long, global = true)]
    at: Option<u64>,

    /// Optional correlation ID for the journal record
    #[arg(long, global = true)]
    correlation_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new market
    Init {
        /// Market configuration (JSON); built-in defaults when omitted
        #[arg(long, env = "LENDPOOL_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Credit a simulated wallet
    Mint {
        user: String,
        /// stable or collateral
        asset: AssetKind,
        amount: Decimal,
    },

    /// Supply stable liquidity for LP shares
    DepositLiquidity { user: String, amount: Decimal },

    /// Redeem LP shares
    WithdrawLiquidity {
        user: String,
        /// Shares to redeem; the whole balance when omitted
        shares: Option<u128>,
    },

    /// Pledge collateral
    DepositCollateral { user: String, amount: Decimal },

    /// Borrow the stable asset
    Borrow { user: String, amount: Decimal },

    /// Repay debt
    Repay {
        user: String,
        /// Amount to repay; the full debt when omitted
        amount: Option<Decimal>,
    },

    /// Withdraw pledged collateral
    WithdrawCollateral { user: String, amount: Decimal },

    /// Repay part of an unhealthy position's debt and seize collateral
    Liquidate {
        liquidator: String,
        user: String,
        /// Debt to repay, in the stable asset
        amount: Decimal,
    },

    /// Set the collateral price (stable per whole collateral token)
    SetPrice { caller: String, price: Decimal },

    /// Set the borrow APR (basis points)
    SetApr { caller: String, apr: u128 },

    /// Set the loan-to-value ratio (basis points)
    SetLtv { caller: String, ltv: u128 },

    /// Set the liquidation threshold (basis points)
    SetThreshold { caller: String, threshold: u128 },

    /// Set the liquidation bonus (basis points)
    SetBonus { caller: String, bonus: u128 },

    /// Assign or clear the operator
    SetOperator {
        caller: String,
        /// New operator; clears the role when omitted
        operator: Option<String>,
    },

    /// Forward tokens above the ledger's entitlement to the sweep sink
    Sweep {
        caller: String,
        /// stable or collateral
        asset: AssetKind,
    },

    /// Show a user's position
    Position { user: String },

    /// Show market totals and parameters
    Market,

    /// Verify the journal hash chain and ledger invariants
    Audit,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let clock: Arc<dyn Clock> = match cli.at {
        Some(at) => Arc::new(ManualClock::new(at)),
        None => Arc::new(SystemClock),
    };

    if let Commands::Init { config } = &cli.command {
        let config = match config {
            Some(path) => MarketConfig::from_file(path)?,
            None => MarketConfig::default(),
        };
        let ctx = AppContext::init(&cli.data, &config, clock)?;
        println!(
            "✅ Market {}/{} initialized in {}",
            ctx.market.collateral_asset(),
            ctx.market.stable_asset(),
            ctx.data_path().display()
        );
        return Ok(());
    }

    let mut ctx = AppContext::open(&cli.data, clock)?;
    let correlation_id = cli.correlation_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    ctx.market.set_correlation_id(correlation_id);

    match cli.command {
        Commands::Init { .. } => {}

        Commands::Mint { user, asset, amount } => {
            commands::mint(&mut ctx, &user, asset, amount)?;
        }

        Commands::DepositLiquidity { user, amount } => {
            commands::deposit_liquidity(&mut ctx, &user, amount)?;
        }

        Commands::WithdrawLiquidity { user, shares } => {
            commands::withdraw_liquidity(&mut ctx, &user, shares)?;
        }

        Commands::DepositCollateral { user, amount } => {
            commands::deposit_collateral(&mut ctx, &user, amount)?;
        }

        Commands::Borrow { user, amount } => {
            commands::borrow(&mut ctx, &user, amount)?;
        }

        Commands::Repay { user, amount } => {
            commands::repay(&mut ctx, &user, amount)?;
        }

        Commands::WithdrawCollateral { user, amount } => {
            commands::withdraw_collateral(&mut ctx, &user, amount)?;
        }

        Commands::Liquidate {
            liquidator,
            user,
            amount,
        } => {
            commands::liquidate(&mut ctx, &liquidator, &user, amount)?;
        }

        Commands::SetPrice { caller, price } => {
            commands::set_price(&mut ctx, &caller, price)?;
        }

        Commands::SetApr { caller, apr } => {
            commands::set_apr(&mut ctx, &caller, apr)?;
        }

        Commands::SetLtv { caller, ltv } => {
            commands::set_ltv(&mut ctx, &caller, ltv)?;
        }

        Commands::SetThreshold { caller, threshold } => {
            commands::set_threshold(&mut ctx, &caller, threshold)?;
        }

        Commands::SetBonus { caller, bonus } => {
            commands::set_bonus(&mut ctx, &caller, bonus)?;
        }

        Commands::SetOperator { caller, operator } => {
            commands::set_operator(&mut ctx, &caller, operator.as_deref())?;
        }

        Commands::Sweep { caller, asset } => {
            commands::sweep(&mut ctx, &caller, asset)?;
        }

        Commands::Position { user } => {
            commands::position(&ctx, &user)?;
        }

        Commands::Market => {
            commands::market(&ctx)?;
        }

        Commands::Audit => {
            commands::audit(&ctx)?;
        }
    }

    Ok(())
}
