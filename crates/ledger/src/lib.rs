//! LendPool Ledger - share-based lending accounting
//!
//! This is the HEART of LendPool. All balance and share mutations go through
//! [`LedgerState`], which keeps per-position records and the global aggregates
//! consistent within a single call.
//!
//! # Key Types
//! - `AccrualClock`: lazily computed debt and LP multipliers
//! - `DebtLedger`: debt expressed as shares of a globally accruing pool
//! - `CollateralLedger`: collateral balances and valuation
//! - `LiquidityPool`: LP shares backed by the stable-asset pool
//! - `Position`: one borrower's record

pub mod accrual;
pub mod collateral;
pub mod debt;
pub mod error;
pub mod pool;
pub mod position;
pub mod state;

pub use accrual::AccrualClock;
pub use collateral::CollateralLedger;
pub use debt::{DebtLedger, DebtReduction};
pub use error::LedgerError;
pub use pool::LiquidityPool;
pub use position::Position;
pub use state::LedgerState;
