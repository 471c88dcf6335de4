//! LendPool Risk Engine - gatekeeper for every position change
//!
//! The Risk Engine validates borrows, withdrawals and liquidations BEFORE the
//! ledger is mutated, and owns the risk parameters together with the limits
//! on how fast governance may move them.

pub mod engine;
pub mod error;
pub mod liquidation;
pub mod params;

pub use engine::{PositionStatus, RiskEngine, HEALTH_FACTOR_ONE, INFINITE_HEALTH_FACTOR};
pub use error::RiskError;
pub use liquidation::LiquidationQuote;
pub use params::{GovernanceLimits, RiskParams};
