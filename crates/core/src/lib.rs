//! LendPool Core - Domain types
//!
//! This crate contains the fundamental types used across LendPool:
//! - `math`: checked `u128` fixed-point arithmetic with explicit rounding
//! - `Asset`: token metadata and decimal <-> native unit conversion
//! - `AccountId`: normalized account identifier
//! - `ErrorCategory`: the validation / invariant / authorization taxonomy

pub mod account;
pub mod asset;
pub mod error;
pub mod math;

pub use account::AccountId;
pub use asset::{Asset, AssetError, AssetKind};
pub use error::ErrorCategory;
pub use math::{MathError, PRECISION_BASE, SCALE, SECONDS_PER_YEAR};
