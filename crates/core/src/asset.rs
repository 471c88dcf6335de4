//! Asset - token metadata and unit conversion
//!
//! The ledger works in native units (the smallest indivisible unit of each
//! token). Humans work in decimals. `Asset` converts between the two.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::math::{self, MathError};

/// Maximum decimals a `Decimal` can represent exactly
pub const MAX_DECIMALS: u8 = 28;

/// Errors that can occur when working with assets
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("Empty asset symbol")]
    EmptySymbol,

    #[error("Asset symbol too long (max 10 chars): {0}")]
    SymbolTooLong(String),

    #[error("Invalid asset symbol format: {0}")]
    InvalidSymbol(String),

    #[error("Too many decimals for {symbol}: {decimals} (max {MAX_DECIMALS})")]
    TooManyDecimals { symbol: String, decimals: u8 },

    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Amount {amount} has more precision than {symbol} supports ({decimals} decimals)")]
    ExcessPrecision {
        amount: Decimal,
        symbol: String,
        decimals: u8,
    },

    #[error("Amount out of range for {0}")]
    OutOfRange(String),

    #[error(transparent)]
    Math(#[from] MathError),
}

/// Which side of the market an asset sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// The borrowable asset supplied by liquidity providers
    Stable,
    /// The asset pledged by borrowers
    Collateral,
}

/// Token metadata
///
/// # Example
/// ```
/// use lendpool_core::Asset;
/// use rust_decimal::Decimal;
///
/// let usdc = Asset::new("usdc", 6).unwrap();
/// assert_eq!(usdc.symbol(), "USDC");
/// assert_eq!(usdc.to_native(Decimal::new(15, 1)).unwrap(), 1_500_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    symbol: String,
    decimals: u8,
}

impl Asset {
    /// Create an asset, validating symbol and decimals
    pub fn new(symbol: &str, decimals: u8) -> Result<Self, AssetError> {
        let symbol = symbol.trim().to_uppercase();

        if symbol.is_empty() {
            return Err(AssetError::EmptySymbol);
        }

        if symbol.len() > 10 {
            return Err(AssetError::SymbolTooLong(symbol));
        }

        if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AssetError::InvalidSymbol(symbol));
        }

        if decimals > MAX_DECIMALS {
            return Err(AssetError::TooManyDecimals { symbol, decimals });
        }

        Ok(Self { symbol, decimals })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Native units per whole token (`10^decimals`)
    pub fn scale(&self) -> Result<u128, MathError> {
        math::pow10(self.decimals as u32)
    }

    /// Convert a human amount (e.g. `12.5`) into native units.
    ///
    /// Rejects negative values and values finer than the token's decimals
    /// instead of silently truncating them.
    pub fn to_native(&self, amount: Decimal) -> Result<u128, AssetError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(AssetError::NegativeAmount(amount));
        }

        let normalized = amount.normalize();
        let scale = normalized.scale();
        if scale > self.decimals as u32 {
            return Err(AssetError::ExcessPrecision {
                amount,
                symbol: self.symbol.clone(),
                decimals: self.decimals,
            });
        }

        let mantissa = u128::try_from(normalized.mantissa())
            .map_err(|_| AssetError::OutOfRange(self.symbol.clone()))?;
        let factor = math::pow10(self.decimals as u32 - scale)?;
        Ok(math::mul(mantissa, factor)?)
    }

    /// Convert native units into a human amount
    pub fn to_decimal(&self, native: u128) -> Result<Decimal, AssetError> {
        let value =
            i128::try_from(native).map_err(|_| AssetError::OutOfRange(self.symbol.clone()))?;
        Decimal::try_from_i128_with_scale(value, self.decimals as u32)
            .map_err(|_| AssetError::OutOfRange(self.symbol.clone()))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_symbol_is_uppercased() {
        let asset = Asset::new(" weth ", 18).unwrap();
        assert_eq!(asset.symbol(), "WETH");
        assert_eq!(asset.to_string(), "WETH");
    }

    #[test]
    fn test_empty_symbol_error() {
        assert!(matches!(Asset::new("", 6), Err(AssetError::EmptySymbol)));
    }

    #[test]
    fn test_invalid_symbol_error() {
        assert!(matches!(Asset::new("US-DC", 6), Err(AssetError::InvalidSymbol(_))));
        assert!(matches!(
            Asset::new("VERYLONGTOKENNAME", 6),
            Err(AssetError::SymbolTooLong(_))
        ));
    }

    #[test]
    fn test_too_many_decimals() {
        assert!(matches!(
            Asset::new("X", 29),
            Err(AssetError::TooManyDecimals { .. })
        ));
    }

    #[test]
    fn test_to_native() {
        let usdc = Asset::new("USDC", 6).unwrap();
        assert_eq!(usdc.to_native(dec!(1000)).unwrap(), 1_000_000_000);
        assert_eq!(usdc.to_native(dec!(0.000001)).unwrap(), 1);
        assert_eq!(usdc.to_native(dec!(2.50)).unwrap(), 2_500_000);
    }

    #[test]
    fn test_to_native_rejects_dust_below_precision() {
        let usdc = Asset::new("USDC", 6).unwrap();
        assert!(matches!(
            usdc.to_native(dec!(0.0000001)),
            Err(AssetError::ExcessPrecision { .. })
        ));
    }

    #[test]
    fn test_to_native_rejects_negative() {
        let usdc = Asset::new("USDC", 6).unwrap();
        assert!(matches!(
            usdc.to_native(dec!(-1)),
            Err(AssetError::NegativeAmount(_))
        ));
    }

    #[test]
    fn test_to_decimal() {
        let weth = Asset::new("WETH", 18).unwrap();
        assert_eq!(weth.to_decimal(1_500_000_000_000_000_000).unwrap(), dec!(1.5));
    }

    #[test]
    fn test_asset_kind_display() {
        assert_eq!(AssetKind::Stable.to_string(), "stable");
        assert_eq!("collateral".parse::<AssetKind>().unwrap(), AssetKind::Collateral);
    }

    #[test]
    fn test_serde_roundtrip() {
        let asset = Asset::new("USDC", 6).unwrap();
        let json = serde_json::to_string(&asset).unwrap();
        let parsed: Asset = serde_json::from_str(&json).unwrap();
        assert_eq!(asset, parsed);
    }
}
