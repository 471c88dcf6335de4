//! Market configuration
//!
//! Every field has a default, so a config file only needs to name what it
//! changes. Human-facing values (the initial price) are decimals and are
//! converted with the asset's decimals.

use lendpool_core::{AccountId, Asset, AssetError, MathError};
use lendpool_risk::{GovernanceLimits, RiskError, RiskParams};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid asset: {0}")]
    Asset(#[from] AssetError),

    #[error("Invalid risk parameters: {0}")]
    Risk(#[from] RiskError),

    #[error(transparent)]
    Math(#[from] MathError),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Token metadata as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSpec {
    pub symbol: String,
    pub decimals: u8,
}

impl AssetSpec {
    pub fn to_asset(&self) -> Result<Asset, AssetError> {
        Asset::new(&self.symbol, self.decimals)
    }
}

/// Configuration for one lending market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    // === Assets ===
    /// Asset lent and borrowed
    #[serde(default = "default_stable")]
    pub stable: AssetSpec,

    /// Asset pledged by borrowers
    #[serde(default = "default_collateral")]
    pub collateral: AssetSpec,

    // === Risk (bps) ===
    #[serde(default = "default_ltv")]
    pub ltv: u128,

    #[serde(default = "default_liquidation_threshold")]
    pub liquidation_threshold: u128,

    #[serde(default = "default_liquidation_bonus")]
    pub liquidation_bonus: u128,

    #[serde(default = "default_apr")]
    pub apr: u128,

    /// Stable units per whole collateral token
    #[serde(default = "default_initial_price")]
    pub initial_price: Decimal,

    // === Governance limits ===
    #[serde(default)]
    pub limits: GovernanceLimits,

    // === Roles ===
    #[serde(default = "default_owner")]
    pub owner: String,

    #[serde(default)]
    pub operator: Option<String>,

    /// Receiver of swept surplus
    #[serde(default = "default_sweep_sink")]
    pub sweep_sink: String,
}

fn default_stable() -> AssetSpec {
    AssetSpec {
        symbol: "USDC".to_string(),
        decimals: 6,
    }
}

fn default_collateral() -> AssetSpec {
    AssetSpec {
        symbol: "WETH".to_string(),
        decimals: 18,
    }
}

fn default_ltv() -> u128 {
    7_500
}

fn default_liquidation_threshold() -> u128 {
    8_000
}

fn default_liquidation_bonus() -> u128 {
    500
}

fn default_apr() -> u128 {
    500
}

fn default_initial_price() -> Decimal {
    Decimal::new(2_000, 0)
}

fn default_owner() -> String {
    "OWNER".to_string()
}

fn default_sweep_sink() -> String {
    "TREASURY".to_string()
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            stable: default_stable(),
            collateral: default_collateral(),
            ltv: default_ltv(),
            liquidation_threshold: default_liquidation_threshold(),
            liquidation_bonus: default_liquidation_bonus(),
            apr: default_apr(),
            initial_price: default_initial_price(),
            limits: GovernanceLimits::default(),
            owner: default_owner(),
            operator: None,
            sweep_sink: default_sweep_sink(),
        }
    }
}

impl MarketConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn stable_asset(&self) -> Result<Asset, ConfigError> {
        Ok(self.stable.to_asset()?)
    }

    pub fn collateral_asset(&self) -> Result<Asset, ConfigError> {
        Ok(self.collateral.to_asset()?)
    }

    pub fn owner(&self) -> AccountId {
        AccountId::new(&self.owner)
    }

    pub fn operator(&self) -> Option<AccountId> {
        self.operator.as_deref().map(AccountId::new)
    }

    pub fn sweep_sink(&self) -> AccountId {
        AccountId::new(&self.sweep_sink)
    }

    /// Initial risk parameters in native units
    pub fn risk_params(&self) -> Result<RiskParams, ConfigError> {
        let stable = self.stable_asset()?;
        let collateral = self.collateral_asset()?;
        Ok(RiskParams {
            collateral_price: stable.to_native(self.initial_price)?,
            collateral_scale: collateral.scale()?,
            ltv: self.ltv,
            liquidation_threshold: self.liquidation_threshold,
            liquidation_bonus: self.liquidation_bonus,
            apr: self.apr,
            last_apr_update: None,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let stable = self.stable_asset()?;
        let collateral = self.collateral_asset()?;
        if stable.symbol() == collateral.symbol() {
            return Err(ConfigError::Invalid(format!(
                "stable and collateral assets are both {}",
                stable
            )));
        }
        if self.owner.trim().is_empty() {
            return Err(ConfigError::Invalid("owner must be set".into()));
        }
        if self.sweep_sink.trim().is_empty() {
            return Err(ConfigError::Invalid("sweep_sink must be set".into()));
        }
        if self.sweep_sink() == AccountId::market() || self.owner() == AccountId::market() {
            return Err(ConfigError::Invalid(format!(
                "{} is reserved for market custody",
                AccountId::market()
            )));
        }
        self.risk_params()?.validate(&self.limits)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custody_account_cannot_be_configured() {
        let config = MarketConfig {
            sweep_sink: "market".into(),
            ..MarketConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = MarketConfig::default();
        config.validate().unwrap();

        let params = config.risk_params().unwrap();
        assert_eq!(params.collateral_price, 2_000_000_000);
        assert_eq!(params.collateral_scale, 1_000_000_000_000_000_000);
        assert_eq!(config.owner(), AccountId::new("owner"));
        assert!(config.operator().is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: MarketConfig = serde_json::from_str(
            r#"{ "ltv": 6000, "operator": "keeper", "limits": { "max_apr": 3000 } }"#,
        )
        .unwrap();

        assert_eq!(config.ltv, 6_000);
        assert_eq!(config.liquidation_threshold, 8_000);
        assert_eq!(config.operator(), Some(AccountId::new("KEEPER")));
        assert_eq!(config.limits.max_apr, 3_000);
        assert_eq!(config.limits.max_price_change_bps, 1_000);
        config.validate().unwrap();
    }

    #[test]
    fn test_threshold_below_ltv_rejected() {
        let config = MarketConfig {
            ltv: 8_500,
            ..MarketConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Risk(_))));
    }

    #[test]
    fn test_price_finer_than_stable_decimals_rejected() {
        let config = MarketConfig {
            initial_price: Decimal::new(1, 7),
            ..MarketConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Asset(_))));
    }

    #[test]
    fn test_same_asset_twice_rejected() {
        let config = MarketConfig {
            collateral: default_stable(),
            ..MarketConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("market.config.json");
        std::fs::write(&path, r#"{ "apr": 300 }"#).unwrap();

        let config = MarketConfig::from_file(&path).unwrap();
        assert_eq!(config.apr, 300);
    }
}
