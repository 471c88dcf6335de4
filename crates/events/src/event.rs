//! Market events and journal records

use chrono::{DateTime, Utc};
use lendpool_core::{AccountId, AssetKind};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, IntoStaticStr};

use crate::chain::{calculate_hash, GENESIS_HASH};

/// Something that happened to the market. Amounts are native units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MarketEvent {
    LiquidityDeposited {
        account: AccountId,
        amount: u128,
        shares: u128,
    },
    LiquidityWithdrawn {
        account: AccountId,
        shares: u128,
        amount: u128,
    },
    CollateralDeposited {
        account: AccountId,
        amount: u128,
    },
    CollateralWithdrawn {
        account: AccountId,
        amount: u128,
    },
    Borrowed {
        account: AccountId,
        amount: u128,
        shares: u128,
    },
    Repaid {
        account: AccountId,
        amount: u128,
        shares_removed: u128,
        closed: bool,
    },
    Liquidated {
        liquidator: AccountId,
        user: AccountId,
        debt_amount: u128,
        collateral_seized: u128,
        /// Part of `collateral_seized` paid as liquidation bonus
        bonus: u128,
        closed: bool,
    },
    PriceUpdated {
        old: u128,
        new: u128,
    },
    AprUpdated {
        old: u128,
        new: u128,
    },
    LtvUpdated {
        old: u128,
        new: u128,
    },
    LiquidationThresholdUpdated {
        old: u128,
        new: u128,
    },
    LiquidationBonusUpdated {
        old: u128,
        new: u128,
    },
    OperatorUpdated {
        old: Option<AccountId>,
        new: Option<AccountId>,
    },
    SurplusSwept {
        asset: AssetKind,
        amount: u128,
        sink: AccountId,
    },
}

impl MarketEvent {
    /// Account whose position or balance the event touched, if any
    pub fn account(&self) -> Option<&AccountId> {
        match self {
            MarketEvent::LiquidityDeposited { account, .. }
            | MarketEvent::LiquidityWithdrawn { account, .. }
            | MarketEvent::CollateralDeposited { account, .. }
            | MarketEvent::CollateralWithdrawn { account, .. }
            | MarketEvent::Borrowed { account, .. }
            | MarketEvent::Repaid { account, .. } => Some(account),
            MarketEvent::Liquidated { user, .. } => Some(user),
            _ => None,
        }
    }

    /// Governance change rather than a user action
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            MarketEvent::PriceUpdated { .. }
                | MarketEvent::AprUpdated { .. }
                | MarketEvent::LtvUpdated { .. }
                | MarketEvent::LiquidationThresholdUpdated { .. }
                | MarketEvent::LiquidationBonusUpdated { .. }
                | MarketEvent::OperatorUpdated { .. }
                | MarketEvent::SurplusSwept { .. }
        )
    }
}

/// One journal line: an event plus its position in the hash chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Starts at 1 and increases by one per record
    pub sequence: u64,
    pub prev_hash: String,
    pub hash: String,
    /// Market time of the operation
    pub timestamp: DateTime<Utc>,
    /// Ties the record to the request that produced it
    pub correlation_id: String,
    pub event: MarketEvent,
}

impl EventRecord {
    /// Build the record that follows `prev` (or opens the chain)
    pub fn next(
        prev: Option<&EventRecord>,
        event: MarketEvent,
        timestamp: DateTime<Utc>,
        correlation_id: impl Into<String>,
    ) -> Self {
        let (sequence, prev_hash) = match prev {
            Some(p) => (p.sequence + 1, p.hash.clone()),
            None => (1, GENESIS_HASH.to_string()),
        };

        let mut record = Self {
            sequence,
            prev_hash,
            hash: String::new(),
            timestamp,
            correlation_id: correlation_id.into(),
            event,
        };
        record.hash = calculate_hash(&record);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deposit() -> MarketEvent {
        MarketEvent::CollateralDeposited {
            account: AccountId::new("alice"),
            amount: 100,
        }
    }

    #[test]
    fn test_display_is_snake_case() {
        assert_eq!(deposit().to_string(), "collateral_deposited");
        let name: &'static str = (&MarketEvent::AprUpdated { old: 1, new: 2 }).into();
        assert_eq!(name, "apr_updated");
    }

    #[test]
    fn test_account_and_admin() {
        assert_eq!(deposit().account(), Some(&AccountId::new("ALICE")));
        assert!(!deposit().is_admin());

        let price = MarketEvent::PriceUpdated { old: 1, new: 2 };
        assert!(price.account().is_none());
        assert!(price.is_admin());
    }

    #[test]
    fn test_records_link() {
        let first = EventRecord::next(None, deposit(), Utc::now(), "c1");
        let second = EventRecord::next(Some(&first), deposit(), Utc::now(), "c2");

        assert_eq!(first.sequence, 1);
        assert_eq!(first.prev_hash, GENESIS_HASH);
        assert_eq!(second.sequence, 2);
        assert_eq!(second.prev_hash, first.hash);
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn test_large_amounts_survive_json() {
        let event = MarketEvent::Borrowed {
            account: AccountId::new("alice"),
            amount: u128::MAX,
            shares: 1,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: MarketEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
