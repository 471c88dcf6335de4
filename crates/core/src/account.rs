//! Account identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a market participant (borrower, LP, liquidator, admin).
///
/// Normalized to trimmed uppercase so `alice` and `ALICE` are one account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The market's own custody account
    pub fn market() -> Self {
        Self::new("MARKET")
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        assert_eq!(AccountId::new(" alice "), AccountId::new("ALICE"));
        assert_eq!(AccountId::from("bob").as_str(), "BOB");
    }

    #[test]
    fn test_serde_normalizes_on_read() {
        let id: AccountId = serde_json::from_str("\"carol\"").unwrap();
        assert_eq!(id.as_str(), "CAROL");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"CAROL\"");
    }
}
