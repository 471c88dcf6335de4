//! Error taxonomy shared by every crate

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Coarse classification of a rejected operation.
///
/// Every crate-level error maps onto exactly one category so callers can
/// tell bad input from a broken rule from a missing permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed request: zero amount, unknown position, bad parameter
    Validation,
    /// Request is well-formed but would break a ledger or risk rule
    Invariant,
    /// Caller lacks the required role
    Authorization,
    /// Arithmetic overflow/underflow; never retried
    Fatal,
    /// External collaborator (transfer, oracle, sink) failed
    External,
}
