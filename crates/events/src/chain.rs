//! Hash chain utilities for journal integrity

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::event::EventRecord;

/// `prev_hash` of the first record
pub const GENESIS_HASH: &str = "GENESIS";

/// SHA-256 of the record content (everything except `hash` itself)
pub fn calculate_hash(record: &EventRecord) -> String {
    let mut hasher = Sha256::new();

    hasher.update(record.sequence.to_le_bytes());
    hasher.update(record.prev_hash.as_bytes());
    hasher.update(record.timestamp.to_rfc3339().as_bytes());
    hasher.update(record.correlation_id.as_bytes());
    // Serializing a derived enum is deterministic (field order is fixed)
    match serde_json::to_vec(&record.event) {
        Ok(bytes) => hasher.update(bytes),
        Err(_) => hasher.update(record.event.to_string().as_bytes()),
    }

    hex::encode(hasher.finalize())
}

/// Verify hash chain integrity
pub fn verify_chain(records: &[EventRecord]) -> Result<(), ChainError> {
    let mut prev_hash = GENESIS_HASH.to_string();
    let mut expected_sequence = 1;

    for record in records {
        if record.sequence != expected_sequence {
            return Err(ChainError::InvalidSequence {
                expected: expected_sequence,
                actual: record.sequence,
            });
        }

        if record.prev_hash != prev_hash {
            return Err(ChainError::BrokenLink {
                sequence: record.sequence,
                expected: prev_hash,
                actual: record.prev_hash.clone(),
            });
        }

        let calculated = calculate_hash(record);
        if record.hash != calculated {
            return Err(ChainError::InvalidHash {
                sequence: record.sequence,
                expected: calculated,
                actual: record.hash.clone(),
            });
        }

        prev_hash = record.hash.clone();
        expected_sequence += 1;
    }

    Ok(())
}

/// Errors in hash chain verification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Broken link at seq {sequence}: expected prev_hash '{expected}', got '{actual}'")]
    BrokenLink {
        sequence: u64,
        expected: String,
        actual: String,
    },

    #[error("Invalid hash at seq {sequence}: expected '{expected}', got '{actual}'")]
    InvalidHash {
        sequence: u64,
        expected: String,
        actual: String,
    },

    #[error("Invalid sequence: expected {expected}, got {actual}")]
    InvalidSequence { expected: u64, actual: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MarketEvent;
    use chrono::{TimeZone, Utc};
    use lendpool_core::AccountId;

    fn chain(len: usize) -> Vec<EventRecord> {
        let mut records: Vec<EventRecord> = Vec::new();
        for i in 0..len {
            let event = MarketEvent::CollateralDeposited {
                account: AccountId::new("alice"),
                amount: 100 + i as u128,
            };
            let timestamp = Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap();
            records.push(EventRecord::next(records.last(), event, timestamp, format!("c{i}")));
        }
        records
    }

    #[test]
    fn test_empty_and_valid_chains() {
        assert!(verify_chain(&[]).is_ok());
        assert!(verify_chain(&chain(5)).is_ok());
    }

    #[test]
    fn test_hash_is_deterministic() {
        let records = chain(1);
        assert_eq!(calculate_hash(&records[0]), records[0].hash);
        assert_eq!(records[0].hash.len(), 64);
    }

    #[test]
    fn test_tampered_event_detected() {
        let mut records = chain(3);
        records[1].event = MarketEvent::CollateralDeposited {
            account: AccountId::new("alice"),
            amount: 1_000_000,
        };

        assert!(matches!(
            verify_chain(&records),
            Err(ChainError::InvalidHash { sequence: 2, .. })
        ));
    }

    #[test]
    fn test_removed_record_detected() {
        let mut records = chain(3);
        records.remove(1);

        assert_eq!(
            verify_chain(&records),
            Err(ChainError::InvalidSequence {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn test_relinked_record_detected() {
        let mut records = chain(2);
        records[1].prev_hash = "0".repeat(64);

        assert!(matches!(
            verify_chain(&records),
            Err(ChainError::BrokenLink { sequence: 2, .. })
        ));
    }
}
