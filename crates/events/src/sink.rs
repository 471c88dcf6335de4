//! Event sinks

use chrono::{DateTime, Utc};

use crate::chain::verify_chain;
use crate::error::EventError;
use crate::event::{EventRecord, MarketEvent};

/// Append-only destination for market events.
///
/// Implementations chain each record onto the previous one.
pub trait EventSink: Send {
    fn append(
        &mut self,
        event: MarketEvent,
        timestamp: DateTime<Utc>,
        correlation_id: &str,
    ) -> Result<EventRecord, EventError>;

    /// Most recently appended record
    fn last_record(&self) -> Option<&EventRecord>;

    /// Make held-back records durable; returns how many were written.
    /// Sinks that write on append have nothing to do.
    fn commit(&mut self) -> Result<usize, EventError> {
        Ok(0)
    }
}

/// In-memory sink for tests and embedded use
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<EventRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn events(&self) -> impl Iterator<Item = &MarketEvent> {
        self.records.iter().map(|r| &r.event)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn verify(&self) -> Result<(), EventError> {
        Ok(verify_chain(&self.records)?)
    }
}

impl EventSink for MemorySink {
    fn append(
        &mut self,
        event: MarketEvent,
        timestamp: DateTime<Utc>,
        correlation_id: &str,
    ) -> Result<EventRecord, EventError> {
        let record = EventRecord::next(self.records.last(), event, timestamp, correlation_id);
        self.records.push(record.clone());
        Ok(record)
    }

    fn last_record(&self) -> Option<&EventRecord> {
        self.records.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lendpool_core::AccountId;

    #[test]
    fn test_memory_sink_chains_records() {
        let mut sink = MemorySink::new();
        assert!(sink.is_empty());

        for amount in [10, 20, 30] {
            let event = MarketEvent::CollateralDeposited {
                account: AccountId::new("alice"),
                amount,
            };
            sink.append(event, Utc::now(), "test").unwrap();
        }

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.last_record().map(|r| r.sequence), Some(3));
        sink.verify().unwrap();
    }
}
