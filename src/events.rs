// ============================================================================
// Market Notifications
// ============================================================================
//
// Observability events emitted by the ledger after each successful state
// change. Sinks have no influence on ledger behavior.
//
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use uuid::Uuid;

use crate::market::Outcome;

/// Default number of records a `RecordingSink` retains.
pub const DEFAULT_RECORDING_CAPACITY: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    BetPlaced {
        participant: String,
        outcome: Outcome,
        amount: u64,
    },
    BetWithdrawn {
        participant: String,
        outcome: Outcome,
        amount: u64,
    },
    MarketSettled {
        winning_outcome: Outcome,
    },
    RewardClaimed {
        participant: String,
        amount: u64,
    },
    FeeCollected {
        recipient: String,
        amount: u64,
    },
    /// The one-shot fee payout was attempted and rejected; it is not retried.
    FeeTransferFailed {
        recipient: String,
        amount: u64,
        reason: String,
    },
}

/// An emitted event with its identity and time of emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: MarketEvent,
}

impl EventRecord {
    pub fn new(event: MarketEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            at: Utc::now(),
            event,
        }
    }
}

// ============================================================================
// SINKS
// ============================================================================

pub trait EventSink: Send + Sync {
    fn emit(&self, record: &EventRecord);
}

/// Writes every record to the `tracing` pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, record: &EventRecord) {
        log_record(record);
    }
}

fn log_record(record: &EventRecord) {
    match &record.event {
        MarketEvent::BetPlaced { participant, outcome, amount } => {
            tracing::info!(event_id = %record.id, %participant, %outcome, amount, "bet placed");
        }
        MarketEvent::BetWithdrawn { participant, outcome, amount } => {
            tracing::info!(event_id = %record.id, %participant, %outcome, amount, "bet withdrawn");
        }
        MarketEvent::MarketSettled { winning_outcome } => {
            tracing::info!(event_id = %record.id, %winning_outcome, "market settled");
        }
        MarketEvent::RewardClaimed { participant, amount } => {
            tracing::info!(event_id = %record.id, %participant, amount, "reward claimed");
        }
        MarketEvent::FeeCollected { recipient, amount } => {
            tracing::info!(event_id = %record.id, %recipient, amount, "protocol fee collected");
        }
        MarketEvent::FeeTransferFailed { recipient, amount, reason } => {
            tracing::warn!(event_id = %record.id, %recipient, amount, %reason, "protocol fee transfer failed");
        }
    }
}

/// Keeps the most recent records in memory and forwards them to `tracing`.
#[derive(Debug)]
pub struct RecordingSink {
    records: Mutex<VecDeque<EventRecord>>,
    capacity: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RECORDING_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Retained records, oldest first.
    pub fn records(&self) -> Vec<EventRecord> {
        match self.records.lock() {
            Ok(records) => records.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    /// Retained events without their envelopes, oldest first.
    pub fn events(&self) -> Vec<MarketEvent> {
        self.records().into_iter().map(|r| r.event).collect()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, record: &EventRecord) {
        log_record(record);
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.push_back(record.clone());
        while records.len() > self.capacity {
            records.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_is_bounded() {
        let sink = RecordingSink::with_capacity(2);
        for amount in 1..=3 {
            sink.emit(&EventRecord::new(MarketEvent::RewardClaimed {
                participant: "ALICE".into(),
                amount,
            }));
        }

        let amounts: Vec<u64> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                MarketEvent::RewardClaimed { amount, .. } => Some(amount),
                _ => None,
            })
            .collect();
        assert_eq!(amounts, vec![2, 3]);
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = EventRecord::new(MarketEvent::MarketSettled {
            winning_outcome: Outcome::A,
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "market_settled");
        assert_eq!(json["winning_outcome"], "A");
        assert!(json["id"].is_string());
    }
}
