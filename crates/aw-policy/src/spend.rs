//! Per-agent spend history and windowed sums.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use aw_core::AgentId;

/// One recorded spend. Append-only; corrections are modeled as new
/// records, never as mutation, to preserve audit integrity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpendRecord {
    pub at: DateTime<Utc>,
    pub amount: Decimal,
}

/// Shared spend tracker.
///
/// One lock guards the per-agent record vectors; windowed queries take a
/// consistent snapshot relative to concurrent appends.
pub struct SpendTracker {
    records: Mutex<HashMap<AgentId, Vec<SpendRecord>>>,
}

impl SpendTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Record a spend at the current time.
    pub fn record(&self, agent_id: AgentId, amount: Decimal) {
        self.record_at(agent_id, amount, Utc::now());
    }

    /// Record a spend at an explicit time (used by tests and backfill).
    pub fn record_at(&self, agent_id: AgentId, amount: Decimal, at: DateTime<Utc>) {
        debug!(agent_id = %agent_id, %amount, "Spend recorded");
        self.records
            .lock()
            .entry(agent_id)
            .or_default()
            .push(SpendRecord { at, amount });
    }

    /// Total spend for an agent since `since` (inclusive).
    #[must_use]
    pub fn spend_since(&self, agent_id: AgentId, since: DateTime<Utc>) -> Decimal {
        self.records
            .lock()
            .get(&agent_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.at >= since)
                    .map(|r| r.amount)
                    .sum()
            })
            .unwrap_or(Decimal::ZERO)
    }

    /// Spend in the trailing 24 hours.
    #[must_use]
    pub fn daily_spend(&self, agent_id: AgentId) -> Decimal {
        self.spend_since(agent_id, Utc::now() - Duration::hours(24))
    }

    /// Spend in the trailing 7 days.
    #[must_use]
    pub fn weekly_spend(&self, agent_id: AgentId) -> Decimal {
        self.spend_since(agent_id, Utc::now() - Duration::days(7))
    }
}

impl Default for SpendTracker {
    fn default() -> Self {
        Self::new()
    }
}
