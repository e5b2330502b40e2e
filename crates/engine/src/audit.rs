// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit state for in-flight deliveries and settlements
//!
//! Delivery-time errors never propagate back to the publisher; they are
//! recorded here instead. Records are transient: a pruning pass drops
//! everything belonging to events settled longer ago than the retention
//! window.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use relay_core::{DeliveryAttempt, DeliveryRecord, RuleId, Settlement};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
struct AuditInner {
    attempts: Vec<DeliveryAttempt>,
    outcomes: HashMap<(String, RuleId), DeliveryRecord>,
    settlements: HashMap<String, Settlement>,
}

/// In-memory audit trail of delivery attempts and settlements
#[derive(Default)]
pub struct AuditLog {
    inner: Mutex<AuditInner>,
    settled: Notify,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one delivery attempt while it is in flight
    pub fn record_attempt(&self, attempt: DeliveryAttempt) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.attempts.push(attempt);
    }

    /// Record the terminal outcome for one (event, rule) pair
    pub fn record_outcome(&self, record: DeliveryRecord) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .outcomes
            .insert((record.event_id.clone(), record.rule_id.clone()), record);
    }

    /// Record that every delivery spawned for an event has settled
    pub fn record_settlement(&self, settlement: Settlement) {
        {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner
                .settlements
                .insert(settlement.event_id.clone(), settlement);
        }
        self.settled.notify_waiters();
    }

    /// All attempts recorded for an event, in attempt order
    pub fn attempts_for(&self, event_id: &str) -> Vec<DeliveryAttempt> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .attempts
            .iter()
            .filter(|a| a.event_id == event_id)
            .cloned()
            .collect()
    }

    /// Number of attempts made for one (event, rule) pair
    pub fn attempt_count(&self, event_id: &str, rule_id: &RuleId) -> u32 {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .attempts
            .iter()
            .filter(|a| a.event_id == event_id && a.rule_id == *rule_id)
            .count() as u32
    }

    /// Terminal outcome for one (event, rule) pair, if settled
    pub fn outcome(&self, event_id: &str, rule_id: &RuleId) -> Option<DeliveryRecord> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .outcomes
            .get(&(event_id.to_string(), rule_id.clone()))
            .cloned()
    }

    /// Settlement record for an event, if every delivery has settled
    pub fn settlement(&self, event_id: &str) -> Option<Settlement> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.settlements.get(event_id).cloned()
    }

    /// Wait until the given event settles
    pub async fn wait_settled(&self, event_id: &str) -> Settlement {
        loop {
            let notified = self.settled.notified();
            if let Some(settlement) = self.settlement(event_id) {
                return settlement;
            }
            notified.await;
        }
    }

    /// Drop records for events settled before the retention window
    pub fn prune(&self, now: DateTime<Utc>, retention: Duration) {
        let Ok(retention) = ChronoDuration::from_std(retention) else {
            return;
        };
        let cutoff = now - retention;

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let expired: Vec<String> = inner
            .settlements
            .iter()
            .filter(|(_, s)| s.settled_at < cutoff)
            .map(|(id, _)| id.clone())
            .collect();

        for event_id in &expired {
            inner.settlements.remove(event_id);
        }
        inner
            .attempts
            .retain(|a| !expired.contains(&a.event_id));
        inner
            .outcomes
            .retain(|(event_id, _), _| !expired.contains(event_id));
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
