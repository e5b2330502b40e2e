// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher: per-event fan-out with bounded delivery concurrency
//!
//! State machine per event: received -> matching -> delivering -> settled.
//! Matching runs inline on the dispatch loop so events from one bus are
//! matched in publish order; deliveries run on their own tasks and may
//! settle out of order. A shared semaphore caps in-flight deliveries;
//! waiting on a slot queues the delivery in arrival order instead of
//! dropping it.

use crate::audit::AuditLog;
use crate::delivery::DeliveryClient;
use crate::registry::RuleRegistry;
use chrono::Utc;
use relay_core::{Backoff, DeliveryOutcome, DeliveryRecord, DispatchConfig, Event, Rule, Settlement};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Routes accepted events to matching targets
pub struct Dispatcher {
    bus: String,
    registry: Arc<RuleRegistry>,
    client: DeliveryClient,
    audit: Arc<AuditLog>,
    backoff: Backoff,
    deadline: Option<Duration>,
    retention: Duration,
    slots: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(
        bus: impl Into<String>,
        registry: Arc<RuleRegistry>,
        client: DeliveryClient,
        audit: Arc<AuditLog>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            bus: bus.into(),
            registry,
            client,
            audit,
            backoff: config.backoff(),
            deadline: config.event_deadline,
            retention: config.audit_retention,
            slots: Arc::new(Semaphore::new(config.max_in_flight)),
        }
    }

    /// Consume accepted events until the bus closes its channel
    pub async fn run(self: Arc<Self>, mut rx: UnboundedReceiver<Event>) {
        while let Some(event) = rx.recv().await {
            // Snapshot the rule set at receipt; later admin changes do not
            // affect this event
            let rules = self.registry.rules_for(&self.bus);
            let attributes = event.attributes();
            let matched: Vec<Rule> = rules
                .iter()
                .filter(|rule| rule.pattern.matches(&attributes))
                .cloned()
                .collect();

            tracing::debug!(
                event_id = %event.id,
                bus = %self.bus,
                rules = rules.len(),
                matched = matched.len(),
                "matched event"
            );

            if matched.is_empty() {
                // Not an error: the event settles with zero deliveries
                self.audit.record_settlement(Settlement {
                    event_id: event.id.clone(),
                    matched: 0,
                    delivered: 0,
                    failed: 0,
                    cancelled: 0,
                    settled_at: Utc::now(),
                });
                self.audit.prune(Utc::now(), self.retention);
                continue;
            }

            let this = Arc::clone(&self);
            tokio::spawn(async move {
                this.settle(event, matched).await;
            });
        }
        tracing::debug!(bus = %self.bus, "dispatch loop stopped");
    }

    /// Drive one event from matching to settlement
    async fn settle(self: Arc<Self>, event: Event, matched: Vec<Rule>) {
        let mut deliveries = JoinSet::new();
        for rule in &matched {
            let this = Arc::clone(&self);
            let event = event.clone();
            let rule = rule.clone();
            deliveries.spawn(async move {
                // A slot must be held before the first attempt; waiting here
                // queues the delivery in arrival order
                let Ok(_permit) = this.slots.clone().acquire_owned().await else {
                    return;
                };
                let record = this
                    .client
                    .deliver_with_retry(&event, &rule, &this.backoff, &this.audit)
                    .await;
                this.audit.record_outcome(record);
            });
        }

        match self.deadline {
            Some(limit) => {
                if tokio::time::timeout(limit, drain(&mut deliveries))
                    .await
                    .is_err()
                {
                    tracing::warn!(
                        event_id = %event.id,
                        "event deadline elapsed, cancelling remaining deliveries"
                    );
                    deliveries.abort_all();
                    drain(&mut deliveries).await;
                }
            }
            None => drain(&mut deliveries).await,
        }

        // Tally terminal outcomes; rules whose task was cancelled before it
        // settled get a Cancelled record so nothing is silently dropped
        let mut delivered = 0;
        let mut failed = 0;
        let mut cancelled = 0;
        for rule in &matched {
            match self.audit.outcome(&event.id, &rule.id) {
                Some(record) => match record.outcome {
                    DeliveryOutcome::Delivered => delivered += 1,
                    DeliveryOutcome::PermanentFailure(_) => failed += 1,
                    DeliveryOutcome::Cancelled => cancelled += 1,
                },
                None => {
                    cancelled += 1;
                    self.audit.record_outcome(DeliveryRecord {
                        event_id: event.id.clone(),
                        rule_id: rule.id.clone(),
                        attempts: self.audit.attempt_count(&event.id, &rule.id),
                        outcome: DeliveryOutcome::Cancelled,
                        settled_at: Utc::now(),
                    });
                }
            }
        }

        tracing::info!(
            event_id = %event.id,
            matched = matched.len(),
            delivered,
            failed,
            cancelled,
            "event settled"
        );
        self.audit.record_settlement(Settlement {
            event_id: event.id.clone(),
            matched: matched.len(),
            delivered,
            failed,
            cancelled,
            settled_at: Utc::now(),
        });
        // Retention is enforced lazily: each settlement sweeps records whose
        // own settlement aged past the window
        self.audit.prune(Utc::now(), self.retention);
    }
}

async fn drain(deliveries: &mut JoinSet<()>) {
    while deliveries.join_next().await.is_some() {}
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
