// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus: publish validation, dedup window, hand-off to dispatch
//!
//! `publish` is synchronous accept/reject. Acceptance means the event is
//! queued for dispatch, not that anything has been delivered; delivery-time
//! failures are recorded in the audit log and never reach the publisher.

use crate::audit::AuditLog;
use crate::delivery::{DeliveryClient, TargetInvoker};
use crate::dispatcher::Dispatcher;
use crate::registry::RuleRegistry;
use relay_core::{Clock, DispatchConfig, Event, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Publish-time rejections. Anything past acceptance is recorded in the
/// audit log instead of surfacing here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("event id must not be empty")]
    MissingId,
    #[error("event source must not be empty")]
    MissingSource,
    #[error("duplicate event id within dedup window: {0}")]
    DuplicateId(String),
    #[error("bus {0} is shut down")]
    Closed(String),
}

/// Proof of acceptance returned by `publish`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub event_id: String,
}

/// Everything a bus needs to run its dispatcher
pub struct BusDeps {
    pub registry: Arc<RuleRegistry>,
    pub invoker: Arc<dyn TargetInvoker>,
    pub audit: Arc<AuditLog>,
    pub config: DispatchConfig,
}

/// Recently accepted event ids, pruned by age
struct DedupWindow {
    seen: HashMap<String, Instant>,
    ttl: Duration,
}

impl DedupWindow {
    fn new(ttl: Duration) -> Self {
        Self {
            seen: HashMap::new(),
            ttl,
        }
    }

    /// Record an id; returns false if it was already seen within the window
    fn observe(&mut self, id: &str, now: Instant) -> bool {
        let ttl = self.ttl;
        self.seen
            .retain(|_, seen_at| now.duration_since(*seen_at) < ttl);
        if self.seen.contains_key(id) {
            return false;
        }
        self.seen.insert(id.to_string(), now);
        true
    }
}

/// A named event bus with its own dispatch loop
pub struct EventBus<C: Clock = SystemClock> {
    name: String,
    tx: mpsc::UnboundedSender<Event>,
    window: Mutex<DedupWindow>,
    clock: C,
    task: JoinHandle<()>,
}

impl EventBus<SystemClock> {
    /// Spawn the bus's dispatch loop on the current runtime
    pub fn start(name: impl Into<String>, deps: BusDeps) -> Self {
        Self::start_with_clock(name, deps, SystemClock)
    }
}

impl<C: Clock> EventBus<C> {
    pub fn start_with_clock(name: impl Into<String>, deps: BusDeps, clock: C) -> Self {
        let name = name.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let client = DeliveryClient::new(deps.invoker, deps.config.delivery_timeout);
        let dispatcher = Arc::new(Dispatcher::new(
            name.clone(),
            deps.registry,
            client,
            deps.audit,
            &deps.config,
        ));
        let task = tokio::spawn(dispatcher.run(rx));
        tracing::info!(bus = %name, "bus started");

        Self {
            window: Mutex::new(DedupWindow::new(deps.config.dedup_window)),
            name,
            tx,
            clock,
            task,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accept or reject an event.
    ///
    /// Accepted events are queued to the dispatcher in publish order. The
    /// call returns on acceptance, never on delivery.
    pub fn publish(&self, event: Event) -> Result<Receipt, PublishError> {
        if event.id.is_empty() {
            return Err(PublishError::MissingId);
        }
        if event.source.is_empty() {
            return Err(PublishError::MissingSource);
        }

        {
            let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());
            if !window.observe(&event.id, self.clock.now()) {
                return Err(PublishError::DuplicateId(event.id));
            }
        }

        let event_id = event.id.clone();
        self.tx
            .send(event)
            .map_err(|_| PublishError::Closed(self.name.clone()))?;
        tracing::debug!(bus = %self.name, event_id = %event_id, "event accepted");
        Ok(Receipt { event_id })
    }

    /// Stop accepting events and wait for the dispatch loop to drain.
    ///
    /// Events already accepted are still matched and handed to delivery
    /// tasks; in-flight deliveries settle on their own tasks.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.task.await;
        tracing::info!(bus = %self.name, "bus stopped");
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
