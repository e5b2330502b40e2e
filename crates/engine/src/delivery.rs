// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery client: timeout-wrapped target invocation with retry
//!
//! The engine never talks to a compute host directly; it goes through the
//! `TargetInvoker` capability. Each delivery attempt is independent and
//! shares no mutable state with other in-flight calls.

use crate::audit::AuditLog;
use async_trait::async_trait;
use chrono::Utc;
use relay_core::{
    AttemptOutcome, Backoff, DeliveryAttempt, DeliveryOutcome, DeliveryRecord, Event, Rule,
    TargetRef,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors a target invocation can produce
#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    /// The target failed in a way that may succeed on retry
    #[error("transient target failure: {0}")]
    Transient(String),
    /// The target or its reference is broken; retrying cannot help
    #[error("permanent target failure: {0}")]
    Permanent(String),
}

/// Capability handle for the external compute host.
///
/// Implementations perform one request/response call carrying the event.
/// The delivery client supplies the timeout; invokers should not race their
/// own.
#[async_trait]
pub trait TargetInvoker: Send + Sync {
    async fn invoke(&self, event: &Event, target: &TargetRef) -> Result<(), InvokeError>;
}

/// Wraps target invocation with a timeout and the retry policy
pub struct DeliveryClient {
    invoker: Arc<dyn TargetInvoker>,
    timeout: Duration,
}

impl DeliveryClient {
    pub fn new(invoker: Arc<dyn TargetInvoker>, timeout: Duration) -> Self {
        Self { invoker, timeout }
    }

    /// Perform a single delivery attempt
    pub async fn deliver(&self, event: &Event, target: &TargetRef) -> AttemptOutcome {
        match tokio::time::timeout(self.timeout, self.invoker.invoke(event, target)).await {
            Ok(Ok(())) => AttemptOutcome::Delivered,
            Ok(Err(InvokeError::Transient(reason))) => AttemptOutcome::Retryable(reason),
            Ok(Err(InvokeError::Permanent(reason))) => AttemptOutcome::Permanent(reason),
            Err(_) => AttemptOutcome::TimedOut,
        }
    }

    /// Deliver one event to one rule's target, retrying per the backoff
    /// sequence until a terminal outcome is reached.
    ///
    /// Every attempt is recorded in the audit log while in flight; the
    /// returned record is the terminal outcome for the (event, rule) pair.
    pub async fn deliver_with_retry(
        &self,
        event: &Event,
        rule: &Rule,
        backoff: &Backoff,
        audit: &AuditLog,
    ) -> DeliveryRecord {
        let mut attempt = 1u32;
        loop {
            let outcome = self.deliver(event, &rule.target).await;

            let next_delay = if outcome.is_retryable() {
                backoff.delay_before(attempt + 1)
            } else {
                None
            };
            let next_retry_at = next_delay
                .and_then(|d| chrono::Duration::from_std(d).ok())
                .map(|d| Utc::now() + d);

            audit.record_attempt(DeliveryAttempt {
                event_id: event.id.clone(),
                rule_id: rule.id.clone(),
                attempt,
                outcome: outcome.clone(),
                next_retry_at,
            });

            match outcome {
                AttemptOutcome::Delivered => {
                    tracing::debug!(
                        event_id = %event.id,
                        rule_id = %rule.id,
                        attempt,
                        "delivered"
                    );
                    return self.terminal(event, rule, attempt, DeliveryOutcome::Delivered);
                }
                AttemptOutcome::Permanent(reason) => {
                    tracing::warn!(
                        event_id = %event.id,
                        rule_id = %rule.id,
                        attempt,
                        reason = %reason,
                        "permanent delivery failure"
                    );
                    return self.terminal(
                        event,
                        rule,
                        attempt,
                        DeliveryOutcome::PermanentFailure(reason),
                    );
                }
                AttemptOutcome::Retryable(_) | AttemptOutcome::TimedOut => match next_delay {
                    Some(delay) => {
                        tracing::debug!(
                            event_id = %event.id,
                            rule_id = %rule.id,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "retrying delivery"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        tracing::warn!(
                            event_id = %event.id,
                            rule_id = %rule.id,
                            attempts = attempt,
                            "retries exhausted"
                        );
                        let reason = format!("retries exhausted after {} attempts", attempt);
                        return self.terminal(
                            event,
                            rule,
                            attempt,
                            DeliveryOutcome::PermanentFailure(reason),
                        );
                    }
                },
            }
        }
    }

    fn terminal(
        &self,
        event: &Event,
        rule: &Rule,
        attempts: u32,
        outcome: DeliveryOutcome,
    ) -> DeliveryRecord {
        DeliveryRecord {
            event_id: event.id.clone(),
            rule_id: rule.id.clone(),
            attempts,
            outcome,
            settled_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "delivery_tests.rs"]
mod tests;
