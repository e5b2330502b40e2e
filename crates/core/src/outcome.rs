// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery outcome and audit record types
//!
//! These records are transient: they live in the audit state only while a
//! delivery is in flight and for a short retention window after settlement.

use crate::rule::RuleId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a single delivery attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// The target acknowledged the event
    Delivered,
    /// The target failed transiently; the attempt may be retried
    Retryable(String),
    /// The call did not complete within the delivery timeout
    TimedOut,
    /// The target rejected the event; retrying cannot help
    Permanent(String),
}

impl AttemptOutcome {
    /// Whether the retry policy applies to this outcome
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_) | Self::TimedOut)
    }
}

/// Terminal result of delivering one event to one rule's target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    Delivered,
    /// Retries exhausted or the target failed permanently
    PermanentFailure(String),
    /// The event's deadline elapsed before the delivery settled
    Cancelled,
}

/// One attempt against one (event, rule) pair, tracked while in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    pub event_id: String,
    pub rule_id: RuleId,
    /// 1-based attempt counter
    pub attempt: u32,
    pub outcome: AttemptOutcome,
    /// When the next attempt is due, if this one is retryable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_retry_at: Option<DateTime<Utc>>,
}

/// Terminal record for one (event, rule) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub event_id: String,
    pub rule_id: RuleId,
    /// Number of attempts made, including the final one
    pub attempts: u32,
    pub outcome: DeliveryOutcome,
    pub settled_at: DateTime<Utc>,
}

/// Point at which every delivery spawned for an event has settled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub event_id: String,
    /// Number of rules that matched the event
    pub matched: usize,
    pub delivered: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub settled_at: DateTime<Utc>,
}
