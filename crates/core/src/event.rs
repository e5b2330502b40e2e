// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The immutable event record published to a bus

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An immutable fact published to an event bus.
///
/// Events are created once at publish time and never mutated. The engine
/// retains an event only until every matching delivery has reached a
/// terminal outcome (plus the audit retention window).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identity for the event
    pub id: String,
    /// Direct performer of the event, the service that published it
    pub source: String,
    /// Category of the event, used for coarse routing
    pub detail_type: String,
    /// When the event was created
    pub timestamp: DateTime<Utc>,
    /// Account the event belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Region the event originated from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Indirect participant, e.g. the user who initiated the event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
    /// Structured payload carried by the event
    pub payload: Value,
}

impl Event {
    /// Create an event with the required attributes
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        detail_type: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            detail_type: detail_type.into(),
            timestamp: Utc::now(),
            account: None,
            region: None,
            participant: None,
            payload,
        }
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_participant(mut self, participant: impl Into<String>) -> Self {
        self.participant = Some(participant.into());
        self
    }

    /// View of the event as a structured attribute tree, the shape patterns
    /// are evaluated against. Top-level attributes sit alongside the payload.
    pub fn attributes(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("id".to_string(), Value::String(self.id.clone()));
        map.insert("source".to_string(), Value::String(self.source.clone()));
        map.insert(
            "detail_type".to_string(),
            Value::String(self.detail_type.clone()),
        );
        if let Some(account) = &self.account {
            map.insert("account".to_string(), Value::String(account.clone()));
        }
        if let Some(region) = &self.region {
            map.insert("region".to_string(), Value::String(region.clone()));
        }
        if let Some(participant) = &self.participant {
            map.insert(
                "participant".to_string(),
                Value::String(participant.clone()),
            );
        }
        map.insert("payload".to_string(), self.payload.clone());
        Value::Object(map)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
