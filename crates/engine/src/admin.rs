// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Idempotent administration of buses and rules
//!
//! Definitions are append-logged before they touch the live registry, so a
//! restart replays the log and arrives at the same registry contents.
//! Rule ids are a stable digest of (bus, pattern, target); re-declaring the
//! same resource yields the same id and no duplicate registration.

use crate::registry::RuleRegistry;
use relay_core::{Operation, Pattern, PatternError, Rule, RuleId, TargetRef};
use relay_storage::{MaterializedState, Wal, WalError};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors raised by administrative operations
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("bus not found: {0}")]
    BusNotFound(String),
    #[error("rule not found: {0}")]
    RuleNotFound(String),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error(transparent)]
    Storage(#[from] WalError),
}

/// Administrative front door: create/delete buses and rules, persisted to
/// the operation log and mirrored into the live registry.
pub struct Admin {
    registry: Arc<RuleRegistry>,
    inner: Mutex<AdminInner>,
}

struct AdminInner {
    wal: Wal,
    state: MaterializedState,
}

impl Admin {
    /// Open the operation log, replay it, and seed the registry
    pub fn open(path: &Path, registry: Arc<RuleRegistry>) -> Result<Self, AdminError> {
        let ops = Wal::replay(path)?;
        let state = MaterializedState::replay(&ops);
        let wal = Wal::open(path)?;

        for (bus, record) in &state.buses {
            registry.ensure_bus(bus);
            for rule in record.rules.values() {
                registry.add_rule(rule.clone());
            }
        }
        tracing::info!(
            operations = ops.len(),
            buses = state.buses.len(),
            "definitions restored from operation log"
        );

        Ok(Self {
            registry,
            inner: Mutex::new(AdminInner { wal, state }),
        })
    }

    /// Create a bus. Creating a bus that already exists is a no-op.
    pub fn create_bus(&self, name: &str) -> Result<(), AdminError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.state.has_bus(name) {
            return Ok(());
        }

        let op = Operation::BusCreate {
            name: name.to_string(),
        };
        inner.wal.append(&op)?;
        inner.state.apply(&op);
        self.registry.ensure_bus(name);
        tracing::info!(bus = %name, "bus created");
        Ok(())
    }

    /// Delete a bus and every rule attached to it. Deleting an unknown bus
    /// is a no-op.
    pub fn delete_bus(&self, name: &str) -> Result<(), AdminError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !inner.state.has_bus(name) {
            return Ok(());
        }

        let op = Operation::BusDelete {
            name: name.to_string(),
        };
        inner.wal.append(&op)?;
        inner.state.apply(&op);
        self.registry.drop_bus(name);
        tracing::info!(bus = %name, "bus deleted");
        Ok(())
    }

    /// Create a rule on an existing bus.
    ///
    /// The returned id is a stable digest of (bus, pattern, target):
    /// re-declaring an identical rule returns the same id without logging a
    /// second operation.
    pub fn create_rule(
        &self,
        bus: &str,
        pattern: Value,
        target: TargetRef,
    ) -> Result<RuleId, AdminError> {
        let pattern = Pattern::from_json(pattern)?;

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !inner.state.has_bus(bus) {
            return Err(AdminError::BusNotFound(bus.to_string()));
        }

        let rule = Rule::new(bus, pattern, target);
        if inner.state.find_rule(&rule.id).is_some() {
            return Ok(rule.id);
        }

        let op = Operation::RuleCreate {
            id: rule.id.clone(),
            bus: rule.bus.clone(),
            pattern: rule.pattern.clone(),
            target: rule.target.clone(),
        };
        inner.wal.append(&op)?;
        inner.state.apply(&op);
        let id = self.registry.add_rule(rule);
        tracing::info!(rule_id = %id, bus = %bus, "rule created");
        Ok(id)
    }

    /// Delete a rule by id
    pub fn delete_rule(&self, id: &RuleId) -> Result<(), AdminError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.state.find_rule(id).is_none() {
            return Err(AdminError::RuleNotFound(id.to_string()));
        }

        let op = Operation::RuleDelete { id: id.clone() };
        inner.wal.append(&op)?;
        inner.state.apply(&op);
        self.registry.remove_rule(id);
        tracing::info!(rule_id = %id, "rule deleted");
        Ok(())
    }

    /// Names of all buses currently defined
    pub fn buses(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.state.buses.keys().cloned().collect()
    }
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
