// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rule registry with copy-on-write snapshots
//!
//! Dispatch reads rules far more often than administration writes them.
//! Each bus holds an immutable `Arc<[Rule]>`; readers clone the Arc and
//! iterate without holding any lock, and writers build a fresh slice and
//! swap it in. A snapshot taken mid-mutation is always one of the two
//! complete states, never a torn view.

use relay_core::{Rule, RuleId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Concurrency-safe store of rules, keyed by bus
#[derive(Default)]
pub struct RuleRegistry {
    buses: RwLock<HashMap<String, Arc<[Rule]>>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bus if it is not already known
    pub fn ensure_bus(&self, name: &str) {
        let mut buses = self.buses.write().unwrap_or_else(|e| e.into_inner());
        buses.entry(name.to_string()).or_insert_with(|| Arc::from(Vec::new()));
    }

    /// Remove a bus and every rule attached to it
    pub fn drop_bus(&self, name: &str) -> bool {
        let mut buses = self.buses.write().unwrap_or_else(|e| e.into_inner());
        buses.remove(name).is_some()
    }

    /// Add a rule to its bus, replacing any existing rule with the same id.
    ///
    /// The bus entry is created if missing; administrative existence checks
    /// belong to the caller.
    pub fn add_rule(&self, rule: Rule) -> RuleId {
        let id = rule.id.clone();
        let mut buses = self.buses.write().unwrap_or_else(|e| e.into_inner());
        let current = buses.entry(rule.bus.clone()).or_insert_with(|| Arc::from(Vec::new()));

        let mut next: Vec<Rule> = current
            .iter()
            .filter(|r| r.id != rule.id)
            .cloned()
            .collect();
        next.push(rule);
        *current = Arc::from(next);
        id
    }

    /// Remove a rule by id, searching all buses
    pub fn remove_rule(&self, id: &RuleId) -> bool {
        let mut buses = self.buses.write().unwrap_or_else(|e| e.into_inner());
        for rules in buses.values_mut() {
            if rules.iter().any(|r| r.id == *id) {
                let next: Vec<Rule> = rules.iter().filter(|r| r.id != *id).cloned().collect();
                *rules = Arc::from(next);
                return true;
            }
        }
        false
    }

    /// Consistent snapshot of the rules on one bus.
    ///
    /// The returned slice never changes, even if rules are added or removed
    /// after the call.
    pub fn rules_for(&self, bus: &str) -> Arc<[Rule]> {
        let buses = self.buses.read().unwrap_or_else(|e| e.into_inner());
        buses.get(bus).cloned().unwrap_or_else(|| Arc::from(Vec::new()))
    }

    pub fn has_bus(&self, name: &str) -> bool {
        let buses = self.buses.read().unwrap_or_else(|e| e.into_inner());
        buses.contains_key(name)
    }

    pub fn bus_names(&self) -> Vec<String> {
        let buses = self.buses.read().unwrap_or_else(|e| e.into_inner());
        buses.keys().cloned().collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
