// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from operation log replay

use relay_core::{Operation, Rule, RuleId};
use std::collections::HashMap;

/// Durable definition of one bus and the rules attached to it
#[derive(Debug, Clone, Default)]
pub struct BusRecord {
    pub rules: HashMap<RuleId, Rule>,
}

/// Bus and rule definitions built from operation log replay
#[derive(Debug, Default)]
pub struct MaterializedState {
    pub buses: HashMap<String, BusRecord>,
}

impl MaterializedState {
    /// Rebuild state by applying operations in log order
    pub fn replay(ops: &[Operation]) -> Self {
        let mut state = Self::default();
        for op in ops {
            state.apply(op);
        }
        state
    }

    /// Apply one operation to update the state
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::BusCreate { name } => {
                self.buses.entry(name.clone()).or_default();
            }

            Operation::BusDelete { name } => {
                self.buses.remove(name);
            }

            Operation::RuleCreate {
                id,
                bus,
                pattern,
                target,
            } => {
                if let Some(record) = self.buses.get_mut(bus) {
                    record.rules.insert(
                        id.clone(),
                        Rule {
                            id: id.clone(),
                            bus: bus.clone(),
                            pattern: pattern.clone(),
                            target: target.clone(),
                        },
                    );
                }
            }

            Operation::RuleDelete { id } => {
                for record in self.buses.values_mut() {
                    record.rules.remove(id);
                }
            }
        }
    }

    pub fn has_bus(&self, name: &str) -> bool {
        self.buses.contains_key(name)
    }

    /// Find a rule by id across all buses
    pub fn find_rule(&self, id: &RuleId) -> Option<&Rule> {
        self.buses.values().find_map(|record| record.rules.get(id))
    }

    /// All rules defined on one bus, in no particular order
    pub fn rules_for(&self, bus: &str) -> Vec<&Rule> {
        self.buses
            .get(bus)
            .map(|record| record.rules.values().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
