// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rules binding event patterns to delivery targets

use crate::pattern::Pattern;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identifier of a rule, stable across re-declarations
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(String);

impl RuleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to the consumer a rule delivers to.
///
/// Targets are capability handles: the engine never knows how a target is
/// hosted, only which invoker variant to hand the event to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetRef {
    /// A compute function on the external execution host
    Function { name: String },
    /// An HTTP endpoint
    Webhook { url: String },
}

impl TargetRef {
    /// Short description for log fields
    pub fn describe(&self) -> String {
        match self {
            Self::Function { name } => format!("function:{}", name),
            Self::Webhook { url } => format!("webhook:{}", url),
        }
    }
}

/// Binding of a pattern to a delivery target on one bus.
///
/// Rules are immutable once created; updates replace the rule under the
/// same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub bus: String,
    pub pattern: Pattern,
    pub target: TargetRef,
}

impl Rule {
    /// Create a rule with a deterministic id.
    ///
    /// The id is a digest of (bus, canonical pattern, target), so declaring
    /// the same resource twice yields the same logical rule.
    pub fn new(bus: impl Into<String>, pattern: Pattern, target: TargetRef) -> Self {
        let bus = bus.into();
        let id = Self::derive_id(&bus, &pattern, &target);
        Self {
            id,
            bus,
            pattern,
            target,
        }
    }

    fn derive_id(bus: &str, pattern: &Pattern, target: &TargetRef) -> RuleId {
        let mut hasher = Sha256::new();
        hasher.update(bus.as_bytes());
        hasher.update(b"\0");
        hasher.update(pattern.canonical().to_string().as_bytes());
        hasher.update(b"\0");
        hasher.update(target.describe().as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        RuleId(format!("rule-{}", &digest[..16]))
    }
}

#[cfg(test)]
#[path = "rule_tests.rs"]
mod tests;
