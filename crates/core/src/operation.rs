// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable operations for bus and rule definitions
//!
//! Bus and rule definitions survive restarts; events and delivery attempts
//! do not. These are the entries appended to the operation log and replayed
//! into materialized state on startup.

use crate::pattern::Pattern;
use crate::rule::{RuleId, TargetRef};
use serde::{Deserialize, Serialize};

/// A durable administrative operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    BusCreate {
        name: String,
    },
    BusDelete {
        name: String,
    },
    RuleCreate {
        id: RuleId,
        bus: String,
        pattern: Pattern,
        target: TargetRef,
    },
    RuleDelete {
        id: RuleId,
    },
}
