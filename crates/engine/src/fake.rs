// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted target invoker for tests
//!
//! Outcomes are queued per target key (the target's `describe()` string);
//! once a script runs out the invoker succeeds. `Hang` never resolves, which
//! exercises the delivery timeout path.

use crate::delivery::{InvokeError, TargetInvoker};
use async_trait::async_trait;
use relay_core::{Event, TargetRef};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// One scripted response from the fake compute host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeOutcome {
    /// Invocation succeeds
    Ok,
    /// Invocation fails with a retryable error
    Transient,
    /// Invocation fails with a non-retryable error
    Permanent,
    /// Invocation never resolves; the delivery timeout fires
    Hang,
}

#[derive(Default)]
struct FakeState {
    scripts: HashMap<String, VecDeque<FakeOutcome>>,
    calls: Vec<(String, String)>,
}

/// In-memory `TargetInvoker` with per-target scripted outcomes
#[derive(Default)]
pub struct FakeInvoker {
    state: Mutex<FakeState>,
}

impl FakeInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue outcomes for the target identified by `TargetRef::describe`
    pub fn script(&self, target: &TargetRef, outcomes: impl IntoIterator<Item = FakeOutcome>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .scripts
            .entry(target.describe())
            .or_default()
            .extend(outcomes);
    }

    /// All recorded invocations as (event id, target key) pairs, in call order
    pub fn calls(&self) -> Vec<(String, String)> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.clone()
    }

    /// Number of invocations recorded for one target
    pub fn call_count(&self, target: &TargetRef) -> usize {
        let key = target.describe();
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.iter().filter(|(_, t)| *t == key).count()
    }

    fn next_outcome(&self, event: &Event, target: &TargetRef) -> FakeOutcome {
        let key = target.describe();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push((event.id.clone(), key.clone()));
        state
            .scripts
            .get_mut(&key)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(FakeOutcome::Ok)
    }
}

#[async_trait]
impl TargetInvoker for FakeInvoker {
    async fn invoke(&self, event: &Event, target: &TargetRef) -> Result<(), InvokeError> {
        match self.next_outcome(event, target) {
            FakeOutcome::Ok => Ok(()),
            FakeOutcome::Transient => Err(InvokeError::Transient("scripted transient".into())),
            FakeOutcome::Permanent => Err(InvokeError::Permanent("scripted permanent".into())),
            FakeOutcome::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}
