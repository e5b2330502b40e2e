// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay-engine: The running event-bus dispatch engine
//!
//! This crate provides:
//! - `RuleRegistry` - copy-on-write rule snapshots per bus
//! - `EventBus` - publish validation, dedup window, FIFO hand-off to dispatch
//! - `Dispatcher` - per-event fan-out with bounded delivery concurrency
//! - `DeliveryClient` - timeout-wrapped target invocation with retry/backoff
//! - `AuditLog` - in-flight attempt tracking and settlement records
//! - `Admin` - idempotent bus/rule administration, persisted via relay-storage

pub mod admin;
pub mod audit;
pub mod bus;
pub mod delivery;
pub mod dispatcher;
pub mod registry;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

// Re-exports
pub use admin::{Admin, AdminError};
pub use audit::AuditLog;
pub use bus::{BusDeps, EventBus, PublishError, Receipt};
pub use delivery::{DeliveryClient, InvokeError, TargetInvoker};
pub use dispatcher::Dispatcher;
pub use registry::RuleRegistry;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeInvoker, FakeOutcome};
