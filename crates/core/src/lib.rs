// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay-core: Core library for the relay event-bus dispatch engine
//!
//! This crate provides:
//! - The immutable event record and its publish-time validation rules
//! - Declarative event patterns and the pure matcher
//! - Rules binding patterns to delivery targets
//! - Delivery outcome and audit record types
//! - Backoff sequences for retry policy
//! - Durable operations for bus/rule definitions
//! - Dispatch configuration (TOML-loadable)

pub mod clock;

pub mod backoff;
pub mod config;
pub mod event;
pub mod operation;
pub mod outcome;
pub mod pattern;
pub mod rule;

// Re-exports
pub use backoff::Backoff;
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, DispatchConfig};
pub use event::Event;
pub use operation::Operation;
pub use outcome::{AttemptOutcome, DeliveryAttempt, DeliveryOutcome, DeliveryRecord, Settlement};
pub use pattern::{Pattern, PatternError};
pub use rule::{Rule, RuleId, TargetRef};
