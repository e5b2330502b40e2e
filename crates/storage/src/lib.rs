// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay-storage: Durability for bus and rule definitions
//!
//! Definitions are durable; events and delivery attempts are not. The crate
//! provides an append-only operation log (`Wal`) and the `MaterializedState`
//! rebuilt from it on startup.

pub mod state;
pub mod wal;

pub use state::{BusRecord, MaterializedState};
pub use wal::{Wal, WalError};
