//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the ledger (block clock, balance store, event
//! sink) is abstracted behind a trait in `scloud-types`. This crate provides
//! test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod balances;
pub mod clock;
pub mod events;

pub use balances::NullBalanceLedger;
pub use clock::NullClock;
pub use events::NullEventSink;
