//! Nullable infrastructure for deterministic testing.
//!
//! All external collaborators of the ledger (clock, authorization, storage)
//! are abstracted behind traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem
//!
//! Usage: swap real implementations for nullables in tests.

pub mod auth;
pub mod clock;
pub mod store;

pub use auth::NullAuthorizer;
pub use clock::NullClock;
pub use store::NullLedgerStore;
