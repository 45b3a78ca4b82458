//! LMDB storage backend for the rebase ledger.
//!
//! Implements the storage traits from `rebase-store` using the `heed` LMDB bindings.
//! The account table and the scalar metadata each map to one LMDB database
//! within a single environment.

pub mod environment;
pub mod error;
pub mod ledger;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use ledger::LmdbLedgerStore;
