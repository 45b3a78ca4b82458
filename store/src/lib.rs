//! Abstract storage traits for the rebase ledger.
//!
//! Every storage backend (LMDB, in-memory for testing) implements
//! these traits. The rest of the codebase depends only on the traits.

pub mod error;
pub mod ledger;

pub use error::StoreError;
pub use ledger::{LedgerStore, MetaEntry};
