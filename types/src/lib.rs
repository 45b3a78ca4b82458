//! Fundamental types for the rebase ledger.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account identifiers, fixed-point rates, timestamps, and the collaborator
//! traits (clock, authorization) the ledger core consumes.

pub mod account;
pub mod auth;
pub mod rate;
pub mod time;

pub use account::{AccountId, MAX_ACCOUNT_ID_LEN};
pub use auth::{Authorizer, Capability};
pub use rate::{Rate, RATE_SCALE};
pub use time::{Clock, SystemClock, Timestamp};
