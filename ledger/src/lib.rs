//! Interest-accruing balance ledger.
//!
//! Each account's balance grows linearly over time at a personal rate locked
//! in when the account is funded:
//! `balance(a, now) = principal(a) × (P + rate(a) × (now − last_settled_at(a))) / P`
//!
//! This crate handles:
//! - The protocol rate, which may only decrease, and personal rate assignment
//! - Lazy accrual: interest is settled into principal only when an account is touched
//! - Mint, burn, transfer and allowance operations that settle before mutating
//! - Event emission, persistence, configuration and logging setup

pub mod account;
pub mod accrual;
pub mod amount;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod logging;
pub mod registry;

pub use account::AccountState;
pub use accrual::{AccrualEngine, Settlement};
pub use amount::AmountRequest;
pub use config::LedgerConfig;
pub use coordinator::{Collaborators, RebaseLedger, UNLIMITED_ALLOWANCE};
pub use error::LedgerError;
pub use events::{EventBus, EventSink, LedgerEvent, NoopSink};
pub use logging::{init_logging, LogFormat};
pub use registry::{RateChange, RateRegistry};
