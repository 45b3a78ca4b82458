//! Ledger errors.

use rebase_types::{AccountId, Capability, Rate};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("protocol rate may only decrease: current {current}, requested {requested}")]
    RateIncreaseRejected { current: Rate, requested: Rate },

    #[error("{caller} lacks capability {capability}")]
    Unauthorized {
        caller: AccountId,
        capability: Capability,
    },

    #[error("invalid account id ({} bytes)", .0.as_str().len())]
    InvalidAccount(AccountId),

    #[error("insufficient balance: need {needed}, available {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("insufficient allowance: need {needed}, approved {available}")]
    InsufficientAllowance { needed: u128, available: u128 },

    #[error("arithmetic overflow in accrual computation")]
    ArithmeticOverflow,

    #[error("storage error: {0}")]
    Store(#[from] rebase_store::StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for LedgerError {
    fn from(e: bincode::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}
