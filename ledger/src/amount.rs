//! Amount requests for burns and transfers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much a burn or transfer should move.
///
/// `Full` lets a caller redeem everything without racing a balance that keeps
/// growing between query and execution. It is resolved to the settled balance
/// inside the coordinator before any validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmountRequest {
    Exact(u128),
    Full,
}

impl AmountRequest {
    /// Interpret a raw amount using the `u128::MAX` = "everything" convention
    /// of hosts that cannot express the enum.
    pub fn from_raw(raw: u128) -> Self {
        if raw == u128::MAX {
            AmountRequest::Full
        } else {
            AmountRequest::Exact(raw)
        }
    }

    /// Resolve against the settled balance of the source account.
    pub fn resolve(self, settled_balance: u128) -> u128 {
        match self {
            AmountRequest::Exact(amount) => amount,
            AmountRequest::Full => settled_balance,
        }
    }
}

impl From<u128> for AmountRequest {
    fn from(amount: u128) -> Self {
        AmountRequest::Exact(amount)
    }
}

impl fmt::Display for AmountRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountRequest::Exact(amount) => write!(f, "{amount}"),
            AmountRequest::Full => write!(f, "full balance"),
        }
    }
}
