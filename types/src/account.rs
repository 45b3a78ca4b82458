//! Account identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An address-like key identifying one ledger account.
///
/// The ordering is significant: operations touching two accounts acquire
/// their locks in ascending `AccountId` order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

/// Longest id that fits an LMDB key.
pub const MAX_ACCOUNT_ID_LEN: usize = 511;

impl AccountId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Non-empty and short enough to be stored as a key.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.len() <= MAX_ACCOUNT_ID_LEN
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
