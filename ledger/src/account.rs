//! Per-account ledger state.

use rebase_types::{Rate, Timestamp};
use serde::{Deserialize, Serialize};

/// State for a single account.
///
/// Fields are only readable from outside the crate: the personal rate is
/// written by [`RateRegistry::assign_rate`](crate::RateRegistry::assign_rate)
/// and principal moves only through settlement or a coordinator operation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Materialized base units, excluding interest accrued since `last_settled_at`.
    pub(crate) principal: u128,
    /// Rate locked in when the account was last funded from zero.
    pub(crate) personal_rate: Rate,
    /// When interest was last folded into principal; `None` if never settled.
    pub(crate) last_settled_at: Option<Timestamp>,
}

impl AccountState {
    pub fn principal(&self) -> u128 {
        self.principal
    }

    pub fn personal_rate(&self) -> Rate {
        self.personal_rate
    }

    pub fn last_settled_at(&self) -> Option<Timestamp> {
        self.last_settled_at
    }

    /// Whether the account currently holds materialized principal.
    pub fn is_funded(&self) -> bool {
        self.principal != 0
    }

    /// An account that was never touched carries nothing worth persisting.
    pub fn is_pristine(&self) -> bool {
        *self == Self::default()
    }
}
