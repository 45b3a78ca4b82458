//! Protocol rate and personal rate assignment.

use crate::account::AccountState;
use crate::error::LedgerError;
use rebase_types::{Rate, Timestamp};
use serde::{Deserialize, Serialize};

/// One protocol rate that was in effect from `effective_at`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateChange {
    pub rate: Rate,
    pub effective_at: Timestamp,
}

/// Holds the protocol-wide rate offered to newly funded accounts.
///
/// The rate can only move down. Every accepted update is appended to the
/// history, so the history is non-increasing by construction. Changing the
/// protocol rate never touches existing accounts: each keeps the rate it was
/// assigned when funded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateRegistry {
    history: Vec<RateChange>,
}

impl RateRegistry {
    pub fn new(initial_rate: Rate, genesis: Timestamp) -> Self {
        Self {
            history: vec![RateChange {
                rate: initial_rate,
                effective_at: genesis,
            }],
        }
    }

    pub fn current_protocol_rate(&self) -> Rate {
        self.history.last().map(|c| c.rate).unwrap_or(Rate::ZERO)
    }

    /// Lower (or keep) the protocol rate. Returns the previous rate.
    ///
    /// Rejects any increase with [`LedgerError::RateIncreaseRejected`],
    /// leaving the stored rate unchanged.
    pub fn set_protocol_rate(&mut self, new_rate: Rate, at: Timestamp) -> Result<Rate, LedgerError> {
        let current = self.current_protocol_rate();
        if new_rate > current {
            return Err(LedgerError::RateIncreaseRejected {
                current,
                requested: new_rate,
            });
        }
        self.history.push(RateChange {
            rate: new_rate,
            effective_at: at,
        });
        Ok(current)
    }

    pub fn history(&self) -> &[RateChange] {
        &self.history
    }

    /// Lock `source` in as the account's personal rate.
    ///
    /// Only an unfunded account can be assigned a rate; for a funded account
    /// this is a no-op returning `false`. This is the single place personal
    /// rates are written.
    pub fn assign_rate(state: &mut AccountState, source: Rate) -> bool {
        if state.is_funded() {
            return false;
        }
        state.personal_rate = source;
        true
    }
}

impl Default for RateRegistry {
    fn default() -> Self {
        Self::new(Rate::ZERO, Timestamp::EPOCH)
    }
}
