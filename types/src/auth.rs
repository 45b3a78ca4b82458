//! Authorization collaborator.
//!
//! The ledger only asks "may this caller do this?"; how permissions are
//! granted and governed lives outside the core.

use crate::AccountId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A privileged capability checked before state-changing calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Create or destroy tokens.
    MintAndBurn,
    /// Lower the protocol rate.
    RateAdmin,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::MintAndBurn => write!(f, "MINT_AND_BURN"),
            Capability::RateAdmin => write!(f, "RATE_ADMIN"),
        }
    }
}

/// Answers capability checks for callers.
pub trait Authorizer: Send + Sync {
    fn is_authorized(&self, caller: &AccountId, capability: Capability) -> bool;
}
