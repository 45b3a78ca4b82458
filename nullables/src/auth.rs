//! Nullable authorizer — an explicit grant table for testing.

use rebase_types::{AccountId, Authorizer, Capability};
use std::collections::HashSet;
use std::sync::Mutex;

/// Authorizer whose answers are fully controlled by the test.
pub struct NullAuthorizer {
    allow_all: bool,
    grants: Mutex<HashSet<(AccountId, Capability)>>,
}

impl NullAuthorizer {
    /// Every caller holds every capability.
    pub fn allow_all() -> Self {
        Self {
            allow_all: true,
            grants: Mutex::new(HashSet::new()),
        }
    }

    /// Only explicitly granted capabilities are held.
    pub fn deny_all() -> Self {
        Self {
            allow_all: false,
            grants: Mutex::new(HashSet::new()),
        }
    }

    pub fn grant(&self, caller: &AccountId, capability: Capability) {
        self.grants
            .lock()
            .unwrap()
            .insert((caller.clone(), capability));
    }

    pub fn revoke(&self, caller: &AccountId, capability: Capability) {
        self.grants
            .lock()
            .unwrap()
            .remove(&(caller.clone(), capability));
    }
}

impl Authorizer for NullAuthorizer {
    fn is_authorized(&self, caller: &AccountId, capability: Capability) -> bool {
        self.allow_all
            || self
                .grants
                .lock()
                .unwrap()
                .contains(&(caller.clone(), capability))
    }
}
