//! Nullable store — thread-safe in-memory storage for testing.

use rebase_store::{LedgerStore, MetaEntry, StoreError};
use rebase_types::AccountId;
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory ledger store for testing.
pub struct NullLedgerStore {
    accounts: Mutex<HashMap<AccountId, Vec<u8>>>,
    meta: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl NullLedgerStore {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            meta: Mutex::new(HashMap::new()),
        }
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }
}

impl Default for NullLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for NullLedgerStore {
    fn iter_accounts(&self) -> Result<Vec<(AccountId, Vec<u8>)>, StoreError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .map(|(id, bytes)| (id.clone(), bytes.clone()))
            .collect())
    }

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.meta.lock().unwrap().get(key).cloned())
    }

    fn write_batch(
        &self,
        accounts: &[(AccountId, Vec<u8>)],
        meta: &[MetaEntry],
    ) -> Result<(), StoreError> {
        let mut account_table = self.accounts.lock().unwrap();
        let mut meta_table = self.meta.lock().unwrap();
        for (id, state) in accounts {
            account_table.insert(id.clone(), state.clone());
        }
        for (key, value) in meta {
            meta_table.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}
