use heed::{types::Bytes, Database, Env};
use rebase_store::{LedgerStore, MetaEntry, StoreError};
use rebase_types::AccountId;

use crate::LmdbError;

/// LMDB-backed implementation of [`LedgerStore`].
pub struct LmdbLedgerStore {
    env: Env,
    accounts_db: Database<Bytes, Bytes>,
    meta_db: Database<Bytes, Bytes>,
}

impl LmdbLedgerStore {
    pub fn new(env: Env, accounts_db: Database<Bytes, Bytes>, meta_db: Database<Bytes, Bytes>) -> Self {
        Self { env, accounts_db, meta_db }
    }
}

impl LedgerStore for LmdbLedgerStore {
    fn iter_accounts(&self) -> Result<Vec<(AccountId, Vec<u8>)>, StoreError> {
        let txn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut results = Vec::new();
        let iter = self.accounts_db.iter(&txn).map_err(LmdbError::from)?;
        for item in iter {
            let (key, val) = item.map_err(LmdbError::from)?;
            let id = std::str::from_utf8(key)
                .map_err(|e| LmdbError::InvalidKey(e.to_string()))?;
            results.push((AccountId::new(id), val.to_vec()));
        }
        Ok(results)
    }

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let txn = self.env.read_txn().map_err(LmdbError::from)?;
        let value = self.meta_db.get(&txn, key).map_err(LmdbError::from)?;
        Ok(value.map(|bytes| bytes.to_vec()))
    }

    fn write_batch(
        &self,
        accounts: &[(AccountId, Vec<u8>)],
        meta: &[MetaEntry],
    ) -> Result<(), StoreError> {
        // Dropping the transaction without commit aborts it, so an error
        // part-way leaves the database untouched.
        let mut txn = self.env.write_txn().map_err(LmdbError::from)?;
        for (id, state) in accounts {
            self.accounts_db
                .put(&mut txn, id.as_str().as_bytes(), state)
                .map_err(LmdbError::from)?;
        }
        for (key, value) in meta {
            self.meta_db
                .put(&mut txn, key, value)
                .map_err(LmdbError::from)?;
        }
        txn.commit().map_err(LmdbError::from)?;
        tracing::trace!(accounts = accounts.len(), meta = meta.len(), "committed write batch");
        Ok(())
    }
}
