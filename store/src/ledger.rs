use crate::StoreError;
use rebase_types::AccountId;

/// A raw key/value pair written to the metadata table.
pub type MetaEntry = (Vec<u8>, Vec<u8>);

/// Store trait for persisting the ledger's account table and scalar state.
///
/// Uses opaque `Vec<u8>` so the store doesn't depend on the `rebase-ledger` crate
/// (which would create a circular dependency). The ledger serializes/deserializes
/// its own types.
pub trait LedgerStore {
    fn iter_accounts(&self) -> Result<Vec<(AccountId, Vec<u8>)>, StoreError>;

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write a set of accounts and metadata entries atomically: either every
    /// entry lands or none does.
    fn write_batch(
        &self,
        accounts: &[(AccountId, Vec<u8>)],
        meta: &[MetaEntry],
    ) -> Result<(), StoreError>;
}
