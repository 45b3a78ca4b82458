use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid account key: {0}")]
    InvalidKey(String),
}

impl From<LmdbError> for rebase_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::InvalidKey(key) => rebase_store::StoreError::Corruption(key),
            other => rebase_store::StoreError::Backend(other.to_string()),
        }
    }
}
