use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("no expiry record found for staking tx {0}")]
    NotFound(String),
}

impl StoreError {
    /// A delete that matched nothing. Only happens on racing duplicate
    /// deletes, so callers log it instead of treating it as an
    /// infrastructure failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
