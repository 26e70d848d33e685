use thiserror::Error;

use crate::domain::LedgerError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Export failed: {0}")]
    Export(#[from] serde_json::Error),

    #[error("Export failed: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// True for errors that left the in-memory ledger changed but not saved.
    pub fn is_unsaved(&self) -> bool {
        matches!(self, AppError::Storage(_))
    }
}
