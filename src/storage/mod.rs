mod repository;

use std::path::PathBuf;

pub use repository::*;

pub const ACCOUNTS_FILE: &str = "accounts.csv";
pub const LEDGER_FILE: &str = "ledger.csv";

/// Where the ledger keeps its files.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn accounts_path(&self) -> PathBuf {
        self.data_dir.join(ACCOUNTS_FILE)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(LEDGER_FILE)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new("data")
    }
}
