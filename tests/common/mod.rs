// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use tally::application::LedgerService;
use tally::domain::FixedClock;
use tally::storage::StorageConfig;
use tempfile::TempDir;

/// Helper to create a test service over a temporary data directory
pub fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = open(&temp_dir)?;
    Ok((service, temp_dir))
}

/// (Re)open the ledger stored in `temp_dir`, with a fixed clock
pub fn open(temp_dir: &TempDir) -> Result<LedgerService> {
    let config = config(temp_dir);
    Ok(LedgerService::open_with_clock(
        &config,
        Box::new(FixedClock(fixed_now())),
    ))
}

pub fn config(temp_dir: &TempDir) -> StorageConfig {
    StorageConfig::new(temp_dir.path().join("data"))
}

pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

/// Test fixture: Alice and Bob, both empty
pub struct StandardAccounts;

impl StandardAccounts {
    pub fn create(service: &mut LedgerService) -> Result<()> {
        service.create_account("A001", "Alice", 0)?;
        service.create_account("A002", "Bob", 0)?;
        Ok(())
    }

    /// Alice and Bob, with `amount` deposited to Alice
    pub fn create_funded(service: &mut LedgerService, amount: i64) -> Result<()> {
        Self::create(service)?;
        service.deposit("A001", amount, "opening")?;
        Ok(())
    }
}
