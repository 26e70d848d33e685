use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Account, Cents, Clock, Ledger, SystemClock, Transaction};
use crate::storage::{InvalidRecord, Loaded, Repository, StorageConfig, StorageError};

use super::AppError;

/// Application service providing high-level operations for the ledger.
/// This is the primary interface for any client (CLI, interactive session, tests).
///
/// Mutations follow one order: change the in-memory ledger, append the
/// transaction, then rewrite both files.
pub struct LedgerService {
    ledger: Ledger,
    repo: Repository,
    load_report: Vec<InvalidRecord>,
}

/// Full dump of the ledger for export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
}

impl LedgerService {
    /// Open (creating if needed) the ledger stored under `config.data_dir`.
    pub fn open(config: &StorageConfig) -> Self {
        Self::open_with_clock(config, Box::new(SystemClock))
    }

    /// Open with a custom clock for transaction timestamps.
    ///
    /// Never fails. A data directory or file that cannot be created or read
    /// leaves its collection empty; rows that fail validation are dropped and
    /// listed in [`LedgerService::load_report`].
    pub fn open_with_clock(config: &StorageConfig, clock: Box<dyn Clock>) -> Self {
        let repo = Repository::init(config);
        let mut load_report = Vec::new();

        let accounts = take_loaded(repo.load_accounts(), &mut load_report);
        let transactions = take_loaded(repo.load_transactions(), &mut load_report);

        let ledger = Ledger::from_records(accounts, transactions, clock);
        tracing::info!(
            accounts = ledger.accounts().len(),
            transactions = ledger.transactions().len(),
            skipped = load_report.len(),
            last_tx_id = ledger.last_tx_id(),
            "ledger opened"
        );

        Self {
            ledger,
            repo,
            load_report,
        }
    }

    /// Rows dropped while loading.
    pub fn load_report(&self) -> &[InvalidRecord] {
        &self.load_report
    }

    fn persist(&self) -> Result<(), AppError> {
        self.repo
            .save(self.ledger.accounts(), self.ledger.transactions())
            .map_err(|e| {
                tracing::error!(error = %e, "failed to persist ledger; in-memory state is ahead of disk");
                AppError::from(e)
            })
    }

    // ========================
    // Account operations
    // ========================

    pub fn create_account(
        &mut self,
        id: &str,
        name: &str,
        initial_balance: Cents,
    ) -> Result<Account, AppError> {
        let account = self.ledger.create_account(id, name, initial_balance)?.clone();
        self.persist()?;
        Ok(account)
    }

    /// All accounts in creation order.
    pub fn list_accounts(&self) -> &[Account] {
        self.ledger.accounts()
    }

    pub fn balance(&self, id: &str) -> Result<Cents, AppError> {
        Ok(self.ledger.balance(id)?)
    }

    // ========================
    // Transaction operations
    // ========================

    pub fn deposit(&mut self, id: &str, amount_cents: Cents, note: &str) -> Result<Transaction, AppError> {
        let tx = self.ledger.deposit(id, amount_cents, note)?.clone();
        self.persist()?;
        Ok(tx)
    }

    pub fn withdraw(&mut self, id: &str, amount_cents: Cents, note: &str) -> Result<Transaction, AppError> {
        let tx = self.ledger.withdraw(id, amount_cents, note)?.clone();
        self.persist()?;
        Ok(tx)
    }

    pub fn transfer(
        &mut self,
        from_id: &str,
        to_id: &str,
        amount_cents: Cents,
        note: &str,
    ) -> Result<Transaction, AppError> {
        let tx = self.ledger.transfer(from_id, to_id, amount_cents, note)?.clone();
        self.persist()?;
        Ok(tx)
    }

    /// Up to `limit` transactions touching `id`, newest first.
    pub fn statement(&self, id: &str, limit: usize) -> Result<Vec<&Transaction>, AppError> {
        Ok(self.ledger.statement(id, limit)?)
    }

    /// Full history in insertion order.
    pub fn transactions(&self) -> &[Transaction] {
        self.ledger.transactions()
    }

    // ========================
    // Export
    // ========================

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            accounts: self.ledger.accounts().to_vec(),
            transactions: self.ledger.transactions().to_vec(),
        }
    }

    /// Write the whole ledger as pretty-printed JSON.
    pub fn export_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot, AppError> {
        let snapshot = self.snapshot();
        serde_json::to_writer_pretty(&mut writer, &snapshot)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(snapshot)
    }
}

fn take_loaded<T>(
    result: Result<Loaded<T>, StorageError>,
    report: &mut Vec<InvalidRecord>,
) -> Vec<T> {
    match result {
        Ok(loaded) => {
            report.extend(loaded.invalid);
            loaded.records
        }
        Err(e) => {
            tracing::error!(error = %e, "load step failed; starting with an empty collection");
            Vec::new()
        }
    }
}
