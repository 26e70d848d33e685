use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use thiserror::Error;

use crate::domain::{
    is_cents_field, parse_timestamp, Account, Cents, Transaction, TransactionKind, TxId,
};

use super::StorageConfig;

pub const ACCOUNTS_HEADER: [&str; 3] = ["account_id", "name", "balance_cents"];
pub const LEDGER_HEADER: [&str; 7] = [
    "ts_iso",
    "tx_id",
    "type",
    "from",
    "to",
    "amount_cents",
    "note",
];

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cannot access {}: {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        StorageError::Unavailable {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        StorageError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A row that was dropped while loading. Loading continues past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRecord {
    pub file: PathBuf,
    pub line: u64,
    pub field: Option<&'static str>,
    pub error: String,
}

impl std::fmt::Display for InvalidRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: ", self.file.display(), self.line)?;
        if let Some(field) = self.field {
            write!(f, "{}: ", field)?;
        }
        f.write_str(&self.error)
    }
}

/// Records read from one file, plus the rows that had to be skipped.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub invalid: Vec<InvalidRecord>,
}

/// Flat-file storage for the two ledger tables.
///
/// Every save rewrites both files completely. Fields are written with CSV
/// quoting, so names and notes may contain commas, quotes or newlines.
pub struct Repository {
    accounts_path: PathBuf,
    ledger_path: PathBuf,
}

impl Repository {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            accounts_path: config.accounts_path(),
            ledger_path: config.ledger_path(),
        }
    }

    /// Open the data directory, creating it and any missing file with a
    /// header-only body.
    ///
    /// Failures are logged and startup carries on: loading then finds
    /// nothing, and the first save reports the problem as a [`StorageError`].
    pub fn init(config: &StorageConfig) -> Self {
        if let Err(e) = fs::create_dir_all(&config.data_dir) {
            tracing::error!(path = %config.data_dir.display(), error = %e, "cannot create data directory");
        }

        let repo = Self::new(config);
        for (path, header) in [
            (&repo.accounts_path, &ACCOUNTS_HEADER[..]),
            (&repo.ledger_path, &LEDGER_HEADER[..]),
        ] {
            if let Err(e) = ensure_file(path, header) {
                tracing::error!(error = %e, "cannot create data file");
            }
        }
        repo
    }

    pub fn accounts_path(&self) -> &Path {
        &self.accounts_path
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    // ========================
    // Loading
    // ========================

    pub fn load_accounts(&self) -> Result<Loaded<Account>, StorageError> {
        load_table(&self.accounts_path, parse_account)
    }

    pub fn load_transactions(&self) -> Result<Loaded<Transaction>, StorageError> {
        load_table(&self.ledger_path, parse_transaction)
    }

    // ========================
    // Saving
    // ========================

    /// Rewrite both files from the given collections.
    ///
    /// Accounts are written first. If that fails the ledger file is left as it
    /// was; the in-memory state is never rolled back.
    pub fn save(
        &self,
        accounts: &[Account],
        transactions: &[Transaction],
    ) -> Result<(), StorageError> {
        self.save_accounts(accounts)?;
        self.save_transactions(transactions)?;
        tracing::debug!(
            accounts = accounts.len(),
            transactions = transactions.len(),
            "ledger persisted"
        );
        Ok(())
    }

    pub fn save_accounts(&self, accounts: &[Account]) -> Result<(), StorageError> {
        write_table(&self.accounts_path, &ACCOUNTS_HEADER, accounts, |account| {
            vec![
                account.id.clone(),
                account.name.clone(),
                account.balance_cents.to_string(),
            ]
        })
    }

    pub fn save_transactions(&self, transactions: &[Transaction]) -> Result<(), StorageError> {
        write_table(&self.ledger_path, &LEDGER_HEADER, transactions, |tx| {
            vec![
                tx.timestamp_iso(),
                tx.tx_id.to_string(),
                tx.kind.as_str().to_string(),
                tx.from_id.clone().unwrap_or_default(),
                tx.to_id.clone().unwrap_or_default(),
                tx.amount_cents.to_string(),
                tx.note.clone(),
            ]
        })
    }
}

fn ensure_file(path: &Path, header: &[&str]) -> Result<(), StorageError> {
    if path.exists() {
        return Ok(());
    }
    let mut content = header.join(",");
    content.push('\n');
    fs::write(path, content).map_err(|e| StorageError::io(path, e))?;
    tracing::info!(path = %path.display(), "created data file");
    Ok(())
}

/// Why a single row could not be turned into a record.
struct RowError {
    field: Option<&'static str>,
    error: String,
}

impl RowError {
    fn field(field: &'static str, error: impl Into<String>) -> Self {
        Self {
            field: Some(field),
            error: error.into(),
        }
    }
}

fn load_table<T>(
    path: &Path,
    parse: impl Fn(&StringRecord) -> Result<T, RowError>,
) -> Result<Loaded<T>, StorageError> {
    let file = fs::File::open(path).map_err(|e| StorageError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let mut records = Vec::new();
    let mut invalid = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let fallback_line = index as u64 + 2; // header is line 1

        let outcome = match result {
            Ok(record) => {
                let line = record.position().map_or(fallback_line, |p| p.line());
                parse(&record).map_err(|e| (line, e))
            }
            Err(e) if e.is_io_error() => return Err(StorageError::csv(path, e)),
            Err(e) => Err((
                fallback_line,
                RowError {
                    field: None,
                    error: format!("CSV parse error: {}", e),
                },
            )),
        };

        match outcome {
            Ok(record) => records.push(record),
            Err((line, e)) => {
                tracing::warn!(
                    file = %path.display(),
                    line,
                    field = e.field.unwrap_or("-"),
                    "skipping invalid record: {}",
                    e.error
                );
                invalid.push(InvalidRecord {
                    file: path.to_path_buf(),
                    line,
                    field: e.field,
                    error: e.error,
                });
            }
        }
    }

    tracing::debug!(
        file = %path.display(),
        loaded = records.len(),
        skipped = invalid.len(),
        "table loaded"
    );
    Ok(Loaded { records, invalid })
}

fn write_table<T>(
    path: &Path,
    header: &[&str],
    rows: &[T],
    to_record: impl Fn(&T) -> Vec<String>,
) -> Result<(), StorageError> {
    let tmp_path = path.with_extension("csv.tmp");

    let mut writer = csv::Writer::from_path(&tmp_path).map_err(|e| StorageError::csv(&tmp_path, e))?;
    writer
        .write_record(header)
        .map_err(|e| StorageError::csv(&tmp_path, e))?;
    for row in rows {
        writer
            .write_record(to_record(row))
            .map_err(|e| StorageError::csv(&tmp_path, e))?;
    }
    writer.flush().map_err(|e| StorageError::io(&tmp_path, e))?;
    drop(writer);

    fs::rename(&tmp_path, path).map_err(|e| StorageError::io(path, e))
}

fn parse_cents_field(field: &'static str, value: &str) -> Result<Cents, RowError> {
    if !is_cents_field(value) {
        return Err(RowError::field(field, format!("invalid amount {:?}", value)));
    }
    value
        .parse()
        .map_err(|e| RowError::field(field, format!("invalid amount {:?}: {}", value, e)))
}

fn parse_account(record: &StringRecord) -> Result<Account, RowError> {
    if record.len() != ACCOUNTS_HEADER.len() {
        return Err(RowError {
            field: None,
            error: format!(
                "expected {} fields, found {}",
                ACCOUNTS_HEADER.len(),
                record.len()
            ),
        });
    }

    let id = record.get(0).unwrap_or("");
    let name = record.get(1).unwrap_or("");
    let balance = parse_cents_field("balance_cents", record.get(2).unwrap_or(""))?;

    Ok(Account::new(id, name, balance))
}

fn parse_transaction(record: &StringRecord) -> Result<Transaction, RowError> {
    if record.len() < LEDGER_HEADER.len() {
        return Err(RowError {
            field: None,
            error: format!(
                "expected {} fields, found {}",
                LEDGER_HEADER.len(),
                record.len()
            ),
        });
    }

    let amount_cents = parse_cents_field("amount_cents", record.get(5).unwrap_or(""))?;

    let ts = record.get(0).unwrap_or("");
    let timestamp = parse_timestamp(ts)
        .map_err(|e| RowError::field("ts_iso", format!("invalid timestamp {:?}: {}", ts, e)))?;

    let tx_id: TxId = record
        .get(1)
        .unwrap_or("")
        .parse()
        .map_err(|e: String| RowError::field("tx_id", e))?;

    let kind: TransactionKind = record
        .get(2)
        .unwrap_or("")
        .parse()
        .map_err(|e: String| RowError::field("type", e))?;

    let party = |i: usize| {
        record
            .get(i)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    // Unquoted notes from older files may have been split on commas.
    let note = record.iter().skip(6).collect::<Vec<_>>().join(",");

    Ok(Transaction {
        timestamp,
        tx_id,
        kind,
        from_id: party(3),
        to_id: party(4),
        amount_cents,
        note,
    })
}
