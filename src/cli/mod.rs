pub mod session;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::application::LedgerService;
use crate::domain::{format_cents, Account, Cents, Transaction};
use crate::storage::StorageConfig;

pub use session::Session;

/// Tally - single-user ledger backed by flat CSV files
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Track account balances and a transaction ledger in two CSV files")]
#[command(version)]
pub struct Cli {
    /// Directory holding accounts.csv and ledger.csv
    #[arg(short, long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run (omit to start an interactive session)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all accounts
    List,

    /// Create a new account
    Create {
        /// Account id (must be unique)
        id: String,

        /// Account holder name
        name: String,

        /// Opening balance in cents
        #[arg(short, long, default_value_t = 0)]
        balance: Cents,
    },

    /// Deposit cents into an account
    Deposit {
        /// Account id
        id: String,

        /// Amount in cents
        amount: Cents,

        /// Free-text note
        #[arg(short, long, default_value = "")]
        note: String,
    },

    /// Withdraw cents from an account
    Withdraw {
        /// Account id
        id: String,

        /// Amount in cents
        amount: Cents,

        /// Free-text note
        #[arg(short, long, default_value = "")]
        note: String,
    },

    /// Move cents between two accounts
    Transfer {
        /// Source account id
        from: String,

        /// Destination account id
        to: String,

        /// Amount in cents
        amount: Cents,

        /// Free-text note
        #[arg(short, long, default_value = "")]
        note: String,
    },

    /// Show the balance of an account
    Balance {
        /// Account id
        id: String,
    },

    /// Show recent transactions for an account, newest first
    Statement {
        /// Account id
        id: String,

        /// Maximum number of transactions to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Export accounts and transactions as a JSON snapshot
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start the interactive session
    Shell,
}

impl Cli {
    /// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
    pub fn init_tracing(&self) {
        let default_level = if self.verbose { "debug" } else { "warn" };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .try_init();
    }

    pub fn run(self) -> Result<()> {
        let config = StorageConfig::new(&self.data_dir);
        let mut service = LedgerService::open(&config);

        let stdout = io::stdout();
        let mut out = stdout.lock();

        match self.command.unwrap_or(Commands::Shell) {
            Commands::Shell => {
                let stdin = io::stdin();
                Session::new(&mut service, stdin.lock(), &mut out).run()?;
            }

            Commands::List => write_accounts(&mut out, service.list_accounts())?,

            Commands::Create { id, name, balance } => {
                let account = service.create_account(&id, &name, balance)?;
                writeln!(
                    out,
                    "Created account: {} ({}) with {} cents",
                    account.id, account.name, account.balance_cents
                )?;
            }

            Commands::Deposit { id, amount, note } => {
                let tx = service.deposit(&id, amount, &note)?;
                write_recorded(&mut out, &tx)?;
            }

            Commands::Withdraw { id, amount, note } => {
                let tx = service.withdraw(&id, amount, &note)?;
                write_recorded(&mut out, &tx)?;
            }

            Commands::Transfer {
                from,
                to,
                amount,
                note,
            } => {
                let tx = service.transfer(&from, &to, amount, &note)?;
                write_recorded(&mut out, &tx)?;
            }

            Commands::Balance { id } => {
                let balance = service.balance(&id)?;
                write_balance(&mut out, balance)?;
            }

            Commands::Statement { id, limit } => {
                let rows = service.statement(&id, limit)?;
                write_statement(&mut out, &rows)?;
            }

            Commands::Export { output } => match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    let snapshot = service.export_json(BufWriter::new(file))?;
                    writeln!(
                        out,
                        "Exported {} accounts and {} transactions to {}",
                        snapshot.accounts.len(),
                        snapshot.transactions.len(),
                        path.display()
                    )?;
                }
                None => {
                    service.export_json(&mut out)?;
                }
            },
        }

        Ok(())
    }
}

pub fn write_accounts<W: Write>(out: &mut W, accounts: &[Account]) -> io::Result<()> {
    if accounts.is_empty() {
        return writeln!(out, "No accounts found.");
    }
    for account in accounts {
        writeln!(
            out,
            "{} | {} | {} cents",
            account.id, account.name, account.balance_cents
        )?;
    }
    Ok(())
}

pub fn write_balance<W: Write>(out: &mut W, balance: Cents) -> io::Result<()> {
    writeln!(
        out,
        "Current balance: {} cents. ({})",
        balance,
        format_cents(balance)
    )
}

pub fn write_statement<W: Write>(out: &mut W, rows: &[&Transaction]) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(out, "No transactions found for this account.");
    }
    for tx in rows {
        writeln!(
            out,
            "{}, {}, {}, {}, {}, {}, {}",
            tx.timestamp_iso(),
            tx.tx_id,
            tx.kind,
            tx.from_id.as_deref().unwrap_or(""),
            tx.to_id.as_deref().unwrap_or(""),
            tx.amount_cents,
            tx.note
        )?;
    }
    Ok(())
}

fn write_recorded<W: Write>(out: &mut W, tx: &Transaction) -> io::Result<()> {
    writeln!(
        out,
        "Recorded {}: {} cents ({})",
        tx.kind, tx.amount_cents, tx.tx_id
    )
}
