use thiserror::Error;

use super::{Account, Cents, Clock, MAX_TX_ID, Transaction, TxId, TxIdGenerator};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    #[error("Account id must not be empty")]
    InvalidAccountId,

    #[error("Invalid amount: {0} cents (must not be negative)")]
    InvalidAmount(Cents),

    #[error("Not enough balance in account {account_id}: balance {balance}, required {required}")]
    InsufficientFunds {
        account_id: String,
        balance: Cents,
        required: Cents,
    },

    #[error("Balance of account {0} would overflow")]
    BalanceOverflow(String),

    #[error("Transaction ids exhausted (last issued {0})")]
    TxIdExhausted(u64),
}

/// In-memory bookkeeping engine.
///
/// Owns the accounts (in creation order), the append-only transaction history
/// (in insertion order) and the id counter. Lookups are first-match by id;
/// ids are trimmed of surrounding whitespace on the way in.
/// A failed operation leaves every collection untouched.
pub struct Ledger {
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
    ids: TxIdGenerator,
    clock: Box<dyn Clock>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self::from_records(Vec::new(), Vec::new(), clock)
    }

    /// Rebuild a ledger from persisted records. The id counter continues after
    /// the highest loaded tx_id.
    pub fn from_records(
        accounts: Vec<Account>,
        transactions: Vec<Transaction>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let ids = TxIdGenerator::seeded_from(&transactions);
        Self {
            accounts,
            transactions,
            ids,
            clock,
        }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn last_tx_id(&self) -> u64 {
        self.ids.last_issued()
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        let id = id.trim();
        self.accounts.iter().find(|a| a.id == id)
    }

    fn position(&self, id: &str) -> Result<usize, LedgerError> {
        self.accounts
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
    }

    fn next_tx_id(&mut self) -> Result<TxId, LedgerError> {
        let last = self.ids.last_issued();
        self.ids.issue().ok_or_else(|| {
            tracing::error!(last, max = MAX_TX_ID, "transaction id space exhausted");
            LedgerError::TxIdExhausted(last)
        })
    }

    // ========================
    // Mutations
    // ========================

    /// Open a new account. Does not record a transaction.
    pub fn create_account(
        &mut self,
        id: &str,
        name: &str,
        initial_balance: Cents,
    ) -> Result<&Account, LedgerError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(LedgerError::InvalidAccountId);
        }
        validate_amount(initial_balance)?;
        if self.account(id).is_some() {
            return Err(LedgerError::AccountAlreadyExists(id.to_string()));
        }

        self.accounts.push(Account::new(id, name, initial_balance));
        tracing::debug!(account_id = id, initial_balance, "account created");
        Ok(&self.accounts[self.accounts.len() - 1])
    }

    pub fn deposit(
        &mut self,
        id: &str,
        amount_cents: Cents,
        note: &str,
    ) -> Result<&Transaction, LedgerError> {
        let id = id.trim();
        validate_amount(amount_cents)?;
        let idx = self.position(id)?;

        let credited = self.accounts[idx]
            .balance_cents
            .checked_add(amount_cents)
            .ok_or_else(|| LedgerError::BalanceOverflow(id.to_string()))?;
        let tx_id = self.next_tx_id()?;

        self.accounts[idx].balance_cents = credited;
        let tx = Transaction::deposit(tx_id, self.clock.now(), id, amount_cents, note);
        Ok(self.append(tx))
    }

    pub fn withdraw(
        &mut self,
        id: &str,
        amount_cents: Cents,
        note: &str,
    ) -> Result<&Transaction, LedgerError> {
        let id = id.trim();
        validate_amount(amount_cents)?;
        let idx = self.position(id)?;

        let account = &self.accounts[idx];
        if !account.can_cover(amount_cents) {
            return Err(LedgerError::InsufficientFunds {
                account_id: id.to_string(),
                balance: account.balance_cents,
                required: amount_cents,
            });
        }
        let tx_id = self.next_tx_id()?;

        self.accounts[idx].balance_cents -= amount_cents;
        let tx = Transaction::withdraw(tx_id, self.clock.now(), id, amount_cents, note);
        Ok(self.append(tx))
    }

    /// Move money between two accounts.
    ///
    /// The funds check happens before the destination is looked up, so an
    /// underfunded transfer to a missing account reports insufficient funds.
    /// A transfer to the same account is legal and nets to zero.
    pub fn transfer(
        &mut self,
        from_id: &str,
        to_id: &str,
        amount_cents: Cents,
        note: &str,
    ) -> Result<&Transaction, LedgerError> {
        let from_id = from_id.trim();
        let to_id = to_id.trim();
        validate_amount(amount_cents)?;
        let from_idx = self.position(from_id)?;

        let from = &self.accounts[from_idx];
        if !from.can_cover(amount_cents) {
            return Err(LedgerError::InsufficientFunds {
                account_id: from_id.to_string(),
                balance: from.balance_cents,
                required: amount_cents,
            });
        }

        let to_idx = self.position(to_id)?;
        let credited = self.accounts[to_idx]
            .balance_cents
            .checked_add(amount_cents)
            .ok_or_else(|| LedgerError::BalanceOverflow(to_id.to_string()))?;
        let tx_id = self.next_tx_id()?;

        // same account: debit and credit cancel out
        if from_idx != to_idx {
            self.accounts[from_idx].balance_cents -= amount_cents;
            self.accounts[to_idx].balance_cents = credited;
        }

        let tx = Transaction::transfer(
            tx_id,
            self.clock.now(),
            from_id,
            to_id,
            amount_cents,
            note,
        );
        Ok(self.append(tx))
    }

    fn append(&mut self, tx: Transaction) -> &Transaction {
        tracing::debug!(
            tx_id = %tx.tx_id,
            kind = %tx.kind,
            amount_cents = tx.amount_cents,
            "transaction recorded"
        );
        self.transactions.push(tx);
        &self.transactions[self.transactions.len() - 1]
    }

    // ========================
    // Queries
    // ========================

    pub fn balance(&self, id: &str) -> Result<Cents, LedgerError> {
        let id = id.trim();
        self.account(id)
            .map(|a| a.balance_cents)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
    }

    /// The most recent `limit` transactions touching `id`, newest first.
    pub fn statement(&self, id: &str, limit: usize) -> Result<Vec<&Transaction>, LedgerError> {
        let id = id.trim();
        if self.account(id).is_none() {
            return Err(LedgerError::AccountNotFound(id.to_string()));
        }

        Ok(self
            .transactions
            .iter()
            .rev()
            .filter(|tx| tx.touches(id))
            .take(limit)
            .collect())
    }
}

fn validate_amount(amount_cents: Cents) -> Result<(), LedgerError> {
    if amount_cents < 0 {
        return Err(LedgerError::InvalidAmount(amount_cents));
    }
    Ok(())
}
