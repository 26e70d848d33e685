use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{AccountId, Cents};

/// Timestamps are local wall-clock time, second precision, no offset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Width of the zero-padded decimal form of a [`TxId`].
pub const TX_ID_WIDTH: usize = 10;

/// Largest id that still fits in [`TX_ID_WIDTH`] digits.
pub const MAX_TX_ID: u64 = 9_999_999_999;

/// Transaction identifier. Rendered as a fixed-width, zero-padded decimal
/// string, e.g. `0000000042`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TxId(u64);

impl TxId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = TX_ID_WIDTH)
    }
}

impl FromStr for TxId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("invalid transaction id: {s:?}"));
        }
        if s.len() > TX_ID_WIDTH {
            return Err(format!(
                "transaction id {s:?} is longer than {TX_ID_WIDTH} digits"
            ));
        }
        s.parse::<u64>()
            .map(TxId)
            .map_err(|e| format!("invalid transaction id {s:?}: {e}"))
    }
}

impl From<TxId> for String {
    fn from(id: TxId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for TxId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Hands out strictly increasing transaction ids. Never reuses one.
#[derive(Debug, Clone, Default)]
pub struct TxIdGenerator {
    last: u64,
}

impl TxIdGenerator {
    /// A generator whose first id will be `last + 1`.
    pub fn starting_after(last: u64) -> Self {
        Self { last }
    }

    /// Seed from existing history so new ids continue after the highest one.
    pub fn seeded_from<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let last = transactions
            .into_iter()
            .map(|tx| tx.tx_id.value())
            .max()
            .unwrap_or(0);
        Self::starting_after(last)
    }

    /// The next id, or `None` once every [`TX_ID_WIDTH`]-digit id is used up.
    pub fn issue(&mut self) -> Option<TxId> {
        let next = self.last.checked_add(1).filter(|&id| id <= MAX_TX_ID)?;
        self.last = next;
        Some(TxId(next))
    }

    pub fn last_issued(&self) -> u64 {
        self.last
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money entering an account from outside the ledger
    Deposit,
    /// Money leaving an account to outside the ledger
    Withdraw,
    /// Money moving between two accounts
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdraw => "withdraw",
            TransactionKind::Transfer => "transfer",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdraw" => Ok(TransactionKind::Withdraw),
            "transfer" => Ok(TransactionKind::Transfer),
            other => Err(format!("unknown transaction type: {other:?}")),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded movement of funds. Transactions are immutable once appended
/// to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// When the transaction was recorded (local time)
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub tx_id: TxId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Debited account; empty for deposits
    pub from_id: Option<AccountId>,
    /// Credited account; empty for withdrawals
    pub to_id: Option<AccountId>,
    pub amount_cents: Cents,
    pub note: String,
}

impl Transaction {
    pub fn deposit(
        tx_id: TxId,
        timestamp: NaiveDateTime,
        to_id: impl Into<AccountId>,
        amount_cents: Cents,
        note: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            tx_id,
            kind: TransactionKind::Deposit,
            from_id: None,
            to_id: Some(to_id.into()),
            amount_cents,
            note: note.into(),
        }
    }

    pub fn withdraw(
        tx_id: TxId,
        timestamp: NaiveDateTime,
        from_id: impl Into<AccountId>,
        amount_cents: Cents,
        note: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            tx_id,
            kind: TransactionKind::Withdraw,
            from_id: Some(from_id.into()),
            to_id: None,
            amount_cents,
            note: note.into(),
        }
    }

    pub fn transfer(
        tx_id: TxId,
        timestamp: NaiveDateTime,
        from_id: impl Into<AccountId>,
        to_id: impl Into<AccountId>,
        amount_cents: Cents,
        note: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            tx_id,
            kind: TransactionKind::Transfer,
            from_id: Some(from_id.into()),
            to_id: Some(to_id.into()),
            amount_cents,
            note: note.into(),
        }
    }

    /// Returns true if `account_id` is either party of this transaction.
    pub fn touches(&self, account_id: &str) -> bool {
        self.from_id.as_deref() == Some(account_id) || self.to_id.as_deref() == Some(account_id)
    }

    pub fn timestamp_iso(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_timestamp(&s).map_err(serde::de::Error::custom)
    }
}
