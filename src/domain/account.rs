use serde::{Deserialize, Serialize};

use super::Cents;

pub type AccountId = String;

/// A named holder of a cent-denominated balance.
/// The id never changes once the account exists; only the balance moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub balance_cents: Cents,
}

impl Account {
    pub fn new(id: impl Into<AccountId>, name: impl Into<String>, balance_cents: Cents) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            balance_cents,
        }
    }

    pub fn can_cover(&self, amount_cents: Cents) -> bool {
        self.balance_cents >= amount_cents
    }
}
