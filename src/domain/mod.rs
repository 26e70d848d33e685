mod account;
mod clock;
mod ledger;
mod money;
mod transaction;

pub use account::*;
pub use clock::*;
pub use ledger::*;
pub use money::*;
pub use transaction::*;
