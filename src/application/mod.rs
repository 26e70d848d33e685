// Application layer - pairs the in-memory ledger with its storage.
// Every mutation goes through here so it is persisted exactly once.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
