//! Domain module
//!
//! Core domain types and ledger rules.

pub mod account;
pub mod amount;
pub mod context;
pub mod error;
pub mod ledger;

pub use account::{Account, CashActivity, EntryType, NewAccount, NewCashActivity};
pub use amount::{Amount, AmountError, Balance};
pub use context::OperationContext;
pub use error::DomainError;
pub use ledger::{verify_chain, Posting};
