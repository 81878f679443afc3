//! Command Handlers module
//!
//! Handlers that orchestrate the account operations: validation, store
//! reads, ledger posting and the atomic commit.

mod account_number;
mod balance_handler;
mod cash_handler;
mod commands;
mod register_handler;


pub use account_number::{random_account_number, AccountNumberGenerator};
pub use balance_handler::BalanceHandler;
pub use cash_handler::CashHandler;
pub use commands::*;
pub use register_handler::RegisterAccountHandler;
