//! account-service Library
//!
//! Re-exports modules for integration testing and the binaries.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
mod error;
pub mod handlers;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult, ErrorResponse, FieldViolation};
pub use domain::{Amount, AmountError, Balance, DomainError, OperationContext};
pub use domain::{Account, CashActivity, EntryType};
