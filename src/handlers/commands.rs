//! Command definitions
//!
//! Commands represent intentions to change the system state. They are
//! checked with `validator` before any store access.

use std::borrow::Cow;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::{Account, Amount, CashActivity};

/// Digits only, at least one
pub(crate) fn numeric(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(());
    }
    let mut err = ValidationError::new("numeric");
    err.message = Some(Cow::from("must contain digits only"));
    Err(err)
}

/// Strictly positive amount with at most two decimal places
fn positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    Amount::new(*value).map(|_| ()).map_err(|e| {
        let mut err = ValidationError::new(e.code());
        err.message = Some(Cow::from(e.to_string()));
        err
    })
}

// =========================================================================
// Registration
// =========================================================================

/// Command to register a new customer account
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegisterAccountCommand {
    #[validate(length(min = 1, max = 50))]
    pub full_name: String,

    /// National ID number
    #[validate(length(equal = 16), custom(function = "numeric"))]
    pub id_number: String,

    #[validate(length(min = 1, max = 15), custom(function = "numeric"))]
    pub phone_number: String,
}

impl RegisterAccountCommand {
    pub fn new(
        full_name: impl Into<String>,
        id_number: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            id_number: id_number.into(),
            phone_number: phone_number.into(),
        }
    }
}

// =========================================================================
// Deposit / Withdrawal
// =========================================================================

/// Command to move money into or out of an account
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CashCommand {
    #[validate(length(min = 1, max = 10), custom(function = "numeric"))]
    pub account_number: String,

    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,

    #[validate(length(max = 255))]
    pub description: Option<String>,
}

/// Deposits and withdrawals share the same request shape
pub type DepositCommand = CashCommand;
pub type WithdrawCommand = CashCommand;

impl CashCommand {
    pub fn new(account_number: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_number: account_number.into(),
            amount,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Result of a committed deposit or withdrawal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashResult {
    pub account: Account,
    pub entry: CashActivity,
}

impl CashResult {
    /// Balance right after the operation committed
    pub fn balance(&self) -> Decimal {
        self.entry.balance_after
    }
}
