//! Account and cash-activity records
//!
//! Plain data types shared by the stores, the handlers and the API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{AmountError, Balance, DomainError};

/// A customer account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub account_number: String,
    pub full_name: String,
    pub id_number: String,
    pub phone_number: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Stored balance as a validated domain value
    pub fn current_balance(&self) -> Result<Balance, DomainError> {
        Balance::new(self.balance).map_err(|_: AmountError| DomainError::CorruptBalance {
            account_number: self.account_number.clone(),
            balance: self.balance,
        })
    }
}

/// Fields required to insert a new account (balance starts at zero)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub account_number: String,
    pub full_name: String,
    pub id_number: String,
    pub phone_number: String,
}

/// Direction of a cash activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Money in (deposit)
    Credit,
    /// Money out (withdrawal)
    Debit,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Credit => "credit",
            EntryType::Debit => "debit",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(EntryType::Credit),
            "debit" => Ok(EntryType::Debit),
            other => Err(format!("unknown entry type '{}'", other)),
        }
    }
}

/// An immutable ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashActivity {
    pub id: i64,
    pub account_id: i64,
    /// Previous entry for the same account, `None` for the first one
    pub reference_id: Option<i64>,
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A ledger entry that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewCashActivity {
    pub account_id: i64,
    pub reference_id: Option<i64>,
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub description: String,
}
