//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

/// Ledger rule violations.
///
/// These errors represent business rule violations and broken ledger
/// invariants. They are independent of the web/infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Insufficient balance for a debit
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Decimal, available: Decimal },

    /// Credit would push the balance past the supported maximum
    #[error("Balance overflow: {balance} + {amount} exceeds the maximum balance")]
    BalanceOverflow { balance: Decimal, amount: Decimal },

    /// Stored balance could not be represented as a valid Balance
    #[error("Corrupt balance for account {account_number}: {balance}")]
    CorruptBalance {
        account_number: String,
        balance: Decimal,
    },

    /// A cash-activity chain does not satisfy the ledger invariants
    #[error("Ledger chain broken at entry {entry_id}: {reason}")]
    BrokenChain { entry_id: i64, reason: String },
}

impl DomainError {
    /// Create an insufficient balance error
    pub fn insufficient_balance(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientBalance {
            required,
            available,
        }
    }

    /// Create a broken chain error
    pub fn broken_chain(entry_id: i64, reason: impl Into<String>) -> Self {
        Self::BrokenChain {
            entry_id,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance_error() {
        let err = DomainError::insufficient_balance(Decimal::new(500_000, 0), Decimal::new(100_000, 0));

        assert!(matches!(err, DomainError::InsufficientBalance { .. }));
        assert!(err.to_string().contains("500000"));
        assert!(err.to_string().contains("100000"));
    }

    #[test]
    fn test_broken_chain_names_entry() {
        let err = DomainError::broken_chain(7, "reference mismatch");

        assert!(err.to_string().contains("entry 7"));
    }
}
