//! Cash-activity ledger rules
//!
//! Every balance change is recorded as a [`Posting`]: the entry type, the
//! amount and the balance on both sides of it. Postings are derived from the
//! balance read inside the atomic unit and chained to the latest entry of
//! the same account.

use rust_decimal::Decimal;

use super::{Account, Amount, Balance, CashActivity, DomainError, EntryType, NewCashActivity};

/// A balance change derived from the current balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub entry_type: EntryType,
    pub amount: Amount,
    pub balance_before: Balance,
    pub balance_after: Balance,
}

impl Posting {
    /// Money in
    pub fn credit(current: Balance, amount: Amount) -> Result<Self, DomainError> {
        Ok(Self {
            entry_type: EntryType::Credit,
            amount,
            balance_before: current,
            balance_after: current.credit(&amount)?,
        })
    }

    /// Money out, rejected when the balance does not cover it
    pub fn debit(current: Balance, amount: Amount) -> Result<Self, DomainError> {
        Ok(Self {
            entry_type: EntryType::Debit,
            amount,
            balance_before: current,
            balance_after: current.debit(&amount)?,
        })
    }

    /// Build the entry row, linked to `previous` when the account has history
    pub fn into_entry(
        self,
        account_id: i64,
        previous: Option<&CashActivity>,
        description: String,
    ) -> NewCashActivity {
        NewCashActivity {
            account_id,
            reference_id: previous.map(|entry| entry.id),
            entry_type: self.entry_type,
            amount: self.amount.value(),
            balance_before: self.balance_before.value(),
            balance_after: self.balance_after.value(),
            description,
        }
    }
}

/// Check the balance chain invariant for one account.
///
/// `entries` must be the account's complete history in insertion order.
/// Verifies the back-references, the per-entry arithmetic, the hand-off of
/// `balance_after` to the next `balance_before`, and that the account's
/// stored balance equals the last `balance_after` (or zero without history).
/// Returns the net of credits minus debits.
pub fn verify_chain(account: &Account, entries: &[CashActivity]) -> Result<Decimal, DomainError> {
    let mut previous: Option<&CashActivity> = None;
    let mut net = Decimal::ZERO;

    for entry in entries {
        if entry.account_id != account.id {
            return Err(DomainError::broken_chain(entry.id, "entry belongs to another account"));
        }

        let expected_reference = previous.map(|p| p.id);
        if entry.reference_id != expected_reference {
            return Err(DomainError::broken_chain(
                entry.id,
                format!(
                    "reference {:?} does not point at previous entry {:?}",
                    entry.reference_id, expected_reference
                ),
            ));
        }

        let expected_before = previous.map_or(Decimal::ZERO, |p| p.balance_after);
        if entry.balance_before != expected_before {
            return Err(DomainError::broken_chain(
                entry.id,
                format!(
                    "balance_before {} does not continue from {}",
                    entry.balance_before, expected_before
                ),
            ));
        }

        if entry.amount <= Decimal::ZERO {
            return Err(DomainError::broken_chain(entry.id, "amount is not positive"));
        }

        let expected_after = match entry.entry_type {
            EntryType::Credit => entry.balance_before + entry.amount,
            EntryType::Debit => entry.balance_before - entry.amount,
        };
        if entry.balance_after != expected_after {
            return Err(DomainError::broken_chain(
                entry.id,
                format!(
                    "{} of {} from {} should end at {}, found {}",
                    entry.entry_type,
                    entry.amount,
                    entry.balance_before,
                    expected_after,
                    entry.balance_after
                ),
            ));
        }

        net += match entry.entry_type {
            EntryType::Credit => entry.amount,
            EntryType::Debit => -entry.amount,
        };
        previous = Some(entry);
    }

    let expected_balance = previous.map_or(Decimal::ZERO, |p| p.balance_after);
    if account.balance != expected_balance || account.balance != net {
        return Err(DomainError::broken_chain(
            previous.map_or(0, |p| p.id),
            format!(
                "account balance {} does not match ledger balance {}",
                account.balance, expected_balance
            ),
        ));
    }

    Ok(net)
}
