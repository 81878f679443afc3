//! Cash Handler
//!
//! Deposits and withdrawals. Each one runs inside a single atomic unit:
//!
//! 1. lock the account row
//! 2. derive the posting from the locked balance (withdrawals may fail here)
//! 3. read the latest entry to link the new one to
//! 4. insert the entry
//! 5. write the new balance
//! 6. commit
//!
//! Any early return drops the unit, which rolls everything back.

use std::sync::Arc;

use validator::Validate;

use crate::domain::{Amount, EntryType, OperationContext, Posting};
use crate::error::{AppError, AppResult};
use crate::store::{AccountStore, StoreError};

use super::{CashCommand, CashResult, DepositCommand, WithdrawCommand};

/// Handler for deposits and withdrawals
pub struct CashHandler {
    store: Arc<dyn AccountStore>,
}

impl CashHandler {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Credit an account
    pub async fn deposit(
        &self,
        command: DepositCommand,
        context: &OperationContext,
    ) -> AppResult<CashResult> {
        self.execute(EntryType::Credit, command, context).await
    }

    /// Debit an account, refusing to go below zero
    pub async fn withdraw(
        &self,
        command: WithdrawCommand,
        context: &OperationContext,
    ) -> AppResult<CashResult> {
        self.execute(EntryType::Debit, command, context).await
    }

    async fn execute(
        &self,
        entry_type: EntryType,
        command: CashCommand,
        context: &OperationContext,
    ) -> AppResult<CashResult> {
        command.validate()?;
        let amount = Amount::new(command.amount)
            .map_err(|e| AppError::invalid_field("amount", e.code(), e.to_string()))?;

        let mut unit = self.store.begin().await.map_err(failed_transaction)?;

        let mut account = unit
            .lock_account(&command.account_number)
            .await
            .map_err(failed_transaction)?
            .ok_or_else(|| AppError::AccountNotFound(command.account_number.clone()))?;

        let current = account.current_balance()?;
        let posting = match entry_type {
            EntryType::Credit => Posting::credit(current, amount)?,
            EntryType::Debit => Posting::debit(current, amount)?,
        };

        let previous = unit
            .latest_entry(account.id)
            .await
            .map_err(failed_transaction)?;

        let description = command.description.unwrap_or_else(|| match entry_type {
            EntryType::Credit => "Deposit".to_string(),
            EntryType::Debit => "Withdrawal".to_string(),
        });
        let new_entry = posting.into_entry(account.id, previous.as_ref(), description);

        let entry = unit.insert_entry(new_entry).await.map_err(failed_transaction)?;
        unit.update_balance(account.id, entry.balance_after)
            .await
            .map_err(failed_transaction)?;
        unit.commit().await.map_err(failed_transaction)?;

        tracing::info!(
            account_number = %account.account_number,
            entry_id = entry.id,
            entry_type = %entry.entry_type,
            amount = %entry.amount,
            balance_after = %entry.balance_after,
            correlation_id = ?context.correlation_id,
            "Cash activity recorded"
        );

        account.balance = entry.balance_after;
        Ok(CashResult { account, entry })
    }
}

fn failed_transaction(err: StoreError) -> AppError {
    tracing::error!("Ledger transaction rolled back: {}", err);
    AppError::TransactionFailed(err)
}
