//! In-memory account store
//!
//! Used by the test suites and for running the API without a database.
//! A [`MemoryUnit`] owns the store-wide async lock for its lifetime, so
//! units are fully serialized. Writes are staged inside the unit and only
//! applied on commit.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::{Account, CashActivity, NewAccount, NewCashActivity};

use super::{
    AccountStore, LedgerUnit, StoreError, StoreResult, ACCOUNT_NUMBER_CONSTRAINT,
    ID_NUMBER_CONSTRAINT, PHONE_NUMBER_CONSTRAINT,
};

/// Failure points that can be armed on a [`MemoryStore`].
///
/// An armed fault fires once, on the next call of the matching operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreFault {
    Ping,
    InsertAccount,
    Begin,
    LockAccount,
    LatestEntry,
    InsertEntry,
    UpdateBalance,
    Commit,
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: Vec<Account>,
    entries: Vec<CashActivity>,
    next_account_id: i64,
    next_entry_id: i64,
}

impl MemoryState {
    fn find_account(&self, predicate: impl Fn(&Account) -> bool) -> Option<Account> {
        self.accounts.iter().find(|a| predicate(a)).cloned()
    }
}

type Faults = Arc<Mutex<HashSet<StoreFault>>>;

fn take_fault(faults: &Faults, fault: StoreFault) -> StoreResult<()> {
    let fired = faults
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .remove(&fault);
    if fired {
        return Err(StoreError::Unavailable(format!("injected fault: {:?}", fault)));
    }
    Ok(())
}

/// In-memory repository for accounts and ledger entries
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<AsyncMutex<MemoryState>>,
    faults: Faults,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot failure
    pub fn fail_next(&self, fault: StoreFault) {
        self.faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(fault);
    }

    /// Number of stored accounts
    pub async fn account_count(&self) -> usize {
        self.state.lock().await.accounts.len()
    }

    /// Number of stored ledger entries across all accounts
    pub async fn entry_count(&self) -> usize {
        self.state.lock().await.entries.len()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        take_fault(&self.faults, StoreFault::Ping)
    }

    async fn find_by_account_number(&self, account_number: &str) -> StoreResult<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state.find_account(|a| a.account_number == account_number))
    }

    async fn find_by_id_number(&self, id_number: &str) -> StoreResult<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state.find_account(|a| a.id_number == id_number))
    }

    async fn find_by_phone_number(&self, phone_number: &str) -> StoreResult<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state.find_account(|a| a.phone_number == phone_number))
    }

    async fn insert_account(&self, account: NewAccount) -> StoreResult<Account> {
        take_fault(&self.faults, StoreFault::InsertAccount)?;
        let mut state = self.state.lock().await;

        let constraints: [(&str, fn(&Account, &NewAccount) -> bool); 3] = [
            (ACCOUNT_NUMBER_CONSTRAINT, |a, n| a.account_number == n.account_number),
            (ID_NUMBER_CONSTRAINT, |a, n| a.id_number == n.id_number),
            (PHONE_NUMBER_CONSTRAINT, |a, n| a.phone_number == n.phone_number),
        ];
        for (constraint, clashes) in constraints {
            if state.accounts.iter().any(|a| clashes(a, &account)) {
                return Err(StoreError::UniqueViolation {
                    constraint: constraint.to_string(),
                });
            }
        }

        state.next_account_id += 1;
        let now = Utc::now();
        let created = Account {
            id: state.next_account_id,
            account_number: account.account_number,
            full_name: account.full_name,
            id_number: account.id_number,
            phone_number: account.phone_number,
            balance: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };
        state.accounts.push(created.clone());
        Ok(created)
    }

    async fn entries_for_account(&self, account_id: i64) -> StoreResult<Vec<CashActivity>> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn begin(&self) -> StoreResult<Box<dyn LedgerUnit>> {
        take_fault(&self.faults, StoreFault::Begin)?;
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryUnit {
            guard,
            faults: self.faults.clone(),
            staged_entries: Vec::new(),
            staged_balances: HashMap::new(),
        }))
    }
}

/// Atomic unit over a [`MemoryStore`]
pub struct MemoryUnit {
    guard: OwnedMutexGuard<MemoryState>,
    faults: Faults,
    staged_entries: Vec<CashActivity>,
    staged_balances: HashMap<i64, Decimal>,
}

#[async_trait]
impl LedgerUnit for MemoryUnit {
    async fn lock_account(&mut self, account_number: &str) -> StoreResult<Option<Account>> {
        take_fault(&self.faults, StoreFault::LockAccount)?;
        let account = self.guard.find_account(|a| a.account_number == account_number);
        Ok(account.map(|mut a| {
            if let Some(balance) = self.staged_balances.get(&a.id) {
                a.balance = *balance;
            }
            a
        }))
    }

    async fn latest_entry(&mut self, account_id: i64) -> StoreResult<Option<CashActivity>> {
        take_fault(&self.faults, StoreFault::LatestEntry)?;
        let staged = self.staged_entries.iter().rev().find(|e| e.account_id == account_id);
        let committed = || self.guard.entries.iter().rev().find(|e| e.account_id == account_id);
        Ok(staged.or_else(committed).cloned())
    }

    async fn insert_entry(&mut self, entry: NewCashActivity) -> StoreResult<CashActivity> {
        take_fault(&self.faults, StoreFault::InsertEntry)?;
        if !self.guard.accounts.iter().any(|a| a.id == entry.account_id) {
            return Err(StoreError::Unavailable(format!(
                "foreign key violation: account {} does not exist",
                entry.account_id
            )));
        }

        // Ids behave like a sequence: consumed even if the unit rolls back
        self.guard.next_entry_id += 1;
        let stored = CashActivity {
            id: self.guard.next_entry_id,
            account_id: entry.account_id,
            reference_id: entry.reference_id,
            entry_type: entry.entry_type,
            amount: entry.amount,
            balance_before: entry.balance_before,
            balance_after: entry.balance_after,
            description: entry.description,
            created_at: Utc::now(),
        };
        self.staged_entries.push(stored.clone());
        Ok(stored)
    }

    async fn update_balance(&mut self, account_id: i64, balance: Decimal) -> StoreResult<()> {
        take_fault(&self.faults, StoreFault::UpdateBalance)?;
        if balance < Decimal::ZERO {
            return Err(StoreError::Unavailable(format!(
                "check violation: negative balance {} for account {}",
                balance, account_id
            )));
        }
        self.staged_balances.insert(account_id, balance);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        take_fault(&self.faults, StoreFault::Commit)?;

        let MemoryUnit {
            mut guard,
            staged_entries,
            staged_balances,
            ..
        } = *self;

        let now = Utc::now();
        for account in guard.accounts.iter_mut() {
            if let Some(balance) = staged_balances.get(&account.id) {
                account.balance = *balance;
                account.updated_at = now;
            }
        }
        guard.entries.extend(staged_entries);
        Ok(())
    }
}
