//! Account Store module
//!
//! Persistence seam for accounts and their cash-activity ledger.
//! Writes that touch the ledger go through a [`LedgerUnit`], the atomic
//! unit of work: it is opened with [`AccountStore::begin`], holds the
//! account lock for its whole lifetime, and rolls back when dropped
//! without [`LedgerUnit::commit`].

mod error;
pub mod memory;
pub mod postgres;

pub use error::StoreError;
pub use memory::{MemoryStore, StoreFault};
pub use postgres::PgAccountStore;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{Account, CashActivity, NewAccount, NewCashActivity};

/// Store Result type
pub type StoreResult<T> = Result<T, StoreError>;

/// Unique constraint on `accounts.account_number`
pub const ACCOUNT_NUMBER_CONSTRAINT: &str = "accounts_account_number_key";
/// Unique constraint on `accounts.id_number`
pub const ID_NUMBER_CONSTRAINT: &str = "accounts_id_number_key";
/// Unique constraint on `accounts.phone_number`
pub const PHONE_NUMBER_CONSTRAINT: &str = "accounts_phone_number_key";

/// Account repository trait defining the interface for account storage
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Check that the store answers
    async fn ping(&self) -> StoreResult<()>;

    /// Get an account by its 10-digit account number
    async fn find_by_account_number(&self, account_number: &str) -> StoreResult<Option<Account>>;

    /// Get an account by national ID number
    async fn find_by_id_number(&self, id_number: &str) -> StoreResult<Option<Account>>;

    /// Get an account by phone number
    async fn find_by_phone_number(&self, phone_number: &str) -> StoreResult<Option<Account>>;

    /// Insert a new account with a zero balance
    async fn insert_account(&self, account: NewAccount) -> StoreResult<Account>;

    /// Full ledger history of an account, oldest first
    async fn entries_for_account(&self, account_id: i64) -> StoreResult<Vec<CashActivity>>;

    /// Open an atomic unit of work
    async fn begin(&self) -> StoreResult<Box<dyn LedgerUnit>>;
}

/// An open atomic unit.
///
/// Dropping a unit without calling [`commit`](LedgerUnit::commit) discards
/// every write made through it.
#[async_trait]
pub trait LedgerUnit: Send {
    /// Look up an account by number and hold it until the unit ends
    async fn lock_account(&mut self, account_number: &str) -> StoreResult<Option<Account>>;

    /// Most recent ledger entry of an account
    async fn latest_entry(&mut self, account_id: i64) -> StoreResult<Option<CashActivity>>;

    /// Append a ledger entry
    async fn insert_entry(&mut self, entry: NewCashActivity) -> StoreResult<CashActivity>;

    /// Overwrite the stored balance of an account
    async fn update_balance(&mut self, account_id: i64, balance: Decimal) -> StoreResult<()>;

    /// Make every write of this unit visible
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
