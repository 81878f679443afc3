//! PostgreSQL account store
//!
//! Accounts live in `accounts`, ledger entries in `cash_activities` (see
//! `migrations/`). A [`PgLedgerUnit`] wraps a sqlx transaction: the account
//! row is taken with `SELECT ... FOR UPDATE`, which serializes concurrent
//! operations on the same account while leaving other accounts free.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::domain::{Account, CashActivity, EntryType, NewAccount, NewCashActivity};

use super::{AccountStore, LedgerUnit, StoreError, StoreResult};

const ACCOUNT_COLUMNS: &str =
    "id, account_number, full_name, id_number, phone_number, balance, created_at, updated_at";

const ENTRY_COLUMNS: &str = "id, account_id, reference_id, entry_type, amount, balance_before, \
     balance_after, description, created_at";

fn account_from_row(row: &PgRow) -> StoreResult<Account> {
    Ok(Account {
        id: row.try_get("id")?,
        account_number: row.try_get("account_number")?,
        full_name: row.try_get("full_name")?,
        id_number: row.try_get("id_number")?,
        phone_number: row.try_get("phone_number")?,
        balance: row.try_get("balance")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn entry_from_row(row: &PgRow) -> StoreResult<CashActivity> {
    let entry_type: String = row.try_get("entry_type")?;
    let entry_type: EntryType = entry_type.parse().map_err(StoreError::Decode)?;

    Ok(CashActivity {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        reference_id: row.try_get("reference_id")?,
        entry_type,
        amount: row.try_get("amount")?,
        balance_before: row.try_get("balance_before")?,
        balance_after: row.try_get("balance_after")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

/// PostgreSQL repository for accounts and cash activities
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    /// Create a new store over a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_account_where(&self, column: &str, value: &str) -> StoreResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {column} = $1");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(account_from_row).transpose()
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_by_account_number(&self, account_number: &str) -> StoreResult<Option<Account>> {
        self.find_account_where("account_number", account_number).await
    }

    async fn find_by_id_number(&self, id_number: &str) -> StoreResult<Option<Account>> {
        self.find_account_where("id_number", id_number).await
    }

    async fn find_by_phone_number(&self, phone_number: &str) -> StoreResult<Option<Account>> {
        self.find_account_where("phone_number", phone_number).await
    }

    async fn insert_account(&self, account: NewAccount) -> StoreResult<Account> {
        tracing::debug!(account_number = %account.account_number, "Inserting account");

        let sql = format!(
            r#"
            INSERT INTO accounts (account_number, full_name, id_number, phone_number, balance)
            VALUES ($1, $2, $3, $4, 0)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&account.account_number)
            .bind(&account.full_name)
            .bind(&account.id_number)
            .bind(&account.phone_number)
            .fetch_one(&self.pool)
            .await?;

        account_from_row(&row)
    }

    async fn entries_for_account(&self, account_id: i64) -> StoreResult<Vec<CashActivity>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM cash_activities WHERE account_id = $1 ORDER BY id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn begin(&self) -> StoreResult<Box<dyn LedgerUnit>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerUnit { tx }))
    }
}

/// Atomic unit backed by a database transaction.
///
/// sqlx rolls the transaction back when it is dropped uncommitted.
pub struct PgLedgerUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerUnit for PgLedgerUnit {
    async fn lock_account(&mut self, account_number: &str) -> StoreResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_number = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(account_number)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn latest_entry(&mut self, account_id: i64) -> StoreResult<Option<CashActivity>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM cash_activities WHERE account_id = $1 ORDER BY id DESC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(account_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    async fn insert_entry(&mut self, entry: NewCashActivity) -> StoreResult<CashActivity> {
        let sql = format!(
            r#"
            INSERT INTO cash_activities
                (account_id, reference_id, entry_type, amount, balance_before, balance_after, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ENTRY_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(entry.account_id)
            .bind(entry.reference_id)
            .bind(entry.entry_type.as_str())
            .bind(entry.amount)
            .bind(entry.balance_before)
            .bind(entry.balance_after)
            .bind(&entry.description)
            .fetch_one(&mut *self.tx)
            .await?;

        entry_from_row(&row)
    }

    async fn update_balance(&mut self, account_id: i64, balance: Decimal) -> StoreResult<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(account_id)
        .bind(balance)
        .execute(&mut *self.tx)
        .await?
        .rows_affected();

        if rows_affected != 1 {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let PgLedgerUnit { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}
