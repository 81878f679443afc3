//! Database module
//!
//! Database connection and schema utilities.

use sqlx::{Executor, PgPool};

/// Initial schema, kept as raw SQL in migrations/
pub const INIT_SCHEMA: &str = include_str!("../migrations/0001_init.sql");

/// Tables the service cannot run without
const REQUIRED_TABLES: &[&str] = &["accounts", "cash_activities"];

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the schema (idempotent; every statement uses IF NOT EXISTS)
pub async fn apply_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool.execute(INIT_SCHEMA).await?;
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(*table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    Ok(true)
}
