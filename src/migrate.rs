use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create the database file and schema. Safe to run repeatedly.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    // Condition reference data; rowid order is the "first match" order
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS policy_conditions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category TEXT NOT NULL,
            name TEXT NOT NULL,
            storage_reference TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Policy records; dates are ISO-8601 text so they sort lexically
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS insurances (
            id TEXT PRIMARY KEY,
            policy_holder TEXT NOT NULL,
            policy_type TEXT NOT NULL,
            provider TEXT NOT NULL,
            guarantees TEXT NOT NULL DEFAULT '',
            expiration_date TEXT NOT NULL,
            conditions_name TEXT,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_insurances_expiration_date ON insurances(expiration_date)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
