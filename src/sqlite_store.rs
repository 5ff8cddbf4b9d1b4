//! SQLite-backed [`ConditionStore`] and [`PolicyStore`].
//!
//! Every sqlx failure is reported as `StoreUnavailable`; callers never see
//! driver error types.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use policy_desk_core::error::{Error, Result};
use policy_desk_core::models::{InsurancePolicyRecord, PolicyConditionRecord};
use policy_desk_core::policy::DATE_FORMAT;
use policy_desk_core::store::{ConditionStore, PolicyStore};

use crate::config::Config;
use crate::db;
use crate::migrate::migrate;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database and ensure the schema exists.
    pub async fn open(config: &Config) -> anyhow::Result<Self> {
        let pool = db::connect(config).await?;
        migrate(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn unavailable(err: sqlx::Error) -> Error {
    tracing::warn!(error = %err, "sqlite query failed");
    Error::store_unavailable(err)
}

fn policy_from_row(row: &SqliteRow) -> Result<InsurancePolicyRecord> {
    let expiration: String = row.try_get("expiration_date").map_err(unavailable)?;
    let expiration_date = NaiveDate::parse_from_str(&expiration, DATE_FORMAT).map_err(|e| {
        Error::StoreUnavailable(format!("corrupt expiration_date '{}': {}", expiration, e))
    })?;
    let created_ts: i64 = row.try_get("created_at").map_err(unavailable)?;
    let created_at = DateTime::<Utc>::from_timestamp(created_ts, 0).ok_or_else(|| {
        Error::StoreUnavailable(format!("corrupt created_at timestamp {}", created_ts))
    })?;

    Ok(InsurancePolicyRecord {
        id: row.try_get("id").map_err(unavailable)?,
        policy_holder: row.try_get("policy_holder").map_err(unavailable)?,
        policy_type: row.try_get("policy_type").map_err(unavailable)?,
        provider: row.try_get("provider").map_err(unavailable)?,
        guarantees: row.try_get("guarantees").map_err(unavailable)?,
        expiration_date,
        conditions_name: row.try_get("conditions_name").map_err(unavailable)?,
        created_at,
    })
}

const POLICY_COLUMNS: &str = "id, policy_holder, policy_type, provider, guarantees, \
     expiration_date, conditions_name, created_at";

#[async_trait]
impl ConditionStore for SqliteStore {
    async fn conditions(&self) -> Result<Vec<PolicyConditionRecord>> {
        let rows = sqlx::query(
            "SELECT category, name, storage_reference FROM policy_conditions ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.iter()
            .map(|row| -> Result<PolicyConditionRecord> {
                Ok(PolicyConditionRecord {
                    category: row.try_get("category").map_err(unavailable)?,
                    name: row.try_get("name").map_err(unavailable)?,
                    storage_reference: row.try_get("storage_reference").map_err(unavailable)?,
                })
            })
            .collect()
    }

    async fn insert_condition(&self, record: &PolicyConditionRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO policy_conditions (category, name, storage_reference) VALUES (?, ?, ?)",
        )
        .bind(&record.category)
        .bind(&record.name)
        .bind(&record.storage_reference)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(())
    }
}

#[async_trait]
impl PolicyStore for SqliteStore {
    async fn insert_policy(&self, policy: &InsurancePolicyRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO insurances (id, policy_holder, policy_type, provider, guarantees,
                                    expiration_date, conditions_name, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&policy.id)
        .bind(&policy.policy_holder)
        .bind(&policy.policy_type)
        .bind(&policy.provider)
        .bind(&policy.guarantees)
        .bind(policy.expiration_date.format(DATE_FORMAT).to_string())
        .bind(&policy.conditions_name)
        .bind(policy.created_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(())
    }

    async fn list_policies(&self) -> Result<Vec<InsurancePolicyRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM insurances ORDER BY expiration_date ASC, created_at ASC, rowid ASC",
            POLICY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.iter().map(policy_from_row).collect()
    }

    async fn next_expiring(&self, from: NaiveDate) -> Result<Option<InsurancePolicyRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM insurances WHERE expiration_date >= ? \
             ORDER BY expiration_date ASC, created_at ASC, rowid ASC LIMIT 1",
            POLICY_COLUMNS
        ))
        .bind(from.format(DATE_FORMAT).to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.as_ref().map(policy_from_row).transpose()
    }

    async fn count_policies(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM insurances")
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;
    use tempfile::TempDir;

    async fn open(dir: &TempDir) -> SqliteStore {
        let path = dir.path().join("pdesk.sqlite");
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .unwrap()
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        migrate(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    fn condition(category: &str, name: &str) -> PolicyConditionRecord {
        PolicyConditionRecord {
            category: category.into(),
            name: name.into(),
            storage_reference: format!("conditions/{}.pdf", name),
        }
    }

    fn policy(id: &str, exp: &str, conditions: Option<&str>) -> InsurancePolicyRecord {
        InsurancePolicyRecord {
            id: id.into(),
            policy_holder: format!("holder-{}", id),
            policy_type: "Car".into(),
            provider: "Acme".into(),
            guarantees: "RCA".into(),
            expiration_date: NaiveDate::parse_from_str(exp, DATE_FORMAT).unwrap(),
            conditions_name: conditions.map(String::from),
            created_at: DateTime::<Utc>::from_timestamp(1_790_000_000, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn conditions_come_back_in_insertion_order() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;
        store.insert_condition(&condition("Car", "CarSafe26.1")).await.unwrap();
        store.insert_condition(&condition("car", "CarOld")).await.unwrap();
        let all = store.conditions().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "CarSafe26.1");

        let found = policy_desk_core::resolve::resolve(&store, "CAR").await.unwrap();
        assert_eq!(found.name, "CarSafe26.1");
    }

    #[tokio::test]
    async fn policies_round_trip_and_sort() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;
        store
            .insert_policy(&policy("b", "2027-05-01", Some("CarSafe26.1")))
            .await
            .unwrap();
        store.insert_policy(&policy("a", "2026-11-30", None)).await.unwrap();

        let all = store.list_policies().await.unwrap();
        assert_eq!(all[0], policy("a", "2026-11-30", None));
        assert_eq!(all[1].conditions_name.as_deref(), Some("CarSafe26.1"));
        assert_eq!(store.count_policies().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn next_expiring_is_inclusive_of_from_date() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;
        store.insert_policy(&policy("past", "2026-10-16", None)).await.unwrap();
        store.insert_policy(&policy("today", "2026-10-17", None)).await.unwrap();
        store.insert_policy(&policy("later", "2026-12-01", None)).await.unwrap();

        let from = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(store.next_expiring(from).await.unwrap().unwrap().id, "today");
        let far = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert!(store.next_expiring(far).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn same_second_ties_keep_insertion_order() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;
        for id in ["zulu", "alpha", "mike"] {
            store.insert_policy(&policy(id, "2027-03-01", None)).await.unwrap();
        }

        let ids: Vec<String> = store
            .list_policies()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["zulu", "alpha", "mike"]);

        let from = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(store.next_expiring(from).await.unwrap().unwrap().id, "zulu");
    }

    #[tokio::test]
    async fn closed_pool_is_store_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;
        store.close().await;
        assert!(matches!(
            store.count_policies().await,
            Err(Error::StoreUnavailable(_))
        ));
    }
}
