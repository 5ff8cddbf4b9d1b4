//! Storage abstraction for Policy Desk.
//!
//! Two traits cover the two data stores: [`ConditionStore`] for the
//! category → conditions-PDF reference data and [`PolicyStore`] for the
//! insurance policy records. Both are async (via `async-trait`) so the
//! SQLite backend can run on tokio while the in-memory backend returns
//! immediately-ready futures.
//!
//! Implementations report any backend failure as
//! [`Error::StoreUnavailable`](crate::error::Error::StoreUnavailable).

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{InsurancePolicyRecord, PolicyConditionRecord};

/// Policy-condition reference data.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`conditions`](ConditionStore::conditions) | All records, in insertion order |
/// | [`insert_condition`](ConditionStore::insert_condition) | Administrative seeding |
#[async_trait]
pub trait ConditionStore: Send + Sync {
    /// Return every condition record in insertion order.
    ///
    /// Matching is done by the caller so that case folding does not depend
    /// on the backend's collation.
    async fn conditions(&self) -> Result<Vec<PolicyConditionRecord>>;

    async fn insert_condition(&self, record: &PolicyConditionRecord) -> Result<()>;
}

/// Append-only insurance policy records.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_policy`](PolicyStore::insert_policy) | Append a new record |
/// | [`list_policies`](PolicyStore::list_policies) | All records by expiration date |
/// | [`next_expiring`](PolicyStore::next_expiring) | Earliest expiration on or after a date |
/// | [`count_policies`](PolicyStore::count_policies) | Record count |
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn insert_policy(&self, policy: &InsurancePolicyRecord) -> Result<()>;

    /// All policies ordered by `expiration_date` ascending.
    async fn list_policies(&self) -> Result<Vec<InsurancePolicyRecord>>;

    /// The policy with the earliest `expiration_date >= from`, if any.
    async fn next_expiring(&self, from: NaiveDate) -> Result<Option<InsurancePolicyRecord>>;

    async fn count_policies(&self) -> Result<i64>;
}
