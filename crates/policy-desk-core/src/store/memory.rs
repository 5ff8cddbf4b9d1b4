//! In-memory store for tests and embedding without a database.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. Can be switched into an
//! "unavailable" state to exercise store-failure paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::{InsurancePolicyRecord, PolicyConditionRecord};

use super::{ConditionStore, PolicyStore};

pub struct InMemoryStore {
    conditions: RwLock<Vec<PolicyConditionRecord>>,
    policies: RwLock<Vec<InsurancePolicyRecord>>,
    offline: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            conditions: RwLock::new(Vec::new()),
            policies: RwLock::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Build a store pre-seeded with condition records.
    pub fn with_conditions(records: Vec<PolicyConditionRecord>) -> Self {
        let store = Self::new();
        *store.conditions.write().unwrap_or_else(|e| e.into_inner()) = records;
        store
    }

    /// Make every subsequent call fail with `StoreUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("in-memory store is offline".into()));
        }
        Ok(())
    }

    fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
        lock.read().map_err(Error::store_unavailable)
    }

    fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
        lock.write().map_err(Error::store_unavailable)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConditionStore for InMemoryStore {
    async fn conditions(&self) -> Result<Vec<PolicyConditionRecord>> {
        self.check_online()?;
        Ok(Self::read(&self.conditions)?.clone())
    }

    async fn insert_condition(&self, record: &PolicyConditionRecord) -> Result<()> {
        self.check_online()?;
        Self::write(&self.conditions)?.push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl PolicyStore for InMemoryStore {
    async fn insert_policy(&self, policy: &InsurancePolicyRecord) -> Result<()> {
        self.check_online()?;
        Self::write(&self.policies)?.push(policy.clone());
        Ok(())
    }

    async fn list_policies(&self) -> Result<Vec<InsurancePolicyRecord>> {
        self.check_online()?;
        let mut all = Self::read(&self.policies)?.clone();
        all.sort_by_key(|p| (p.expiration_date, p.created_at));
        Ok(all)
    }

    async fn next_expiring(&self, from: NaiveDate) -> Result<Option<InsurancePolicyRecord>> {
        self.check_online()?;
        Ok(Self::read(&self.policies)?
            .iter()
            .filter(|p| p.expiration_date >= from)
            .min_by_key(|p| (p.expiration_date, p.created_at))
            .cloned())
    }

    async fn count_policies(&self) -> Result<i64> {
        self.check_online()?;
        Ok(Self::read(&self.policies)?.len() as i64)
    }
}
