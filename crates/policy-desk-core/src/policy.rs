//! Policy book operations over a [`PolicyStore`].
//!
//! Adding a policy looks up the conditions edition for its type through
//! the condition resolver, so a "Car" policy is stamped with whatever
//! edition the conditions store currently maps "car" to.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{InsurancePolicyRecord, NewPolicy, StoreStatus};
use crate::resolve::resolve;
use crate::store::{ConditionStore, PolicyStore};

/// Accepted `expiration_date` format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Active,
    Expired,
}

/// A policy annotated with its distance from today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyEntry {
    #[serde(flatten)]
    pub policy: InsurancePolicyRecord,
    /// Negative once the policy has expired.
    pub days_until: i64,
    pub status: ExpiryStatus,
}

impl PolicyEntry {
    pub fn new(policy: InsurancePolicyRecord, today: NaiveDate) -> Self {
        let days_until = (policy.expiration_date - today).num_days();
        let status = if days_until < 0 {
            ExpiryStatus::Expired
        } else {
            ExpiryStatus::Active
        };
        Self {
            policy,
            days_until,
            status,
        }
    }
}

pub fn parse_expiration(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        Error::invalid_argument(format!(
            "invalid date '{}'; use YYYY-MM-DD (e.g. 2026-12-31)",
            raw
        ))
    })
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_argument(format!("{} must not be empty", field)));
    }
    Ok(trimmed)
}

/// Validate and append a new policy.
///
/// Nothing is written when validation fails. An unknown policy type is not
/// an error: the policy is stored without a conditions edition.
pub async fn add_policy<C, P>(
    conditions: &C,
    policies: &P,
    input: NewPolicy,
    now: DateTime<Utc>,
) -> Result<InsurancePolicyRecord>
where
    C: ConditionStore + ?Sized,
    P: PolicyStore + ?Sized,
{
    let policy_holder = required("policy_holder", &input.policy_holder)?;
    let policy_type = required("policy_type", &input.policy_type)?;
    let provider = required("provider", &input.provider)?;
    let guarantees = required("guarantees", &input.guarantees)?;
    let expiration_date = parse_expiration(&input.expiration_date)?;

    let conditions_name = match resolve(conditions, policy_type).await {
        Ok(record) => Some(record.name),
        Err(Error::NotFound { .. }) => None,
        Err(e) => return Err(e),
    };

    let record = InsurancePolicyRecord {
        id: Uuid::new_v4().to_string(),
        policy_holder: policy_holder.to_string(),
        policy_type: policy_type.to_string(),
        provider: provider.to_string(),
        guarantees: guarantees.to_string(),
        expiration_date,
        conditions_name,
        created_at: now,
    };
    policies.insert_policy(&record).await?;
    Ok(record)
}

/// Every policy, soonest expiration first.
pub async fn list_policies<P>(policies: &P, today: NaiveDate) -> Result<Vec<PolicyEntry>>
where
    P: PolicyStore + ?Sized,
{
    Ok(policies
        .list_policies()
        .await?
        .into_iter()
        .map(|p| PolicyEntry::new(p, today))
        .collect())
}

/// The next policy to expire on or after `today`.
pub async fn next_expiring<P>(policies: &P, today: NaiveDate) -> Result<Option<PolicyEntry>>
where
    P: PolicyStore + ?Sized,
{
    Ok(policies
        .next_expiring(today)
        .await?
        .map(|p| PolicyEntry::new(p, today)))
}

pub async fn store_status<C, P>(conditions: &C, policies: &P) -> Result<StoreStatus>
where
    C: ConditionStore + ?Sized,
    P: PolicyStore + ?Sized,
{
    Ok(StoreStatus {
        policy_count: policies.count_policies().await?,
        condition_count: conditions.conditions().await?.len() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PolicyConditionRecord;
    use crate::store::memory::InMemoryStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        now().date_naive()
    }

    fn store() -> InMemoryStore {
        InMemoryStore::with_conditions(vec![PolicyConditionRecord {
            category: "Car".into(),
            name: "CarSafe26.1".into(),
            storage_reference: "conditions/car_safe_26_1.pdf".into(),
        }])
    }

    fn new_policy(holder: &str, kind: &str, exp: &str) -> NewPolicy {
        NewPolicy {
            policy_holder: holder.into(),
            policy_type: kind.into(),
            provider: "Acme Assicurazioni".into(),
            guarantees: "RCA, theft".into(),
            expiration_date: exp.into(),
        }
    }

    #[tokio::test]
    async fn add_attaches_matching_conditions() {
        let s = store();
        let added = add_policy(&s, &s, new_policy("Mario Rossi", "car", "2027-01-31"), now())
            .await
            .unwrap();
        assert_eq!(added.conditions_name.as_deref(), Some("CarSafe26.1"));
        assert_eq!(added.created_at, now());
        assert_eq!(s.count_policies().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn add_without_matching_conditions_stores_none() {
        let s = store();
        let added = add_policy(&s, &s, new_policy("Anna", "Boat", "2027-01-31"), now())
            .await
            .unwrap();
        assert_eq!(added.conditions_name, None);
    }

    #[tokio::test]
    async fn add_rejects_bad_date_and_writes_nothing() {
        let s = store();
        let err = add_policy(&s, &s, new_policy("Mario", "Car", "31/01/2027"), now())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
        assert_eq!(s.count_policies().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn add_rejects_blank_holder() {
        let s = store();
        let err = add_policy(&s, &s, new_policy("  ", "Car", "2027-01-31"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn add_rejects_blank_guarantees() {
        let s = store();
        let mut input = new_policy("Mario", "Car", "2027-01-31");
        input.guarantees = " ".into();
        let err = add_policy(&s, &s, input, now()).await.unwrap_err();
        assert_eq!(err, Error::invalid_argument("guarantees must not be empty"));
        assert_eq!(s.count_policies().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn add_propagates_store_failure() {
        let s = store();
        s.set_offline(true);
        let err = add_policy(&s, &s, new_policy("Mario", "Car", "2027-01-31"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn list_marks_expired_policies() {
        let s = store();
        add_policy(&s, &s, new_policy("Late", "Car", "2026-12-01"), now())
            .await
            .unwrap();
        add_policy(&s, &s, new_policy("Gone", "Car", "2026-10-01"), now())
            .await
            .unwrap();
        let entries = list_policies(&s, today()).await.unwrap();
        assert_eq!(entries[0].policy.policy_holder, "Gone");
        assert_eq!(entries[0].status, ExpiryStatus::Expired);
        assert_eq!(entries[0].days_until, -16);
        assert_eq!(entries[1].status, ExpiryStatus::Active);
        assert_eq!(entries[1].days_until, 45);
    }

    #[tokio::test]
    async fn next_expiring_ignores_expired() {
        let s = store();
        add_policy(&s, &s, new_policy("Gone", "Car", "2026-10-01"), now())
            .await
            .unwrap();
        assert!(next_expiring(&s, today()).await.unwrap().is_none());
        add_policy(&s, &s, new_policy("Today", "Car", "2026-10-17"), now())
            .await
            .unwrap();
        let next = next_expiring(&s, today()).await.unwrap().unwrap();
        assert_eq!(next.policy.policy_holder, "Today");
        assert_eq!(next.days_until, 0);
    }

    #[tokio::test]
    async fn status_counts_both_stores() {
        let s = store();
        add_policy(&s, &s, new_policy("Mario", "Car", "2027-01-31"), now())
            .await
            .unwrap();
        let status = store_status(&s, &s).await.unwrap();
        assert_eq!(status.policy_count, 1);
        assert_eq!(status.condition_count, 1);
    }
}
