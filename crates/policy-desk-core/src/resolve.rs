//! Category → conditions-document resolution.
//!
//! Both sides of the comparison are ASCII case-folded here, so the result
//! does not depend on how the backing store collates text. Only exact
//! (folded) equality counts; the first record in store order wins.

use crate::error::{Error, Result};
use crate::models::PolicyConditionRecord;
use crate::store::ConditionStore;

/// `true` when `a` and `b` are equal after ASCII case folding.
pub fn category_matches(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Find the first record whose category matches `category`.
///
/// Returns [`Error::NotFound`] when nothing matches; store failures pass
/// through unchanged as [`Error::StoreUnavailable`].
pub async fn resolve<S>(store: &S, category: &str) -> Result<PolicyConditionRecord>
where
    S: ConditionStore + ?Sized,
{
    let records = store.conditions().await?;
    select(records, category)
}

/// Pure matching step over an already-fetched record list.
pub fn select(records: Vec<PolicyConditionRecord>, category: &str) -> Result<PolicyConditionRecord> {
    records
        .into_iter()
        .find(|r| category_matches(&r.category, category))
        .ok_or_else(|| Error::NotFound {
            category: category.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    fn record(category: &str, name: &str, reference: &str) -> PolicyConditionRecord {
        PolicyConditionRecord {
            category: category.into(),
            name: name.into(),
            storage_reference: reference.into(),
        }
    }

    fn seeded() -> InMemoryStore {
        InMemoryStore::with_conditions(vec![
            record("Car", "CarSafe26.1", "conditions/car_safe_26_1.pdf"),
            record("Home", "HomeCare3", "conditions/home_care_3.pdf"),
            record("CAR", "CarLegacy", "conditions/car_legacy.pdf"),
        ])
    }

    #[tokio::test]
    async fn resolves_case_insensitively() {
        let store = seeded();
        let found = resolve(&store, "car").await.unwrap();
        assert_eq!(found.name, "CarSafe26.1");
        assert_eq!(found.storage_reference, "conditions/car_safe_26_1.pdf");
        assert_eq!(resolve(&store, "hOmE").await.unwrap().name, "HomeCare3");
    }

    #[tokio::test]
    async fn unknown_category_is_not_found() {
        let store = seeded();
        assert_eq!(
            resolve(&store, "Motorcycle").await,
            Err(Error::NotFound {
                category: "Motorcycle".into()
            })
        );
    }

    #[tokio::test]
    async fn partial_match_is_not_a_match() {
        let store = seeded();
        assert!(matches!(
            resolve(&store, "Ca").await,
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            resolve(&store, "Car ").await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn store_failure_is_distinct_from_not_found() {
        let store = seeded();
        store.set_offline(true);
        assert!(matches!(
            resolve(&store, "car").await,
            Err(Error::StoreUnavailable(_))
        ));
    }

    #[test]
    fn matching_is_ascii_folding_only() {
        assert!(category_matches("Infortuni", "INFORTUNI"));
        assert!(!category_matches("Città", "CITTÀ"));
    }
}
