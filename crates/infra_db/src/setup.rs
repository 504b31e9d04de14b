//! Store bootstrap
//!
//! Operations refuse to run without exactly one default group. Setup creates
//! it once; later runs leave the existing group alone.

use tracing::info;

use domain_customer::{CustomerError, CustomerGroup, CustomerStore, DefaultGroup, GroupValidator};

/// Returns the default group, creating it with `name` when none exists
///
/// # Errors
///
/// * `CustomerError::AmbiguousDefaultGroup` - several groups carry the flag
/// * `CustomerError::Port` - the store failed
pub async fn ensure_default_group(
    store: &dyn CustomerStore,
    name: &str,
) -> Result<CustomerGroup, CustomerError> {
    let mut tx = store.begin().await?;

    match DefaultGroup::resolve(tx.as_mut()).await {
        Ok(existing) => {
            tx.rollback().await?;
            info!(group_id = %existing.id(), name = %existing.group().name, "default group present");
            Ok(existing.group().clone())
        }
        Err(CustomerError::DefaultGroupMissing) => {
            let mut group = CustomerGroup::new_default(name);
            GroupValidator::normalize(&mut group);
            tx.insert_group(&group).await?;
            tx.commit().await?;
            info!(group_id = %group.id, name = %group.name, "default group created");
            Ok(group)
        }
        Err(error) => {
            tx.rollback().await?;
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_customer::InMemoryCustomerStore;

    #[tokio::test]
    async fn test_creates_default_group_once() {
        let store = InMemoryCustomerStore::new();

        let created = ensure_default_group(&store, "general").await.unwrap();
        let again = ensure_default_group(&store, "Other").await.unwrap();

        assert!(created.is_default);
        assert_eq!(created.name, "General");
        assert_eq!(again.id, created.id);
        assert_eq!(store.snapshot().await.groups.len(), 1);
    }

    #[tokio::test]
    async fn test_refuses_ambiguous_defaults() {
        let store = InMemoryCustomerStore::new();
        store.seed_group(CustomerGroup::new_default("General")).await;
        store.seed_group(CustomerGroup::new_default("Walk In")).await;

        let error = ensure_default_group(&store, "General").await.unwrap_err();

        assert!(matches!(error, CustomerError::AmbiguousDefaultGroup(2)));
    }
}
