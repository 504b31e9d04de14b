//! Pre-built Test Fixtures
//!
//! Names and mobile numbers must be unique across a store, so the helpers
//! here mix generated words with a process-wide sequence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fake::faker::address::en::CityName;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;

use domain_customer::{Customer, CustomerGroup, InMemoryCustomerStore};

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_sequence() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

/// Spells a number with letters so it survives titleizing unchanged
fn letters(mut n: u64) -> String {
    let mut out = Vec::new();
    loop {
        out.push((b'a' + (n % 26) as u8) as char);
        n /= 26;
        if n == 0 {
            break;
        }
    }
    out.into_iter().rev().collect()
}

/// Fixture for customer attributes
pub struct CustomerFixtures;

impl CustomerFixtures {
    /// A unique, already normalised customer name
    pub fn name() -> String {
        let first: String = FirstName().fake();
        let last: String = LastName().fake();
        domain_customer::titleize(&format!("{first} {last} {}", letters(next_sequence())))
    }

    /// A unique ten digit mobile number
    pub fn mobile_no() -> String {
        format!("9{:09}", next_sequence() % 1_000_000_000)
    }

    pub fn address() -> String {
        let city: String = CityName().fake();
        format!("{} Market Road, {city}", (1..200u32).fake::<u32>())
    }
}

/// Fixture for customer groups
pub struct GroupFixtures;

impl GroupFixtures {
    /// A unique, already normalised group name
    pub fn name() -> String {
        let city: String = CityName().fake();
        domain_customer::titleize(&format!("{city} route {}", letters(next_sequence())))
    }

    pub fn default_group() -> CustomerGroup {
        CustomerGroup::new_default("General")
    }

    pub fn group() -> CustomerGroup {
        CustomerGroup::new(Self::name())
    }
}

/// Fixture for in-memory stores
pub struct StoreFixtures;

impl StoreFixtures {
    /// A store holding only the default group
    pub async fn with_default_group() -> (Arc<InMemoryCustomerStore>, CustomerGroup) {
        let store = Arc::new(InMemoryCustomerStore::new());
        let general = GroupFixtures::default_group();
        store.seed_group(general.clone()).await;
        (store, general)
    }

    /// Seeds `count` active customers into `group` at positions `1..=count`
    pub async fn seed_customers(
        store: &InMemoryCustomerStore,
        group: &CustomerGroup,
        count: usize,
    ) -> Vec<Customer> {
        let mut customers = Vec::with_capacity(count);
        for position in 1..=count {
            let customer = crate::builders::TestCustomerBuilder::new()
                .in_group(group.id)
                .at_position(position as i32)
                .build();
            store.seed_customer(customer.clone()).await;
            customers.push(customer);
        }
        customers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_customer::{CustomerValidator, GroupValidator};

    #[test]
    fn test_generated_names_pass_validation() {
        for _ in 0..20 {
            let group = GroupFixtures::group();
            assert!(GroupValidator::validate(&group).is_valid, "{}", group.name);
        }
    }

    #[test]
    fn test_names_and_mobiles_are_unique() {
        let names: std::collections::HashSet<String> = (0..50).map(|_| CustomerFixtures::name()).collect();
        let mobiles: std::collections::HashSet<String> =
            (0..50).map(|_| CustomerFixtures::mobile_no()).collect();
        assert_eq!(names.len(), 50);
        assert_eq!(mobiles.len(), 50);
    }

    #[test]
    fn test_letters_are_lowercase() {
        assert_eq!(letters(0), "a");
        assert_eq!(letters(27), "bb");
    }

    #[tokio::test]
    async fn test_seeded_customers_are_valid() {
        let (store, general) = StoreFixtures::with_default_group().await;
        let customers = StoreFixtures::seed_customers(&store, &general, 3).await;

        assert_eq!(customers.iter().map(|c| c.position).collect::<Vec<_>>(), vec![1, 2, 3]);
        for customer in &customers {
            assert!(CustomerValidator::validate(customer).is_valid);
        }
    }
}
