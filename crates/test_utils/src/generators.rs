//! Property-Based Test Generators
//!
//! Proptest strategies for customer layouts. Names produced here are valid
//! before normalisation, so generated customers only fail validation when a
//! test asks for it.

use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for valid customer or group names (3 to 50 characters)
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z]{3,12}( [a-z]{2,12}){0,2}"
}

/// Strategy for names that fail the length rule
pub fn invalid_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof!["[a-z]{1,2}", "[a-z]{51,60}"]
}

/// Strategy for ten digit mobile numbers
pub fn mobile_no_strategy() -> impl Strategy<Value = String> {
    "9[0-9]{9}"
}

/// Strategy for due amounts with two decimal places
pub fn due_amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for arbitrary, possibly broken starting positions
pub fn raw_positions_strategy(max_len: usize) -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(-3i32..30, 0..max_len)
}

/// One customer of a generated layout
#[derive(Debug, Clone)]
pub struct CustomerSlot {
    /// Index of the group the customer starts in
    pub group: usize,
    pub withheld: bool,
    pub position: i32,
}

/// Strategy for customers spread over `groups` groups
pub fn layout_strategy(groups: usize, max_customers: usize) -> impl Strategy<Value = Vec<CustomerSlot>> {
    prop::collection::vec(
        (0..groups.max(1), prop::bool::weighted(0.25), 0i32..20).prop_map(|(group, withheld, position)| {
            CustomerSlot {
                group,
                withheld,
                position,
            }
        }),
        0..max_customers,
    )
}
