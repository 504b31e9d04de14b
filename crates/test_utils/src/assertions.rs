//! Custom Test Assertions

use std::collections::BTreeMap;

use core_kernel::CustomerGroupId;
use domain_customer::{Customer, OperationOutcome, Partition};

/// Asserts that every (group, partition) sequence among `customers` reads
/// exactly `1..=N`
///
/// # Panics
///
/// Panics naming the first group whose positions have a gap or duplicate
pub fn assert_dense_positions<'a>(customers: impl IntoIterator<Item = &'a Customer>) {
    let mut sequences: BTreeMap<(CustomerGroupId, bool), Vec<i32>> = BTreeMap::new();
    for customer in customers {
        sequences
            .entry((customer.group_id, customer.partition() == Partition::Withheld))
            .or_default()
            .push(customer.position);
    }

    for ((group_id, withheld), mut positions) in sequences {
        positions.sort_unstable();
        let expected: Vec<i32> = (1..=positions.len() as i32).collect();
        assert_eq!(
            positions, expected,
            "positions of group {} (withheld: {}) are not dense",
            group_id, withheld
        );
    }
}

/// Asserts a failed outcome that reported `message`
pub fn assert_failed_with<T: std::fmt::Debug>(outcome: &OperationOutcome<T>, message: &str) {
    assert!(!outcome.success, "Expected failure, got {:?}", outcome);
    assert!(outcome.result.is_none(), "Failed outcome carries a result: {:?}", outcome);
    assert!(
        outcome.errors.iter().any(|e| e == message),
        "Expected error {:?}, got {:?}",
        message,
        outcome.errors
    );
}

/// Asserts that an outcome succeeded and returns its result
#[macro_export]
macro_rules! assert_succeeded {
    ($outcome:expr) => {
        match $outcome.into_result() {
            Ok(value) => value,
            Err(errors) => panic!("Expected success, got errors: {:?}", errors),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::TestCustomerBuilder;

    #[test]
    fn test_dense_positions_per_partition() {
        let group_id = CustomerGroupId::new();
        let customers = vec![
            TestCustomerBuilder::new().in_group(group_id).at_position(2).build(),
            TestCustomerBuilder::new().in_group(group_id).at_position(1).build(),
            TestCustomerBuilder::new().in_group(group_id).withheld().at_position(1).build(),
        ];
        assert_dense_positions(&customers);
    }

    #[test]
    #[should_panic(expected = "are not dense")]
    fn test_gap_is_reported() {
        let group_id = CustomerGroupId::new();
        let customers = vec![
            TestCustomerBuilder::new().in_group(group_id).at_position(1).build(),
            TestCustomerBuilder::new().in_group(group_id).at_position(3).build(),
        ];
        assert_dense_positions(&customers);
    }

    #[test]
    fn test_assert_failed_with() {
        let outcome: OperationOutcome<()> = OperationOutcome::failed(vec!["Invalid position provided".to_string()]);
        assert_failed_with(&outcome, "Invalid position provided");
    }
}
