//! Customer Group Domain
//!
//! This crate manages customers grouped into named customer groups. Every
//! customer belongs to exactly one group at all times and each group keeps a
//! dense ordering of its members.
//!
//! # Invariants
//!
//! - A customer always references an existing group. When its group becomes
//!   invalid or is deleted, it falls back to the single group flagged as
//!   default.
//! - Positions inside a group are contiguous integers starting at 1, kept
//!   separately for the active and the withheld partition.
//!
//! # Operations
//!
//! Each operation opens one store transaction, threads an [`ErrorTracker`]
//! through its steps and commits only when every step succeeded:
//!
//! - [`GroupCreateOperation`], [`GroupUpdateOperation`], [`GroupDeleteOperation`]
//! - [`CustomerCreateOperation`], [`CustomerUpdateOperation`], [`CustomerDeleteOperation`]
//! - [`PositionResetter`] is the structural repair step they share
//!
//! # Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use domain_customer::{GroupCreateOperation, NewCustomerGroup};
//!
//! let operation = GroupCreateOperation::new(store.clone());
//! let outcome = operation
//!     .execute(NewCustomerGroup::new("Morning Route"), vec![alice.id, bob.id])
//!     .await?;
//!
//! if outcome.success {
//!     println!("created {}", outcome.result.unwrap().id);
//! } else {
//!     for message in outcome.errors {
//!         println!("{message}");
//!     }
//! }
//! ```

pub mod customer;
pub mod group;
pub mod error;
pub mod tracker;
pub mod outcome;
pub mod validation;
pub mod ports;
pub mod operations;

pub use customer::{Customer, NewCustomer, CustomerChanges, Partition};
pub use group::{CustomerGroup, NewCustomerGroup, GroupEdit, CustomerPosition, DefaultGroup};
pub use error::CustomerError;
pub use tracker::{ErrorTracker, ErrorMessages};
pub use outcome::{OperationOutcome, StepError, StepResult};
pub use validation::{titleize, ValidationResult, GroupValidator, CustomerValidator};
pub use ports::{CustomerStore, CustomerStoreExt, CustomerTransaction};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemoryCustomerStore;
pub use operations::{
    PositionResetter,
    GroupCreateOperation, GroupUpdateOperation, GroupDeleteOperation,
    CustomerCreateOperation, CustomerUpdateOperation, CustomerDeleteOperation,
    POSITION_WRITE_ERROR, ASSIGN_CUSTOMERS_ERROR, INVALID_POSITION_ERROR,
    GROUP_DELETE_FAILED_ERROR, CUSTOMER_DELETE_FAILED_ERROR,
};
