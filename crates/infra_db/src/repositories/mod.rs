//! Repository implementations for the customer group tables
//!
//! Repositories hold the SQL and map between table rows and row structs.
//! They never open transactions themselves: every call receives the
//! connection of the transaction the caller is running, so one operation's
//! reads and writes stay atomic.

pub mod customer_group;
pub mod customer;

pub use customer_group::{CustomerGroupRepository, CustomerGroupRow};
pub use customer::{CustomerRepository, CustomerRow};
