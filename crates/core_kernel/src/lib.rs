//! Core Kernel - Foundational types for the customer group engine
//!
//! This crate provides the building blocks shared by the domain and
//! infrastructure crates:
//! - Strongly-typed identifiers for customers and customer groups
//! - The port error type and adapter health contracts

pub mod identifiers;
pub mod ports;

pub use identifiers::{CustomerId, CustomerGroupId};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
