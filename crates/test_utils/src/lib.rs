//! Test Utilities Crate
//!
//! Shared test infrastructure for the customer group workspace.
//!
//! # Modules
//!
//! - `fixtures`: unique names, mobile numbers and seeded stores
//! - `builders`: builders for customers and groups
//! - `database`: PostgreSQL container harness
//! - `assertions`: dense-position and outcome assertions
//! - `generators`: proptest strategies

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
