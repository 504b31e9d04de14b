//! Customer domain errors
//!
//! Business failures (validation, refused deletions, invalid positions) are
//! reported as messages in an operation outcome. The errors here are the hard
//! failures an operation cannot express that way.

use thiserror::Error;

use core_kernel::{CustomerGroupId, CustomerId, PortError};

/// Hard failures raised by customer operations
#[derive(Debug, Error)]
pub enum CustomerError {
    /// The underlying store failed
    #[error("Store error: {0}")]
    Port(#[from] PortError),

    /// No group carries the default flag
    #[error("No customer group is flagged as default")]
    DefaultGroupMissing,

    /// More than one group carries the default flag
    #[error("{0} customer groups are flagged as default, expected exactly one")]
    AmbiguousDefaultGroup(usize),

    /// The group an operation targets does not exist
    #[error("Customer group not found: {0}")]
    GroupNotFound(CustomerGroupId),

    /// The customer an operation targets does not exist
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),
}

impl CustomerError {
    /// Returns true when the default group configuration is broken
    pub fn is_default_group_misconfigured(&self) -> bool {
        matches!(
            self,
            CustomerError::DefaultGroupMissing | CustomerError::AmbiguousDefaultGroup(_)
        )
    }

    /// Returns true when the targeted entity does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            CustomerError::GroupNotFound(_) | CustomerError::CustomerNotFound(_) => true,
            CustomerError::Port(error) => error.is_not_found(),
            _ => false,
        }
    }
}
