//! Operation result envelope and per-step results
//!
//! Steps of an operation return [`StepResult`]. A step that detects a
//! business failure records it in the tracker and returns
//! [`StepError::Halted`]; infrastructure failures travel as
//! [`StepError::Fatal`]. The operation converts the final step result into an
//! [`OperationOutcome`] (business failures) or a `CustomerError` (hard
//! failures), committing only on success.

use serde::Serialize;

use core_kernel::PortError;
use crate::error::CustomerError;

/// Why a step chain stopped
#[derive(Debug)]
pub enum StepError {
    /// A business error was recorded in the tracker
    Halted,
    /// The operation cannot continue at all
    Fatal(CustomerError),
}

impl From<PortError> for StepError {
    fn from(error: PortError) -> Self {
        StepError::Fatal(CustomerError::Port(error))
    }
}

impl From<CustomerError> for StepError {
    fn from(error: CustomerError) -> Self {
        StepError::Fatal(error)
    }
}

/// Result of one step of an operation
pub type StepResult<T = ()> = Result<T, StepError>;

/// Uniform result of a top-level operation
///
/// `success` is true exactly when `errors` is empty and `result` is present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationOutcome<T> {
    pub success: bool,
    pub errors: Vec<String>,
    pub result: Option<T>,
}

impl<T> OperationOutcome<T> {
    pub fn succeeded(result: T) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            result: Some(result),
        }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            success: false,
            errors,
            result: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Converts into a standard `Result`, yielding the messages on failure
    pub fn into_result(self) -> Result<T, Vec<String>> {
        match (self.success, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(self.errors),
        }
    }
}
