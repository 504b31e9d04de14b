//! Error aggregation shared by the steps of one operation
//!
//! An `ErrorTracker` lives for exactly one operation call. Nested steps
//! receive it as `&mut ErrorTracker` so every message ends up in the same
//! failure report.

use crate::outcome::{StepError, StepResult};

/// Values that can be recorded in an [`ErrorTracker`]
///
/// Implemented for single messages and for (nested) vectors of messages,
/// which are flattened on insertion.
pub trait ErrorMessages {
    fn into_messages(self) -> Vec<String>;
}

impl ErrorMessages for String {
    fn into_messages(self) -> Vec<String> {
        vec![self]
    }
}

impl ErrorMessages for &str {
    fn into_messages(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl<T: ErrorMessages> ErrorMessages for Vec<T> {
    fn into_messages(self) -> Vec<String> {
        self.into_iter().flat_map(ErrorMessages::into_messages).collect()
    }
}

/// Ordered collection of human-readable error messages
#[derive(Debug, Clone)]
pub struct ErrorTracker {
    name: String,
    errors: Vec<String>,
}

impl ErrorTracker {
    /// Creates an empty tracker tagged with `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            errors: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends one or more messages
    pub fn add(&mut self, errors: impl ErrorMessages) {
        self.errors.extend(errors.into_messages());
    }

    /// Returns true once any message was recorded
    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the recorded messages, deduplicated in first-seen order
    pub fn list(&self) -> Vec<String> {
        let mut seen = Vec::with_capacity(self.errors.len());
        for error in &self.errors {
            if !seen.contains(error) {
                seen.push(error.clone());
            }
        }
        seen
    }

    /// Records `errors` and returns the halt signal for the current step chain
    pub fn halt(&mut self, errors: impl ErrorMessages) -> StepError {
        self.add(errors);
        StepError::Halted
    }

    /// Stops the step chain when an earlier step recorded an error
    pub fn checkpoint(&self) -> StepResult {
        if self.has_error() {
            Err(StepError::Halted)
        } else {
            Ok(())
        }
    }
}

impl Default for ErrorTracker {
    fn default() -> Self {
        Self::new("Error")
    }
}
