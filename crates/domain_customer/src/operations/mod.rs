//! Transactional operations on customers and customer groups
//!
//! Every operation follows the same shape:
//!
//! 1. open one store transaction
//! 2. run its steps, each returning a `StepResult` and recording business
//!    errors in the shared `ErrorTracker`
//! 3. commit when the steps succeeded and the tracker is empty, otherwise
//!    roll back
//!
//! Business failures come back as `OperationOutcome { success: false, .. }`;
//! infrastructure failures as `Err(CustomerError)`.

mod positions;
mod records;
mod create_group;
mod update_group;
mod delete_group;
mod create_customer;
mod update_customer;
mod delete_customer;

pub use positions::{PositionResetter, POSITION_WRITE_ERROR};
pub use create_group::{GroupCreateOperation, ASSIGN_CUSTOMERS_ERROR};
pub use update_group::{GroupUpdateOperation, INVALID_POSITION_ERROR};
pub use delete_group::{GroupDeleteOperation, GROUP_DELETE_FAILED_ERROR};
pub use create_customer::CustomerCreateOperation;
pub use update_customer::CustomerUpdateOperation;
pub use delete_customer::{CustomerDeleteOperation, CUSTOMER_DELETE_FAILED_ERROR};

use tracing::{info, warn};

use crate::error::CustomerError;
use crate::outcome::{OperationOutcome, StepError, StepResult};
use crate::ports::CustomerTransaction;
use crate::tracker::ErrorTracker;

/// Ends the transaction according to the step chain's result
async fn finish<T>(
    tx: Box<dyn CustomerTransaction>,
    step: StepResult<T>,
    tracker: &ErrorTracker,
    operation: &'static str,
) -> Result<OperationOutcome<T>, CustomerError> {
    match step {
        Ok(result) if !tracker.has_error() => {
            tx.commit().await?;
            info!(operation, "operation committed");
            Ok(OperationOutcome::succeeded(result))
        }
        Ok(_) | Err(StepError::Halted) => {
            tx.rollback().await?;
            let errors = tracker.list();
            warn!(operation, tracker = tracker.name(), ?errors, "operation rolled back");
            Ok(OperationOutcome::failed(errors))
        }
        Err(StepError::Fatal(error)) => {
            if let Err(rollback_error) = tx.rollback().await {
                warn!(operation, %rollback_error, "rollback after fatal error failed");
            }
            warn!(operation, %error, "operation aborted");
            Err(error)
        }
    }
}
