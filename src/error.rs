use thiserror::Error;

/// Local validation failures. These never reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Task title cannot be empty")]
    EmptyTitle,
    #[error("Tasks can only be created from the active view")]
    NotActiveView,
    #[error("Finish or cancel the current selection first")]
    SelectionActive,
}

/// Validate that a string is not empty
pub fn validate_non_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyTitle)
    } else {
        Ok(())
    }
}
