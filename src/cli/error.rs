// Error handling utilities for consistent error messages and exit codes

use std::process;
use thiserror::Error;

use crate::repo::RepoError;

/// A remote call failed after the local state was rolled back; carries the
/// failure notice shown to the user
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RemoteFailure(pub String);

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, unknown task ids, bad configuration.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Whether an error came from the task service rather than from the input
pub fn is_internal(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<RepoError>() || cause.is::<RemoteFailure>())
}

/// Exit code for a failed command
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if is_internal(err) {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use anyhow::Context;

    #[test]
    fn test_repo_errors_are_internal() {
        let err = Err::<(), _>(RepoError::Network("connection refused".into()))
            .context("Failed to load active tasks")
            .unwrap_err();
        assert!(is_internal(&err));
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_rollback_is_internal() {
        let err = anyhow::Error::new(RemoteFailure("Failed to complete task".into()));
        assert_eq!(exit_code(&err), 2);
        assert_eq!(err.to_string(), "Failed to complete task");
    }

    #[test]
    fn test_validation_is_user_error() {
        let err = anyhow::Error::new(ValidationError::EmptyTitle);
        assert!(!is_internal(&err));
        assert_eq!(exit_code(&err), 1);
    }
}
