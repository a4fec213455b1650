use thiserror::Error;

/// Failure of a call against the task service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    /// No response was received.
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("Remote error {status}: {body}")]
    Remote { status: u16, body: String },

    /// The response could not be turned into task records.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl RepoError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RepoError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the endpoint is missing or does not accept the method used
    /// (404, 405, 501)
    pub fn is_unsupported(&self) -> bool {
        matches!(self.status(), Some(404 | 405 | 501))
    }
}
