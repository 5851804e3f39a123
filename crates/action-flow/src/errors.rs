//! Flow execution error types

use thiserror::Error;

/// Flow execution errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Unattended login did not leave the login page, or could not be performed
    #[error("Login failed: {0}")]
    LoginFailed(String),

    /// Expected page content never appeared
    #[error("Not found: {0}")]
    NotFound(String),

    /// Action primitive error
    #[error("Action primitive error: {0}")]
    ActionError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<action_primitives::ActionError> for FlowError {
    fn from(err: action_primitives::ActionError) -> Self {
        FlowError::ActionError(err.to_string())
    }
}
