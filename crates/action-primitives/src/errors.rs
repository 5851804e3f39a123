//! Error types for action primitives

use thiserror::Error;
use wd_adapter::{AdapterError, AdapterErrorKind};

/// Failure taxonomy for primitive operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// A frame never appeared, or focus could not be moved into it
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// A condition never became true within its deadline
    #[error("Synchronization timeout: {0}")]
    SyncTimeout(String),

    /// A located element could not be acted on (obscured, detached, not interactable)
    #[error("Interaction error: {0}")]
    Interaction(String),

    /// WebDriver communication or protocol error
    #[error("Driver I/O error: {0}")]
    DriverIo(String),
}

impl ActionError {
    /// Maps an adapter failure raised while acting on an element.
    pub fn from_interaction(err: AdapterError) -> Self {
        match err.kind {
            AdapterErrorKind::NoSuchElement
            | AdapterErrorKind::StaleElement
            | AdapterErrorKind::ClickIntercepted
            | AdapterErrorKind::NotInteractable => ActionError::Interaction(err.to_string()),
            AdapterErrorKind::NoSuchFrame => ActionError::Navigation(err.to_string()),
            AdapterErrorKind::Timeout => ActionError::SyncTimeout(err.to_string()),
            AdapterErrorKind::InvalidSession
            | AdapterErrorKind::Transport
            | AdapterErrorKind::Protocol
            | AdapterErrorKind::Internal => ActionError::DriverIo(err.to_string()),
        }
    }
}

impl From<AdapterError> for ActionError {
    fn from(err: AdapterError) -> Self {
        ActionError::from_interaction(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intercepted_click_is_an_interaction_error() {
        let err: ActionError = AdapterError::new(AdapterErrorKind::ClickIntercepted).into();
        assert!(matches!(err, ActionError::Interaction(_)));
    }

    #[test]
    fn transport_failures_are_driver_io() {
        let err: ActionError = AdapterError::new(AdapterErrorKind::Transport).into();
        assert!(matches!(err, ActionError::DriverIo(_)));
    }

    #[test]
    fn missing_frame_is_a_navigation_error() {
        let err: ActionError = AdapterError::new(AdapterErrorKind::NoSuchFrame).into();
        assert!(matches!(err, ActionError::Navigation(_)));
    }
}
