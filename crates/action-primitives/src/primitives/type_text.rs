//! Type text primitive - clear a field and type into it

use crate::{errors::ActionError, primitives::DefaultActionPrimitives};
use tracing::debug;
use wd_adapter::ElementRef;

/// Clears `element`, then types `text` into it.
///
/// The typed text is never logged; fields filled here include passwords.
pub async fn execute_fill(
    primitives: &DefaultActionPrimitives,
    element: &ElementRef,
    text: &str,
) -> Result<(), ActionError> {
    debug!(element = %element, chars = text.chars().count(), "Executing fill primitive");
    let driver = primitives.driver();
    driver
        .clear(element)
        .await
        .map_err(ActionError::from_interaction)?;
    driver
        .send_keys(element, text)
        .await
        .map_err(ActionError::from_interaction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{primitives::ActionPrimitives, types::SyncConfig, waiting::Synchronizer};
    use std::sync::Arc;
    use wd_adapter::{Locator, StubDriver, StubEvent};

    #[tokio::test]
    async fn fill_replaces_previous_value() {
        let stub = Arc::new(StubDriver::new());
        let field = stub.add_element(&[], Locator::id("login-email"), "");
        let primitives =
            DefaultActionPrimitives::new(Synchronizer::new(stub.clone(), SyncConfig::default()));

        primitives.fill(&field, "first@example.com").await.unwrap();
        primitives.fill(&field, "second@example.com").await.unwrap();

        assert_eq!(stub.value_of(&field).as_deref(), Some("second@example.com"));
        assert_eq!(stub.events()[0], StubEvent::Clear(field));
    }
}
