//! Scroll primitive - bring an element into the viewport

use crate::{errors::ActionError, primitives::DefaultActionPrimitives};
use tracing::debug;
use wd_adapter::{scripts, ElementRef};

pub async fn execute_scroll_into_view(
    primitives: &DefaultActionPrimitives,
    element: &ElementRef,
) -> Result<(), ActionError> {
    debug!(element = %element, "Scrolling element into view");
    primitives
        .driver()
        .execute_script(scripts::SCROLL_INTO_VIEW, vec![element.to_wire()])
        .await
        .map(|_| ())
        .map_err(ActionError::from_interaction)
}
