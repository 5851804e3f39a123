//! Click primitive - native click with script fallback

use crate::{errors::ActionError, primitives::DefaultActionPrimitives};
use std::time::Instant;
use tracing::{debug, warn};
use wd_adapter::{scripts, AdapterErrorKind, ElementRef};

/// Execute click primitive
///
/// Steps:
/// 1. Issue a native WebDriver click
/// 2. If the click is intercepted or the element is not interactable, dispatch the
///    click through script instead
pub async fn execute_click(
    primitives: &DefaultActionPrimitives,
    element: &ElementRef,
) -> Result<(), ActionError> {
    let start = Instant::now();
    debug!(element = %element, "Executing click primitive");

    match primitives.driver().click(element).await {
        Ok(()) => {
            debug!(element = %element, elapsed_ms = start.elapsed().as_millis() as u64, "Click completed");
            Ok(())
        }
        Err(err)
            if matches!(
                err.kind,
                AdapterErrorKind::ClickIntercepted | AdapterErrorKind::NotInteractable
            ) =>
        {
            warn!(element = %element, error = %err, "Native click rejected; falling back to script click");
            execute_script_click(primitives, element).await
        }
        Err(err) => Err(ActionError::from_interaction(err)),
    }
}

/// Click through the page's script engine, bypassing overlays and hit testing.
pub async fn execute_script_click(
    primitives: &DefaultActionPrimitives,
    element: &ElementRef,
) -> Result<(), ActionError> {
    debug!(element = %element, "Executing script click");
    primitives
        .driver()
        .execute_script(scripts::CLICK, vec![element.to_wire()])
        .await
        .map(|_| ())
        .map_err(ActionError::from_interaction)
}
