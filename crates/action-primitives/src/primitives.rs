//! Action primitives implementation
//!
//! Element-level primitives used by the workflow:
//! 1. click - native click with script fallback
//! 2. script_click - click dispatched through the page's script engine
//! 3. fill - clear a field and type text
//! 4. scroll - scroll an element into view
//! 5. settle - fixed pause for asynchronous UI updates

mod click;
mod scroll;
mod type_text;
mod wait;

pub use click::*;
pub use scroll::*;
pub use type_text::*;
pub use wait::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use wd_adapter::{ElementRef, WebDriver};

use crate::{errors::ActionError, waiting::Synchronizer};

/// Action primitives trait
///
/// Every primitive acts on an element of the current browsing context.
#[async_trait]
pub trait ActionPrimitives: Send + Sync {
    /// Click an element, falling back to a script click when the native click is
    /// intercepted
    async fn click(&self, element: &ElementRef) -> Result<(), ActionError>;

    /// Click an element through `arguments[0].click()`
    async fn script_click(&self, element: &ElementRef) -> Result<(), ActionError>;

    /// Replace the content of an input field
    async fn fill(&self, element: &ElementRef, text: &str) -> Result<(), ActionError>;

    /// Scroll an element into view
    async fn scroll_into_view(&self, element: &ElementRef) -> Result<(), ActionError>;

    /// Read the rendered text of an element
    async fn read_text(&self, element: &ElementRef) -> Result<String, ActionError>;

    /// Pause for `delay`
    async fn settle(&self, delay: Duration);
}

/// Default implementation of action primitives
#[derive(Clone)]
pub struct DefaultActionPrimitives {
    sync: Synchronizer,
}

impl DefaultActionPrimitives {
    pub fn new(sync: Synchronizer) -> Self {
        Self { sync }
    }

    pub fn synchronizer(&self) -> &Synchronizer {
        &self.sync
    }

    pub(crate) fn driver(&self) -> &Arc<dyn WebDriver> {
        self.sync.driver()
    }
}

#[async_trait]
impl ActionPrimitives for DefaultActionPrimitives {
    async fn click(&self, element: &ElementRef) -> Result<(), ActionError> {
        execute_click(self, element).await
    }

    async fn script_click(&self, element: &ElementRef) -> Result<(), ActionError> {
        execute_script_click(self, element).await
    }

    async fn fill(&self, element: &ElementRef, text: &str) -> Result<(), ActionError> {
        execute_fill(self, element, text).await
    }

    async fn scroll_into_view(&self, element: &ElementRef) -> Result<(), ActionError> {
        execute_scroll_into_view(self, element).await
    }

    async fn read_text(&self, element: &ElementRef) -> Result<String, ActionError> {
        self.driver()
            .element_text(element)
            .await
            .map(|text| text.trim().to_string())
            .map_err(ActionError::from_interaction)
    }

    async fn settle(&self, delay: Duration) {
        execute_settle(delay).await
    }
}
