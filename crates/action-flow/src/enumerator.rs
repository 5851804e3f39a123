//! Assignment list enumeration

use action_primitives::{ActionPrimitives, Condition};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::context::FlowContext;
use crate::errors::FlowError;
use crate::types::AssignmentItem;

/// Reads the assignment list from the content frame.
pub struct AssignmentEnumerator {
    ctx: Arc<FlowContext>,
}

impl AssignmentEnumerator {
    pub fn new(ctx: Arc<FlowContext>) -> Self {
        Self { ctx }
    }

    /// Lists the items currently shown, in document order. Focus is back on the top
    /// document when this returns, whatever the result.
    pub async fn list_assignments(&self) -> Result<Vec<AssignmentItem>, FlowError> {
        let result = self.collect().await;
        self.ctx.navigator.reset_to_root().await;

        match &result {
            Ok(items) => info!(count = items.len(), "Enumerated assignments"),
            Err(err) => warn!(error = %err, "Assignment list unavailable"),
        }
        result
    }

    async fn collect(&self) -> Result<Vec<AssignmentItem>, FlowError> {
        let site = &self.ctx.site;
        let navigator = &self.ctx.navigator;

        navigator
            .enter(&site.content_frame)
            .await
            .map_err(|err| FlowError::NotFound(err.to_string()))?;
        let context = navigator.current_path();

        let elements = self
            .ctx
            .sync()
            .await_condition(
                &Condition::Present(site.item.clone()),
                self.ctx.timing.element_timeout(),
            )
            .await
            .map_err(|err| FlowError::NotFound(format!("no assignments listed: {}", err)))?;

        let mut items = Vec::with_capacity(elements.len());
        for (index, element) in elements.into_iter().enumerate() {
            let name = self.item_name(&element, index).await;
            debug!(index, name = %name, "Found assignment");
            items.push(AssignmentItem {
                index,
                name,
                element,
                context: context.clone(),
            });
        }
        Ok(items)
    }

    async fn item_name(&self, element: &wd_adapter::ElementRef, index: usize) -> String {
        let fallback = || format!("assignment #{}", index + 1);
        let titles = match self
            .ctx
            .driver()
            .find_elements_from(element, &self.ctx.site.item_name)
            .await
        {
            Ok(titles) => titles,
            Err(err) => {
                debug!(index, error = %err, "Assignment title lookup failed");
                return fallback();
            }
        };
        let Some(title) = titles.first() else {
            return fallback();
        };

        match self.ctx.primitives.read_text(title).await {
            Ok(text) if !text.is_empty() => text,
            _ => fallback(),
        }
    }
}
