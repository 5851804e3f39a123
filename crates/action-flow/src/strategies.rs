//! Failure handling strategies

use action_primitives::ActionPrimitives;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::context::FlowContext;
use crate::types::{AssignmentItem, WorkflowStage};

/// Failure handler trait
///
/// Runs once after an item ends in `Failed`, with focus already on the top document.
#[async_trait]
pub trait FailureHandler: Send + Sync {
    async fn handle_failure(&self, item: &AssignmentItem, stage: WorkflowStage, reason: &str);
}

/// Clicks the top-level fallback close control once, if present, then settles.
pub struct DefaultFailureHandler {
    ctx: Arc<FlowContext>,
}

impl DefaultFailureHandler {
    pub fn new(ctx: Arc<FlowContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl FailureHandler for DefaultFailureHandler {
    async fn handle_failure(&self, item: &AssignmentItem, stage: WorkflowStage, reason: &str) {
        warn!(
            index = item.index,
            name = %item.name,
            %stage,
            reason,
            "Assignment failed, trying fallback close"
        );

        let fallback = &self.ctx.site.fallback_close;
        match self.ctx.driver().find_elements(fallback).await {
            Ok(found) => match found.first() {
                Some(button) => match self.ctx.primitives.click(button).await {
                    Ok(()) => info!(index = item.index, "Fallback close clicked"),
                    Err(err) => debug!(error = %err, "Fallback close click failed"),
                },
                None => debug!(locator = %fallback, "No fallback close control"),
            },
            Err(err) => debug!(error = %err, "Fallback close lookup failed"),
        }

        self.ctx.primitives.settle(self.ctx.timing.close_settle()).await;
    }
}
