//! Per-assignment workflow
//!
//! One execution walks the stages
//! `Located → PanelOpen → AttemptCheck → AttemptStart → PlayerWait → PlayerEnter →
//! PlayerBegin → AwaitSubmit → Closing` and ends in `Done` or `Failed`. Whatever the
//! outcome, focus is returned to the top document before the report is produced.

use action_primitives::{ActionError, ActionPrimitives, Condition};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use wd_adapter::Locator;

use crate::context::FlowContext;
use crate::strategies::{DefaultFailureHandler, FailureHandler};
use crate::types::{AssignmentItem, AttemptState, ItemOutcome, ItemReport, WorkflowStage};

/// Why a stage stopped the workflow
#[derive(Debug)]
struct StageFailure {
    stage: WorkflowStage,
    reason: String,
    skipped: bool,
}

impl StageFailure {
    fn at(stage: WorkflowStage) -> impl Fn(ActionError) -> StageFailure {
        move |err| StageFailure {
            stage,
            reason: err.to_string(),
            skipped: false,
        }
    }
}

/// Stage bookkeeping for one execution
struct Progress<'a> {
    item: &'a AssignmentItem,
    trace: Vec<WorkflowStage>,
}

impl Progress<'_> {
    fn enter(&mut self, stage: WorkflowStage) -> WorkflowStage {
        debug!(index = self.item.index, %stage, "Entering stage");
        self.trace.push(stage);
        stage
    }
}

pub struct AssignmentWorkflow {
    ctx: Arc<FlowContext>,
    failure_handler: Arc<dyn FailureHandler>,
}

impl AssignmentWorkflow {
    pub fn new(ctx: Arc<FlowContext>) -> Self {
        let failure_handler = Arc::new(DefaultFailureHandler::new(ctx.clone()));
        Self {
            ctx,
            failure_handler,
        }
    }

    pub fn with_failure_handler(mut self, handler: Arc<dyn FailureHandler>) -> Self {
        self.failure_handler = handler;
        self
    }

    /// Runs the workflow for `item`. Never returns an error: every failure becomes a
    /// `Failed` outcome in the report.
    pub async fn execute(&self, item: &AssignmentItem) -> ItemReport {
        let started_at = Utc::now();
        let start = Instant::now();
        info!(index = item.index, name = %item.name, "Processing assignment");

        let mut progress = Progress {
            item,
            trace: Vec::new(),
        };
        let result = self.drive(&mut progress).await;
        self.ctx.navigator.reset_to_root().await;

        let outcome = match result {
            Ok(()) => {
                progress.enter(WorkflowStage::Done);
                info!(index = item.index, name = %item.name, "Assignment completed");
                ItemOutcome::Done
            }
            Err(failure) => {
                progress.enter(WorkflowStage::Failed);
                self.failure_handler
                    .handle_failure(item, failure.stage, &failure.reason)
                    .await;
                ItemOutcome::Failed {
                    stage: failure.stage,
                    reason: failure.reason,
                    skipped: failure.skipped,
                }
            }
        };

        ItemReport {
            index: item.index,
            name: item.name.clone(),
            outcome,
            trace: progress.trace,
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn drive(&self, progress: &mut Progress<'_>) -> Result<(), StageFailure> {
        let site = &self.ctx.site;
        let timing = &self.ctx.timing;
        let sync = self.ctx.sync();
        let navigator = &self.ctx.navigator;
        let primitives = &self.ctx.primitives;
        let item = progress.item;

        // Located: open the item's side panel
        let stage = progress.enter(WorkflowStage::Located);
        navigator
            .enter(&site.content_frame)
            .await
            .map_err(StageFailure::at(stage))?;
        primitives
            .scroll_into_view(&item.element)
            .await
            .map_err(StageFailure::at(stage))?;
        primitives.settle(timing.action_settle()).await;
        let toggle = sync
            .await_element_under(&item.element, &site.panel_open, timing.short_timeout())
            .await
            .map_err(StageFailure::at(stage))?;
        primitives
            .script_click(&toggle)
            .await
            .map_err(StageFailure::at(stage))?;
        primitives.settle(timing.action_settle()).await;

        // PanelOpen: launch the activity
        let stage = progress.enter(WorkflowStage::PanelOpen);
        let launch = sync
            .await_element(&site.launch, timing.element_timeout())
            .await
            .map_err(StageFailure::at(stage))?;
        primitives
            .script_click(&launch)
            .await
            .map_err(StageFailure::at(stage))?;
        primitives.settle(timing.action_settle()).await;
        navigator.reset_to_root().await;

        // AttemptCheck: only untouched assignments are worked
        let stage = progress.enter(WorkflowStage::AttemptCheck);
        navigator
            .enter(&site.attempt_frame)
            .await
            .map_err(StageFailure::at(stage))?;
        let status = sync
            .await_element(&site.attempt_status, timing.element_timeout())
            .await
            .map_err(StageFailure::at(stage))?;
        let status_text = primitives
            .read_text(&status)
            .await
            .map_err(StageFailure::at(stage))?;
        debug!(index = item.index, status = %status_text, "Attempt status");

        if AttemptState::from_status_text(&status_text, &site.first_attempt_marker)
            == AttemptState::PriorAttempt
        {
            info!(index = item.index, status = %status_text, "Prior attempt found, abandoning");
            let abandon = sync
                .await_element(&site.abandon, timing.element_timeout())
                .await
                .map_err(StageFailure::at(stage))?;
            primitives
                .click(&abandon)
                .await
                .map_err(StageFailure::at(stage))?;
            return Err(StageFailure {
                stage,
                reason: format!("prior attempt in progress: '{}'", status_text),
                skipped: true,
            });
        }

        // AttemptStart: same frame as the status control
        let stage = progress.enter(WorkflowStage::AttemptStart);
        let start = sync
            .await_element(&site.start_attempt, timing.element_timeout())
            .await
            .map_err(StageFailure::at(stage))?;
        primitives
            .click(&start)
            .await
            .map_err(StageFailure::at(stage))?;
        primitives.settle(timing.action_settle()).await;

        // PlayerWait
        let stage = progress.enter(WorkflowStage::PlayerWait);
        sync.await_element(
            &Locator::id(site.player_frame.as_str()),
            timing.short_timeout(),
        )
        .await
        .map_err(StageFailure::at(stage))?;
        primitives.settle(timing.action_settle()).await;

        // PlayerEnter
        let stage = progress.enter(WorkflowStage::PlayerEnter);
        navigator
            .enter(&site.player_frame)
            .await
            .map_err(StageFailure::at(stage))?;

        // PlayerBegin: some players start on their own
        progress.enter(WorkflowStage::PlayerBegin);
        match sync
            .await_element(&site.begin, timing.element_timeout())
            .await
        {
            Ok(begin) => {
                if let Err(err) = primitives.click(&begin).await {
                    warn!(index = item.index, error = %err, "Begin click failed, continuing");
                }
            }
            Err(err) => warn!(index = item.index, error = %err, "No begin control, continuing"),
        }

        // AwaitSubmit: the player may rebuild its frames while playing
        let stage = progress.enter(WorkflowStage::AwaitSubmit);
        let reaffiliate = navigator.reaffiliation(vec![
            site.attempt_frame.clone(),
            site.player_frame.clone(),
        ]);
        let found = sync
            .await_condition_unbounded(
                &Condition::Present(site.submit.clone()),
                timing.submit_deadline(),
                &reaffiliate,
            )
            .await
            .map_err(StageFailure::at(stage))?;
        let submit = found.into_iter().next().ok_or_else(|| StageFailure {
            stage,
            reason: "submit control vanished".to_string(),
            skipped: false,
        })?;
        primitives
            .click(&submit)
            .await
            .map_err(StageFailure::at(stage))?;
        primitives.settle(timing.action_settle()).await;

        // Closing
        let stage = progress.enter(WorkflowStage::Closing);
        navigator.reset_to_root().await;
        navigator
            .enter(&site.attempt_frame)
            .await
            .map_err(StageFailure::at(stage))?;
        let close = sync
            .await_element(&site.close, timing.element_timeout())
            .await
            .map_err(StageFailure::at(stage))?;
        primitives
            .click(&close)
            .await
            .map_err(StageFailure::at(stage))?;
        primitives.settle(timing.close_settle()).await;

        Ok(())
    }
}
