//! Run control
//!
//! Login once, wait for the landing document, then work through the assignment list
//! one item at a time. The list is re-read before every item because the page may
//! rebuild it after each workflow.

use action_primitives::{ActionPrimitives, Condition};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::context::FlowContext;
use crate::enumerator::AssignmentEnumerator;
use crate::errors::FlowError;
use crate::executor::AssignmentWorkflow;
use crate::login::{LoginController, LoginMode, Operator};
use crate::strategies::FailureHandler;
use crate::types::{RunSummary, RunTally, StopReason};

pub struct RunController {
    ctx: Arc<FlowContext>,
    login: LoginController,
    enumerator: AssignmentEnumerator,
    workflow: AssignmentWorkflow,
    max_items: Option<usize>,
}

impl RunController {
    pub fn new(ctx: Arc<FlowContext>) -> Self {
        Self {
            login: LoginController::new(ctx.clone()),
            enumerator: AssignmentEnumerator::new(ctx.clone()),
            workflow: AssignmentWorkflow::new(ctx.clone()),
            ctx,
            max_items: None,
        }
    }

    /// Stops after `max_items` items have been dispatched.
    pub fn with_max_items(mut self, max_items: Option<usize>) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn with_failure_handler(mut self, handler: Arc<dyn FailureHandler>) -> Self {
        self.workflow = self.workflow.with_failure_handler(handler);
        self
    }

    /// Executes a full run. Only a failed login is returned as an error; per-item
    /// failures are tallied and reported in the summary.
    pub async fn run(
        &self,
        mode: &LoginMode,
        operator: &dyn Operator,
    ) -> Result<RunSummary, FlowError> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let timing = &self.ctx.timing;
        let primitives = &self.ctx.primitives;
        info!(%run_id, "Run started");

        self.login.login(mode, operator).await?;
        primitives.settle(timing.post_login_settle()).await;

        let mut tally = RunTally::default();
        let mut reports = Vec::new();

        info!("Waiting for page load");
        if let Err(err) = self
            .ctx
            .sync()
            .await_condition(&Condition::DocumentReady, timing.page_load_timeout())
            .await
        {
            warn!(error = %err, "Page did not finish loading");
            return Ok(self.summarize(run_id, started_at, StopReason::PageNotReady, tally, reports));
        }
        primitives.settle(timing.page_load_settle()).await;

        let mut index = 0usize;
        let stop_reason = loop {
            if self.max_items.is_some_and(|cap| index >= cap) {
                break StopReason::MaxItems;
            }

            let items = match self.enumerator.list_assignments().await {
                Ok(items) if !items.is_empty() => items,
                Ok(_) | Err(_) => break StopReason::NoItems,
            };
            let Some(item) = items.get(index) else {
                break StopReason::Exhausted;
            };

            info!(position = index + 1, total = items.len(), name = %item.name, "Dispatching assignment");
            let report = self.workflow.execute(item).await;
            tally.record(&report.outcome);
            reports.push(report);
            index += 1;

            primitives.settle(timing.between_items_settle()).await;
        };

        Ok(self.summarize(run_id, started_at, stop_reason, tally, reports))
    }

    fn summarize(
        &self,
        run_id: String,
        started_at: chrono::DateTime<Utc>,
        stop_reason: StopReason,
        tally: RunTally,
        reports: Vec<crate::types::ItemReport>,
    ) -> RunSummary {
        info!(
            %run_id,
            succeeded = tally.succeeded,
            failed = tally.failed,
            ?stop_reason,
            "Run finished"
        );
        RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            stop_reason,
            tally,
            reports,
        }
    }
}
