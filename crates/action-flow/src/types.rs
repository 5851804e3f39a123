//! Core types for the assignment flow

use action_primitives::{FramePath, SyncConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use wd_adapter::{ElementRef, FrameId, Locator};

/// Where the site lives and how to find everything on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Landing page opened before login
    pub target_url: String,

    /// Frame hosting the assignment list
    pub content_frame: FrameId,

    /// Frame hosting the attempt controls and the close button
    pub attempt_frame: FrameId,

    /// Player frame nested inside the attempt frame
    pub player_frame: FrameId,

    pub login_email: Locator,
    pub login_password: Locator,
    pub login_submit: Locator,

    /// Assignment list entries inside the content frame
    pub item: Locator,

    /// Title element beneath an item
    pub item_name: Locator,

    /// Side-panel toggle beneath an item
    pub panel_open: Locator,

    pub launch: Locator,
    pub attempt_status: Locator,
    pub abandon: Locator,
    pub start_attempt: Locator,
    pub begin: Locator,
    pub submit: Locator,
    pub close: Locator,

    /// Top-level close control clicked once after a failed item
    pub fallback_close: Locator,

    /// Attempt-status text marking an untouched assignment
    pub first_attempt_marker: String,

    /// URL fragment that means the login page is still showing (case-insensitive)
    pub login_marker: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            target_url: "https://newconnect.mheducation.com/".to_string(),
            content_frame: FrameId::from("iframeContent"),
            attempt_frame: FrameId::from("lti_iframe"),
            player_frame: FrameId::from("mzl-play-iframe"),
            login_email: Locator::xpath(r#"//*[@id="login-email"]"#),
            login_password: Locator::xpath(r#"//*[@id="login-password"]"#),
            login_submit: Locator::xpath(r#"//*[@id="login-submit-btn"]"#),
            item: Locator::xpath("//li[contains(@data-section-id, '149791932')]"),
            item_name: Locator::tag("h3"),
            panel_open: Locator::xpath(r#".//button[@class="assignment-actions text-right"]"#),
            launch: Locator::id("launchRHP"),
            attempt_status: Locator::css("a.cnButton.cnButton--primary.fr"),
            abandon: Locator::css("a.cnButton.cnButton--default"),
            start_attempt: Locator::css("a.cnButton.cnButton--primary.fr"),
            begin: Locator::xpath("//button[text()='begin']"),
            submit: Locator::xpath("//button[text()='Submit']"),
            close: Locator::xpath(r#"//*[@id="mzl-cn-header"]/div[2]/button"#),
            fallback_close: Locator::css(r#"button[aria-label="Close Activity"]"#),
            first_attempt_marker: "Continue attempt 1".to_string(),
            login_marker: "login".to_string(),
        }
    }
}

/// Timeouts and settle delays, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingProfile {
    pub poll_interval_ms: u64,
    pub element_timeout_ms: u64,
    pub short_timeout_ms: u64,
    pub page_load_timeout_ms: u64,
    pub page_load_settle_ms: u64,
    pub action_settle_ms: u64,
    pub close_settle_ms: u64,
    pub login_settle_ms: u64,
    pub post_login_settle_ms: u64,
    pub between_items_settle_ms: u64,
    pub submit_check_ms: u64,
    pub submit_pause_ms: u64,
    pub submit_deadline_ms: u64,
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            element_timeout_ms: 20_000,
            short_timeout_ms: 10_000,
            page_load_timeout_ms: 20_000,
            page_load_settle_ms: 5_000,
            action_settle_ms: 2_000,
            close_settle_ms: 3_000,
            login_settle_ms: 5_000,
            post_login_settle_ms: 5_000,
            between_items_settle_ms: 3_000,
            submit_check_ms: 1_000,
            submit_pause_ms: 2_000,
            submit_deadline_ms: 500_000,
        }
    }
}

impl TimingProfile {
    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn short_timeout(&self) -> Duration {
        Duration::from_millis(self.short_timeout_ms)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }

    pub fn page_load_settle(&self) -> Duration {
        Duration::from_millis(self.page_load_settle_ms)
    }

    pub fn action_settle(&self) -> Duration {
        Duration::from_millis(self.action_settle_ms)
    }

    pub fn close_settle(&self) -> Duration {
        Duration::from_millis(self.close_settle_ms)
    }

    pub fn login_settle(&self) -> Duration {
        Duration::from_millis(self.login_settle_ms)
    }

    pub fn post_login_settle(&self) -> Duration {
        Duration::from_millis(self.post_login_settle_ms)
    }

    pub fn between_items_settle(&self) -> Duration {
        Duration::from_millis(self.between_items_settle_ms)
    }

    pub fn submit_deadline(&self) -> Duration {
        Duration::from_millis(self.submit_deadline_ms)
    }

    /// Polling cadence for the synchronizer
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            check_timeout: Duration::from_millis(self.submit_check_ms),
            tick_pause: Duration::from_millis(self.submit_pause_ms),
        }
    }
}

/// One entry of the assignment list, valid only for the enumeration pass that produced
/// it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentItem {
    pub index: usize,
    pub name: String,
    pub element: ElementRef,
    /// Frame path the element lives in
    pub context: FramePath,
}

/// Per-item workflow stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Located,
    PanelOpen,
    AttemptCheck,
    AttemptStart,
    PlayerWait,
    PlayerEnter,
    PlayerBegin,
    AwaitSubmit,
    Closing,
    Done,
    Failed,
}

impl WorkflowStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStage::Done | WorkflowStage::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::Located => "located",
            WorkflowStage::PanelOpen => "panel_open",
            WorkflowStage::AttemptCheck => "attempt_check",
            WorkflowStage::AttemptStart => "attempt_start",
            WorkflowStage::PlayerWait => "player_wait",
            WorkflowStage::PlayerEnter => "player_enter",
            WorkflowStage::PlayerBegin => "player_begin",
            WorkflowStage::AwaitSubmit => "await_submit",
            WorkflowStage::Closing => "closing",
            WorkflowStage::Done => "done",
            WorkflowStage::Failed => "failed",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an assignment has been attempted before
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    FirstAttempt,
    PriorAttempt,
}

impl AttemptState {
    pub fn from_status_text(text: &str, first_attempt_marker: &str) -> Self {
        if text.contains(first_attempt_marker) {
            AttemptState::FirstAttempt
        } else {
            AttemptState::PriorAttempt
        }
    }
}

/// Terminal result of one workflow execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    Done,
    Failed {
        stage: WorkflowStage,
        reason: String,
        /// The item was deliberately abandoned rather than broken
        skipped: bool,
    },
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Done)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReport {
    pub index: usize,
    pub name: String,
    pub outcome: ItemOutcome,
    /// Stages entered, ending with the terminal stage
    pub trace: Vec<WorkflowStage>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Success and failure counters for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTally {
    pub succeeded: u32,
    pub failed: u32,
}

impl RunTally {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn processed(&self) -> u32 {
        self.succeeded + self.failed
    }
}

/// Why the run loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every enumerated item was dispatched
    Exhausted,
    /// The assignment list was empty or could not be read
    NoItems,
    /// The configured item cap was reached
    MaxItems,
    /// The document never reported ready after login
    PageNotReady,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stop_reason: StopReason,
    pub tally: RunTally,
    pub reports: Vec<ItemReport>,
}
