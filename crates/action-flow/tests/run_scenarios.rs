//! End-to-end runs against the in-memory driver, one nested-frame site per test.

use std::sync::Arc;
use std::time::Duration;

use action_flow::{
    Credentials, FlowContext, FlowError, ItemOutcome, LoginMode, Operator, RunController,
    SiteProfile, StopReason, TimingProfile, WorkflowStage,
};
use async_trait::async_trait;
use wd_adapter::{ElementRef, StubDriver, StubEvent};

struct ConfirmingOperator;

#[async_trait]
impl Operator for ConfirmingOperator {
    async fn await_manual_login(&self) -> Result<(), FlowError> {
        Ok(())
    }
}

/// Handles to the interesting controls of a simulated site.
struct Site {
    stub: Arc<StubDriver>,
    profile: SiteProfile,
    items: Vec<ElementRef>,
    abandon: ElementRef,
    start: ElementRef,
    close: ElementRef,
}

/// Which player parts the simulated site mounts
#[derive(Clone, Copy)]
struct Player {
    frame: bool,
    begin: bool,
    submit: bool,
}

impl Player {
    const COMPLETE: Player = Player {
        frame: true,
        begin: true,
        submit: true,
    };
}

fn site(titles: &[&str], status: &str, with_submit: bool) -> Site {
    site_with_player(
        titles,
        status,
        Player {
            submit: with_submit,
            ..Player::COMPLETE
        },
    )
}

/// Builds the three-level topology: content frame with the list, attempt frame with
/// the attempt controls, player frame nested in the attempt frame.
fn site_with_player(titles: &[&str], status: &str, player: Player) -> Site {
    let stub = Arc::new(StubDriver::new());
    let profile = SiteProfile::default();
    stub.set_url("https://newconnect.mheducation.com/connect/home");

    stub.add_frame(&[], "iframeContent");
    let mut items = Vec::new();
    for title in titles {
        let item = stub.add_element(&["iframeContent"], profile.item.clone(), "");
        stub.add_child(&item, profile.item_name.clone(), title);
        stub.add_child(&item, profile.panel_open.clone(), "");
        items.push(item);
    }
    stub.add_element(&["iframeContent"], profile.launch.clone(), "Begin");

    stub.add_frame(&[], "lti_iframe");
    let start = stub.add_element(&["lti_iframe"], profile.attempt_status.clone(), status);
    let abandon = stub.add_element(&["lti_iframe"], profile.abandon.clone(), "Exit");
    let close = stub.add_element(&["lti_iframe"], profile.close.clone(), "Close");
    if player.frame {
        stub.add_frame(&["lti_iframe"], "mzl-play-iframe");
        if player.begin {
            stub.add_element(&["lti_iframe", "mzl-play-iframe"], profile.begin.clone(), "begin");
        }
        if player.submit {
            stub.add_element(&["lti_iframe", "mzl-play-iframe"], profile.submit.clone(), "Submit");
        }
    }

    Site {
        stub,
        profile,
        items,
        abandon,
        start,
        close,
    }
}

fn controller(site: &Site) -> (Arc<FlowContext>, RunController) {
    let ctx = Arc::new(FlowContext::new(
        site.stub.clone(),
        site.profile.clone(),
        TimingProfile::default(),
    ));
    (ctx.clone(), RunController::new(ctx))
}

#[tokio::test(start_paused = true)]
async fn empty_list_yields_empty_tally() {
    let site = site(&[], "Continue attempt 1", true);
    let (_, runner) = controller(&site);

    let summary = runner
        .run(&LoginMode::Attended, &ConfirmingOperator)
        .await
        .expect("run");
    assert_eq!(summary.tally.succeeded, 0);
    assert_eq!(summary.tally.failed, 0);
    assert_eq!(summary.stop_reason, StopReason::NoItems);
    assert!(summary.reports.is_empty());
}

#[tokio::test(start_paused = true)]
async fn first_attempt_walks_every_stage() {
    let site = site(&["Chapter 1 Listening"], "Continue attempt 1", true);
    let (ctx, runner) = controller(&site);

    let summary = runner
        .run(&LoginMode::Attended, &ConfirmingOperator)
        .await
        .expect("run");

    assert_eq!(summary.tally.succeeded, 1);
    assert_eq!(summary.tally.failed, 0);
    assert_eq!(summary.stop_reason, StopReason::Exhausted);
    let report = &summary.reports[0];
    assert_eq!(report.name, "Chapter 1 Listening");
    assert_eq!(report.outcome, ItemOutcome::Done);
    assert_eq!(
        report.trace,
        vec![
            WorkflowStage::Located,
            WorkflowStage::PanelOpen,
            WorkflowStage::AttemptCheck,
            WorkflowStage::AttemptStart,
            WorkflowStage::PlayerWait,
            WorkflowStage::PlayerEnter,
            WorkflowStage::PlayerBegin,
            WorkflowStage::AwaitSubmit,
            WorkflowStage::Closing,
            WorkflowStage::Done,
        ]
    );
    assert!(site.stub.was_clicked(&site.start));
    assert!(site.stub.was_clicked(&site.close));
    assert!(!site.stub.was_clicked(&site.abandon));
    assert!(ctx.navigator.is_root());
    assert!(site.stub.current_frames().is_empty());
}

#[tokio::test(start_paused = true)]
async fn prior_attempt_is_abandoned_before_player() {
    let site = site(&["Chapter 2 Reading"], "Continue attempt 2", true);
    let (_, runner) = controller(&site);

    let summary = runner
        .run(&LoginMode::Attended, &ConfirmingOperator)
        .await
        .expect("run");

    assert_eq!(summary.tally.succeeded, 0);
    assert_eq!(summary.tally.failed, 1);
    let report = &summary.reports[0];
    assert!(matches!(
        report.outcome,
        ItemOutcome::Failed {
            stage: WorkflowStage::AttemptCheck,
            skipped: true,
            ..
        }
    ));
    assert!(!report.trace.contains(&WorkflowStage::PlayerWait));
    assert!(site.stub.was_clicked(&site.abandon));
    assert!(!site.stub.was_clicked(&site.start));
}

#[tokio::test(start_paused = true)]
async fn missing_submit_fails_and_returns_to_root() {
    let site = site(&["Chapter 3 Vocabulary"], "Continue attempt 1", false);
    let (ctx, runner) = controller(&site);

    let summary = runner
        .run(&LoginMode::Attended, &ConfirmingOperator)
        .await
        .expect("run");

    assert_eq!(summary.tally.failed, 1);
    assert!(matches!(
        summary.reports[0].outcome,
        ItemOutcome::Failed {
            stage: WorkflowStage::AwaitSubmit,
            skipped: false,
            ..
        }
    ));
    assert!(!site.stub.was_clicked(&site.close));
    assert!(ctx.navigator.is_root());
    assert!(site.stub.current_frames().is_empty());
    assert_eq!(site.stub.events().last(), Some(&StubEvent::ExitToTop));
}

#[tokio::test(start_paused = true)]
async fn submit_is_found_after_player_rebuilds_its_frames() {
    let site = site(&["Chapter 4 Speaking"], "Continue attempt 1", false);
    let submit = site.stub.add_element(
        &["lti_iframe", "mzl-play-iframe"],
        site.profile.submit.clone(),
        "Submit",
    );
    site.stub.appear_after(&submit, Duration::from_secs(120));
    site.stub.teardown_context_after(Duration::from_secs(90));
    let (_, runner) = controller(&site);

    let summary = runner
        .run(&LoginMode::Attended, &ConfirmingOperator)
        .await
        .expect("run");

    assert_eq!(summary.tally.succeeded, 1);
    assert!(site.stub.was_clicked(&submit));
}

#[tokio::test(start_paused = true)]
async fn rejected_login_aborts_before_enumeration() {
    let site = site(&["Chapter 5"], "Continue attempt 1", true);
    site.stub.set_url("https://newconnect.mheducation.com/LOGIN?redirect=home");
    site.stub
        .add_element(&[], site.profile.login_email.clone(), "");
    site.stub
        .add_element(&[], site.profile.login_password.clone(), "");
    site.stub
        .add_element(&[], site.profile.login_submit.clone(), "Sign In");
    let (_, runner) = controller(&site);

    let err = runner
        .run(
            &LoginMode::Unattended(Credentials::new("student@example.com", "wrong")),
            &ConfirmingOperator,
        )
        .await
        .expect_err("login rejected");

    assert!(matches!(err, FlowError::LoginFailed(_)));
    assert!(!site
        .stub
        .events()
        .iter()
        .any(|event| matches!(event, StubEvent::EnterFrame(_))));
}

#[tokio::test(start_paused = true)]
async fn tally_matches_processed_items_and_respects_cap() {
    let site = site(&["A", "B", "C"], "Continue attempt 1", true);
    let (_, runner) = controller(&site);
    let runner = runner.with_max_items(Some(2));

    let summary = runner
        .run(&LoginMode::Attended, &ConfirmingOperator)
        .await
        .expect("run");

    assert_eq!(summary.stop_reason, StopReason::MaxItems);
    assert_eq!(summary.tally.processed() as usize, summary.reports.len());
    assert_eq!(summary.reports.len(), 2);
    assert_eq!(summary.reports[1].name, "B");
    assert_eq!(summary.reports[1].index, 1);
    assert!(site.items.len() == 3);
}

#[tokio::test(start_paused = true)]
async fn unready_page_ends_run_with_empty_tally() {
    let site = site(&["A"], "Continue attempt 1", true);
    site.stub.set_ready_state("loading");
    let (_, runner) = controller(&site);

    let summary = runner
        .run(&LoginMode::Attended, &ConfirmingOperator)
        .await
        .expect("run");
    assert_eq!(summary.stop_reason, StopReason::PageNotReady);
    assert_eq!(summary.tally.processed(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_begin_control_is_tolerated() {
    let site = site_with_player(
        &["Chapter 6 Writing"],
        "Continue attempt 1",
        Player {
            begin: false,
            ..Player::COMPLETE
        },
    );
    let (ctx, runner) = controller(&site);

    let summary = runner
        .run(&LoginMode::Attended, &ConfirmingOperator)
        .await
        .expect("run");

    assert_eq!(summary.tally.succeeded, 1);
    let report = &summary.reports[0];
    assert_eq!(report.outcome, ItemOutcome::Done);
    assert_eq!(
        report.trace,
        vec![
            WorkflowStage::Located,
            WorkflowStage::PanelOpen,
            WorkflowStage::AttemptCheck,
            WorkflowStage::AttemptStart,
            WorkflowStage::PlayerWait,
            WorkflowStage::PlayerEnter,
            WorkflowStage::PlayerBegin,
            WorkflowStage::AwaitSubmit,
            WorkflowStage::Closing,
            WorkflowStage::Done,
        ]
    );
    assert!(site.stub.was_clicked(&site.close));
    assert!(ctx.navigator.is_root());
}

#[tokio::test(start_paused = true)]
async fn player_frame_that_never_mounts_fails_in_player_wait() {
    let site = site_with_player(
        &["Chapter 7 Grammar"],
        "Continue attempt 1",
        Player {
            frame: false,
            ..Player::COMPLETE
        },
    );
    let (ctx, runner) = controller(&site);

    let summary = runner
        .run(&LoginMode::Attended, &ConfirmingOperator)
        .await
        .expect("run");

    assert_eq!(summary.tally.failed, 1);
    let report = &summary.reports[0];
    match &report.outcome {
        ItemOutcome::Failed {
            stage,
            reason,
            skipped,
        } => {
            assert_eq!(*stage, WorkflowStage::PlayerWait);
            assert!(!skipped);
            assert!(reason.contains("mzl-play-iframe"), "reason: {reason}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(
        report.trace,
        vec![
            WorkflowStage::Located,
            WorkflowStage::PanelOpen,
            WorkflowStage::AttemptCheck,
            WorkflowStage::AttemptStart,
            WorkflowStage::PlayerWait,
            WorkflowStage::Failed,
        ]
    );
    assert!(site.stub.was_clicked(&site.start));
    assert!(!site.stub.was_clicked(&site.close));
    assert!(ctx.navigator.is_root());
    assert!(site.stub.current_frames().is_empty());
}
