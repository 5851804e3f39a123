//! Polling against the live document

use crate::{errors::ActionError, types::SyncConfig};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};
use wd_adapter::{ElementRef, Locator, WebDriver};

/// Condition checked against the current browsing context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// At least one element matches the locator
    Present(Locator),

    /// At least one element beneath `parent` matches the locator
    PresentUnder(ElementRef, Locator),

    /// `document.readyState` reports `complete`
    DocumentReady,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Present(locator) => write!(f, "presence of {}", locator),
            Condition::PresentUnder(parent, locator) => {
                write!(f, "presence of {} under {}", locator, parent)
            }
            Condition::DocumentReady => f.write_str("document ready"),
        }
    }
}

/// Side effect run between the bounded polls of a deadline-driven wait
#[async_trait]
pub trait OnTick: Send + Sync {
    async fn on_tick(&self);
}

/// Tick hook that does nothing
pub struct NoTick;

#[async_trait]
impl OnTick for NoTick {
    async fn on_tick(&self) {}
}

/// Polls conditions at a fixed cadence until they hold or a deadline passes
#[derive(Clone)]
pub struct Synchronizer {
    driver: Arc<dyn WebDriver>,
    config: SyncConfig,
}

impl Synchronizer {
    pub fn new(driver: Arc<dyn WebDriver>, config: SyncConfig) -> Self {
        Self { driver, config }
    }

    pub fn driver(&self) -> &Arc<dyn WebDriver> {
        &self.driver
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Evaluates `condition` once. Transient driver errors count as "not yet".
    async fn check_once(&self, condition: &Condition) -> Result<Option<Vec<ElementRef>>, ActionError> {
        let outcome = match condition {
            Condition::Present(locator) => self.driver.find_elements(locator).await,
            Condition::PresentUnder(parent, locator) => {
                self.driver.find_elements_from(parent, locator).await
            }
            Condition::DocumentReady => {
                return match self.driver.document_ready_state().await {
                    Ok(state) if state == "complete" => Ok(Some(Vec::new())),
                    Ok(_) => Ok(None),
                    Err(err) if err.is_transient() => Ok(None),
                    Err(err) => Err(ActionError::DriverIo(err.to_string())),
                };
            }
        };

        match outcome {
            Ok(found) if found.is_empty() => Ok(None),
            Ok(found) => Ok(Some(found)),
            Err(err) if err.is_transient() => {
                debug!(%condition, error = %err, "transient check failure");
                Ok(None)
            }
            Err(err) => Err(ActionError::DriverIo(err.to_string())),
        }
    }

    /// Polls `condition` until it matches or `timeout` elapses.
    ///
    /// Returns the matched elements (empty for [`Condition::DocumentReady`]). The last
    /// check is issued no later than the deadline, so the call overshoots `timeout` by at
    /// most the duration of one check.
    pub async fn await_condition(
        &self,
        condition: &Condition,
        timeout: Duration,
    ) -> Result<Vec<ElementRef>, ActionError> {
        let deadline = Instant::now() + timeout;
        let mut polls = 0u32;

        loop {
            polls += 1;
            if let Some(found) = self.check_once(condition).await? {
                debug!(%condition, polls, "condition met");
                return Ok(found);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ActionError::SyncTimeout(format!(
                    "{} not met after {}ms ({} polls)",
                    condition,
                    timeout.as_millis(),
                    polls
                )));
            }
            sleep((deadline - now).min(self.config.poll_interval)).await;
        }
    }

    /// Waits for the first element matching `locator`.
    pub async fn await_element(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<ElementRef, ActionError> {
        let found = self
            .await_condition(&Condition::Present(locator.clone()), timeout)
            .await?;
        first(found, locator)
    }

    /// Waits for the first element beneath `parent` matching `locator`.
    pub async fn await_element_under(
        &self,
        parent: &ElementRef,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<ElementRef, ActionError> {
        let found = self
            .await_condition(
                &Condition::PresentUnder(parent.clone(), locator.clone()),
                timeout,
            )
            .await?;
        first(found, locator)
    }

    /// Re-issues short bounded waits until `overall` elapses, running `on_tick` between
    /// them.
    ///
    /// Any failure of a bounded wait, including a discarded browsing context, only
    /// triggers the next round. The call overshoots `overall` by at most one polling
    /// interval plus one `on_tick`.
    pub async fn await_condition_unbounded(
        &self,
        condition: &Condition,
        overall: Duration,
        on_tick: &dyn OnTick,
    ) -> Result<Vec<ElementRef>, ActionError> {
        let deadline = Instant::now() + overall;
        let mut rounds = 0u32;

        loop {
            rounds += 1;
            let window = deadline
                .saturating_duration_since(Instant::now())
                .min(self.config.check_timeout);
            match self.await_condition(condition, window).await {
                Ok(found) => return Ok(found),
                Err(err) => debug!(%condition, rounds, error = %err, "still waiting"),
            }

            if Instant::now() >= deadline {
                break;
            }
            on_tick.on_tick().await;

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            sleep((deadline - now).min(self.config.tick_pause)).await;
        }

        warn!(%condition, rounds, overall_ms = overall.as_millis() as u64, "overall deadline elapsed");
        Err(ActionError::SyncTimeout(format!(
            "{} not met within overall deadline of {}ms ({} rounds)",
            condition,
            overall.as_millis(),
            rounds
        )))
    }
}

fn first(found: Vec<ElementRef>, locator: &Locator) -> Result<ElementRef, ActionError> {
    found
        .into_iter()
        .next()
        .ok_or_else(|| ActionError::SyncTimeout(format!("no element matched {}", locator)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use wd_adapter::StubDriver;

    fn sync_over(stub: Arc<StubDriver>) -> Synchronizer {
        Synchronizer::new(stub, SyncConfig::default())
    }

    struct CountingTick {
        ticks: Mutex<u32>,
        cost: Duration,
    }

    #[async_trait]
    impl OnTick for CountingTick {
        async fn on_tick(&self) {
            *self.ticks.lock() += 1;
            sleep(self.cost).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_wait_returns_once_element_appears() {
        let stub = Arc::new(StubDriver::new());
        let late = stub.add_element(&[], Locator::id("launchRHP"), "");
        stub.appear_after(&late, Duration::from_millis(1_200));
        let sync = sync_over(stub);

        let started = Instant::now();
        let found = tokio_test::assert_ok!(
            sync.await_element(&Locator::id("launchRHP"), Duration::from_secs(5))
                .await
        );
        assert_eq!(found, late);
        assert!(started.elapsed() >= Duration::from_millis(1_200));
        assert!(started.elapsed() <= Duration::from_millis(1_200) + Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_wait_overshoots_by_at_most_one_interval() {
        let stub = Arc::new(StubDriver::new());
        let sync = sync_over(stub);
        let timeout = Duration::from_millis(2_300);

        let started = Instant::now();
        let err = sync
            .await_condition(&Condition::Present(Locator::css("missing")), timeout)
            .await
            .expect_err("never appears");
        let elapsed = started.elapsed();

        assert!(matches!(err, ActionError::SyncTimeout(_)));
        assert!(elapsed >= timeout);
        assert!(elapsed <= timeout + sync.config().poll_interval);
    }

    #[tokio::test(start_paused = true)]
    async fn document_ready_waits_for_complete() {
        let stub = Arc::new(StubDriver::new());
        stub.set_ready_state("loading");
        let sync = sync_over(stub.clone());

        let err = sync
            .await_condition(&Condition::DocumentReady, Duration::from_secs(1))
            .await
            .expect_err("still loading");
        assert!(matches!(err, ActionError::SyncTimeout(_)));

        stub.set_ready_state("complete");
        let found = sync
            .await_condition(&Condition::DocumentReady, Duration::from_secs(1))
            .await
            .expect("ready");
        assert!(found.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_wait_ticks_between_rounds_and_respects_deadline() {
        let stub = Arc::new(StubDriver::new());
        let sync = sync_over(stub);
        let tick = CountingTick {
            ticks: Mutex::new(0),
            cost: Duration::from_millis(300),
        };
        let overall = Duration::from_secs(10);

        let started = Instant::now();
        let err = sync
            .await_condition_unbounded(
                &Condition::Present(Locator::xpath("//button[text()='Submit']")),
                overall,
                &tick,
            )
            .await
            .expect_err("submit never appears");
        let elapsed = started.elapsed();

        assert!(matches!(err, ActionError::SyncTimeout(_)));
        assert!(*tick.ticks.lock() >= 2);
        assert!(elapsed >= overall);
        assert!(elapsed <= overall + sync.config().poll_interval + tick.cost);
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_wait_finds_late_element() {
        let stub = Arc::new(StubDriver::new());
        let submit = stub.add_element(&[], Locator::xpath("//button[text()='Submit']"), "Submit");
        stub.appear_after(&submit, Duration::from_secs(42));
        let sync = sync_over(stub);

        let found = sync
            .await_condition_unbounded(
                &Condition::Present(Locator::xpath("//button[text()='Submit']")),
                Duration::from_secs(500),
                &NoTick,
            )
            .await
            .expect("submit appears");
        assert_eq!(found, vec![submit]);
    }
}
