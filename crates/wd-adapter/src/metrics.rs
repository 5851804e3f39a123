//! WebDriver traffic metrics
//!
//! Commands are counted by name. Failures are counted by [`AdapterErrorKind`] and split
//! into transient ones (the "not yet" answers a poller expects while a frame is being
//! rebuilt) and hard ones.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{
    core::Collector, histogram_opts, HistogramVec, IntCounter, IntCounterVec, Registry,
};
use tracing::error;

use crate::error::{AdapterError, AdapterErrorKind};

/// Names of the Prometheus families registered by [`register_metrics`].
pub const METRIC_NAMES: &[&str] = &[
    "pilot_webdriver_sessions_total",
    "pilot_webdriver_commands_total",
    "pilot_webdriver_command_failures_total",
    "pilot_webdriver_command_duration_seconds",
];

const KIND_COUNT: usize = AdapterErrorKind::ALL.len();

#[allow(clippy::declare_interior_mutable_const)]
const ZERO: AtomicU64 = AtomicU64::new(0);

static SESSIONS: AtomicU64 = AtomicU64::new(0);
static COMMANDS: AtomicU64 = AtomicU64::new(0);
static SUCCEEDED: AtomicU64 = AtomicU64::new(0);
static LATENCY_TOTAL_US: AtomicU64 = AtomicU64::new(0);
static FAILURES_BY_KIND: [AtomicU64; KIND_COUNT] = [ZERO; KIND_COUNT];
static TRANSIENT_FAILURES: AtomicU64 = AtomicU64::new(0);

lazy_static! {
    static ref WD_SESSIONS_TOTAL: IntCounter = IntCounter::new(
        METRIC_NAMES[0],
        "WebDriver sessions opened"
    )
    .unwrap();
    static ref WD_COMMANDS_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new(METRIC_NAMES[1], "WebDriver commands sent, by endpoint"),
        &["command"]
    )
    .unwrap();
    static ref WD_COMMAND_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new(
            METRIC_NAMES[2],
            "WebDriver commands answered with an error, by endpoint and error kind"
        ),
        &["command", "kind", "transient"]
    )
    .unwrap();
    static ref WD_COMMAND_DURATION: HistogramVec = HistogramVec::new(
        histogram_opts!(
            METRIC_NAMES[3],
            "Round-trip time of successful WebDriver commands",
            vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0, 30.0]
        ),
        &["command"]
    )
    .unwrap();
}

/// Point-in-time view of the WebDriver traffic of this process
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct WebDriverMetricsSnapshot {
    pub sessions: u64,
    pub commands: u64,
    pub succeeded: u64,
    pub transient_failures: u64,
    pub hard_failures: u64,
    pub latency_total_us: u64,
    /// Kinds with at least one failure, in [`AdapterErrorKind::ALL`] order
    pub failures_by_kind: Vec<(AdapterErrorKind, u64)>,
}

impl WebDriverMetricsSnapshot {
    pub fn failures(&self) -> u64 {
        self.transient_failures + self.hard_failures
    }

    /// Mean round trip of successful commands.
    pub fn mean_latency(&self) -> Option<Duration> {
        (self.succeeded > 0).then(|| Duration::from_micros(self.latency_total_us / self.succeeded))
    }
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register webdriver metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, WD_SESSIONS_TOTAL.clone());
    register(registry, WD_COMMANDS_TOTAL.clone());
    register(registry, WD_COMMAND_FAILURES_TOTAL.clone());
    register(registry, WD_COMMAND_DURATION.clone());
}

pub fn record_session_opened() {
    SESSIONS.fetch_add(1, Ordering::Relaxed);
    WD_SESSIONS_TOTAL.inc();
}

pub fn record_command(command: &str) {
    COMMANDS.fetch_add(1, Ordering::Relaxed);
    WD_COMMANDS_TOTAL.with_label_values(&[command]).inc();
}

pub fn record_command_success(command: &str, duration: Duration) {
    SUCCEEDED.fetch_add(1, Ordering::Relaxed);
    let micros = duration.as_micros().min(u64::MAX as u128) as u64;
    LATENCY_TOTAL_US.fetch_add(micros, Ordering::Relaxed);
    WD_COMMAND_DURATION
        .with_label_values(&[command])
        .observe(duration.as_secs_f64());
}

pub fn record_command_failure(command: &str, err: &AdapterError) {
    let transient = err.is_transient();
    FAILURES_BY_KIND[err.kind.ordinal()].fetch_add(1, Ordering::Relaxed);
    if transient {
        TRANSIENT_FAILURES.fetch_add(1, Ordering::Relaxed);
    }
    WD_COMMAND_FAILURES_TOTAL
        .with_label_values(&[command, err.kind.as_str(), if transient { "true" } else { "false" }])
        .inc();
}

pub fn snapshot() -> WebDriverMetricsSnapshot {
    let failures_by_kind: Vec<(AdapterErrorKind, u64)> = AdapterErrorKind::ALL
        .iter()
        .map(|kind| (*kind, FAILURES_BY_KIND[kind.ordinal()].load(Ordering::Relaxed)))
        .filter(|(_, count)| *count > 0)
        .collect();
    let failures: u64 = failures_by_kind.iter().map(|(_, count)| count).sum();
    let transient_failures = TRANSIENT_FAILURES.load(Ordering::Relaxed).min(failures);

    WebDriverMetricsSnapshot {
        sessions: SESSIONS.load(Ordering::Relaxed),
        commands: COMMANDS.load(Ordering::Relaxed),
        succeeded: SUCCEEDED.load(Ordering::Relaxed),
        transient_failures,
        hard_failures: failures - transient_failures,
        latency_total_us: LATENCY_TOTAL_US.load(Ordering::Relaxed),
        failures_by_kind,
    }
}

pub fn reset() {
    for counter in [&SESSIONS, &COMMANDS, &SUCCEEDED, &LATENCY_TOTAL_US, &TRANSIENT_FAILURES] {
        counter.store(0, Ordering::Relaxed);
    }
    for counter in &FAILURES_BY_KIND {
        counter.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn failures_are_split_by_kind_and_transience() {
        reset();
        record_session_opened();
        for _ in 0..3 {
            record_command("find_elements");
        }
        record_command_success("find_elements", Duration::from_micros(300));
        record_command_failure(
            "find_elements",
            &AdapterError::new(AdapterErrorKind::StaleElement),
        );
        record_command_failure("find_elements", &AdapterError::new(AdapterErrorKind::Transport));

        let snap = snapshot();
        assert_eq!(snap.sessions, 1);
        assert_eq!(snap.commands, 3);
        assert_eq!(snap.succeeded, 1);
        assert_eq!(snap.transient_failures, 1);
        assert_eq!(snap.hard_failures, 1);
        assert_eq!(snap.failures(), 2);
        assert_eq!(
            snap.failures_by_kind,
            vec![
                (AdapterErrorKind::StaleElement, 1),
                (AdapterErrorKind::Transport, 1)
            ]
        );
        assert_eq!(snap.mean_latency(), Some(Duration::from_micros(300)));
    }

    #[test]
    #[serial]
    fn empty_snapshot_has_no_latency() {
        reset();
        let snap = snapshot();
        assert_eq!(snap, WebDriverMetricsSnapshot::default());
        assert_eq!(snap.mean_latency(), None);
    }

    #[test]
    #[serial]
    fn registers_into_custom_registry() {
        let registry = Registry::new();
        register_metrics(&registry);
        record_session_opened();
        record_command("navigate");
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"pilot_webdriver_sessions_total".to_string()));
        assert!(names.contains(&"pilot_webdriver_commands_total".to_string()));
    }

    #[test]
    fn ordinals_follow_declaration_order() {
        for (position, kind) in AdapterErrorKind::ALL.iter().enumerate() {
            assert_eq!(kind.ordinal(), position);
        }
    }
}
