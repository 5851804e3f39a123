use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::process::{Child, Command};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::commands::WireCommand;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::transport::WdTransport;

/// A browser driver executable spawned for the lifetime of a run.
pub struct DriverProcess {
    child: Child,
    endpoint: String,
}

impl DriverProcess {
    /// Spawns `executable` listening on `port`. The child is killed when dropped.
    pub fn spawn(executable: &Path, port: u16) -> Result<Self, AdapterError> {
        info!(driver = %executable.display(), port, "spawning webdriver executable");
        let child = Command::new(executable)
            .arg(format!("--port={port}"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                AdapterError::new(AdapterErrorKind::Internal).with_hint(format!(
                    "failed to spawn {}: {err}",
                    executable.display()
                ))
            })?;

        Ok(Self {
            child,
            endpoint: format!("http://127.0.0.1:{port}/"),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn shutdown(mut self) {
        if let Err(err) = self.child.kill().await {
            warn!(?err, "failed to stop webdriver executable");
        }
    }

    /// Lets the driver (and the browser it controls) outlive this process.
    pub fn leave_running(self) {
        info!(pid = ?self.child.id(), "leaving webdriver executable running");
        std::mem::forget(self.child);
    }
}

/// Polls `GET /status` until the driver reports ready or `timeout` elapses.
pub async fn wait_until_ready(
    transport: &dyn WdTransport,
    timeout: Duration,
) -> Result<(), AdapterError> {
    let deadline = Instant::now() + timeout;
    loop {
        match transport.send_command(WireCommand::get("status", "status")).await {
            Ok(value) if value.get("ready").and_then(Value::as_bool).unwrap_or(false) => {
                debug!("webdriver endpoint ready");
                return Ok(());
            }
            Ok(_) => debug!("webdriver endpoint not ready yet"),
            Err(err) => debug!(error = %err, "webdriver endpoint unreachable"),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(AdapterError::new(AdapterErrorKind::Timeout)
                .with_hint(format!("driver not ready after {}ms", timeout.as_millis())));
        }
        sleep((deadline - now).min(Duration::from_millis(250))).await;
    }
}
