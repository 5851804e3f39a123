use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::commands::{WireCommand, WireMethod};
use crate::error::{AdapterError, AdapterErrorKind};
use crate::metrics;

#[async_trait]
pub trait WdTransport: Send + Sync {
    /// Sends one command and returns the unwrapped `value` member of the reply.
    async fn send_command(&self, command: WireCommand) -> Result<Value, AdapterError>;
}

#[derive(Default)]
pub struct NoopTransport;

#[async_trait]
impl WdTransport for NoopTransport {
    async fn send_command(&self, command: WireCommand) -> Result<Value, AdapterError> {
        Err(AdapterError::new(AdapterErrorKind::Internal)
            .with_hint(format!("transport not available for command {}", command.name)))
    }
}

/// JSON-over-HTTP transport talking to a WebDriver endpoint.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    pub fn new(endpoint: &str, request_timeout: Duration) -> Result<Self, AdapterError> {
        let normalized = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };
        let base = Url::parse(&normalized).map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal)
                .with_hint(format!("invalid webdriver endpoint '{endpoint}': {err}"))
        })?;
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| {
                AdapterError::new(AdapterErrorKind::Internal)
                    .with_hint(format!("failed to build http client: {err}"))
            })?;
        Ok(Self { client, base })
    }

    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    async fn round_trip(&self, command: &WireCommand) -> Result<Value, AdapterError> {
        let url = self
            .base
            .join(command.path.trim_start_matches('/'))
            .map_err(|err| {
                AdapterError::new(AdapterErrorKind::Internal)
                    .with_hint(format!("invalid command path '{}': {err}", command.path))
            })?;

        let request = match command.method {
            WireMethod::Get => self.client.get(url),
            WireMethod::Post => self
                .client
                .post(url)
                .json(command.body.as_ref().unwrap_or(&Value::Object(Default::default()))),
            WireMethod::Delete => self.client.delete(url),
        };

        let response = request.send().await.map_err(|err| {
            let kind = if err.is_timeout() {
                AdapterErrorKind::Timeout
            } else {
                AdapterErrorKind::Transport
            };
            AdapterError::new(kind).with_hint(err.to_string())
        })?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::Protocol)
                .with_hint(format!("malformed reply (status {status}): {err}"))
        })?;

        parse_response(status, body)
    }
}

#[async_trait]
impl WdTransport for HttpTransport {
    async fn send_command(&self, command: WireCommand) -> Result<Value, AdapterError> {
        metrics::record_command(command.name);
        let started = Instant::now();
        debug!(command = command.name, path = %command.path, "webdriver command");

        match self.round_trip(&command).await {
            Ok(value) => {
                metrics::record_command_success(command.name, started.elapsed());
                Ok(value)
            }
            Err(err) => {
                metrics::record_command_failure(command.name, &err);
                if !err.is_transient() {
                    warn!(command = command.name, error = %err, "webdriver command failed");
                }
                Err(err)
            }
        }
    }
}

/// Unwraps a W3C reply body, turning error payloads into [`AdapterError`]s.
pub fn parse_response(status: StatusCode, body: Value) -> Result<Value, AdapterError> {
    let value = match body {
        Value::Object(mut map) => map.remove("value").unwrap_or(Value::Null),
        other => {
            return Err(AdapterError::new(AdapterErrorKind::Protocol)
                .with_hint(format!("reply is not an object: {other}")))
        }
    };

    let error_code = value
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string);

    match error_code {
        Some(code) => {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Err(AdapterError::new(AdapterErrorKind::from_wire_code(&code))
                .with_hint(if message.is_empty() { code } else { message }))
        }
        None if !status.is_success() => Err(AdapterError::new(AdapterErrorKind::Protocol)
            .with_hint(format!("unexpected status {status}"))
            .with_data(value)),
        None => Ok(value),
    }
}
