use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::commands::{scripts, FrameTarget, Locator, WireCommand};
use crate::error::{AdapterError, AdapterErrorKind};
use crate::ids::{ElementRef, SessionId};
use crate::metrics;
use crate::transport::WdTransport;

/// Capability surface of a remote browser session required by upper layers.
///
/// Every query is scoped to the browsing context the session currently has focus on.
#[async_trait]
pub trait WebDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), AdapterError>;
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementRef>, AdapterError>;
    async fn find_elements_from(
        &self,
        parent: &ElementRef,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>, AdapterError>;
    async fn click(&self, element: &ElementRef) -> Result<(), AdapterError>;
    async fn clear(&self, element: &ElementRef) -> Result<(), AdapterError>;
    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), AdapterError>;
    async fn element_text(&self, element: &ElementRef) -> Result<String, AdapterError>;
    async fn switch_to_frame(&self, target: &FrameTarget) -> Result<(), AdapterError>;
    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value, AdapterError>;
    async fn current_url(&self) -> Result<String, AdapterError>;
    async fn maximize_window(&self) -> Result<(), AdapterError>;
    async fn quit(&self) -> Result<(), AdapterError>;

    async fn document_ready_state(&self) -> Result<String, AdapterError> {
        let value = self.execute_script(scripts::READY_STATE, Vec::new()).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

/// [`WebDriver`] implementation bound to one session on a transport.
pub struct WebDriverAdapter {
    transport: Arc<dyn WdTransport>,
    session: SessionId,
}

impl WebDriverAdapter {
    /// Opens a new session with the given new-session payload.
    pub async fn connect(
        transport: Arc<dyn WdTransport>,
        capabilities: Value,
    ) -> Result<Self, AdapterError> {
        let reply = transport
            .send_command(WireCommand::post("new_session", "session", capabilities))
            .await?;
        let session = reply
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AdapterError::new(AdapterErrorKind::Protocol)
                    .with_hint("new session reply lacks sessionId")
                    .with_data(reply.clone())
            })?;
        info!(session = session, "webdriver session opened");
        metrics::record_session_opened();
        Ok(Self {
            transport,
            session: SessionId(session.to_string()),
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session
    }

    fn path(&self, suffix: &str) -> String {
        format!("session/{}/{}", self.session, suffix)
    }

    fn element_path(&self, element: &ElementRef, suffix: &str) -> String {
        self.path(&format!("element/{}/{}", element, suffix))
    }

    async fn send(&self, command: WireCommand) -> Result<Value, AdapterError> {
        self.transport.send_command(command).await
    }
}

fn element_list(value: Value) -> Result<Vec<ElementRef>, AdapterError> {
    match value {
        Value::Array(items) => Ok(items.iter().filter_map(ElementRef::from_wire).collect()),
        other => Err(AdapterError::new(AdapterErrorKind::Protocol)
            .with_hint("find elements reply is not an array")
            .with_data(other)),
    }
}

#[async_trait]
impl WebDriver for WebDriverAdapter {
    async fn navigate(&self, url: &str) -> Result<(), AdapterError> {
        debug!(url, "navigate");
        self.send(WireCommand::post("navigate", self.path("url"), json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementRef>, AdapterError> {
        let reply = self
            .send(WireCommand::post(
                "find_elements",
                self.path("elements"),
                locator.to_params(),
            ))
            .await?;
        element_list(reply)
    }

    async fn find_elements_from(
        &self,
        parent: &ElementRef,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>, AdapterError> {
        let reply = self
            .send(WireCommand::post(
                "find_elements_from",
                self.element_path(parent, "elements"),
                locator.to_params(),
            ))
            .await?;
        element_list(reply)
    }

    async fn click(&self, element: &ElementRef) -> Result<(), AdapterError> {
        self.send(WireCommand::post(
            "click",
            self.element_path(element, "click"),
            json!({}),
        ))
        .await
        .map(|_| ())
    }

    async fn clear(&self, element: &ElementRef) -> Result<(), AdapterError> {
        self.send(WireCommand::post(
            "clear",
            self.element_path(element, "clear"),
            json!({}),
        ))
        .await
        .map(|_| ())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), AdapterError> {
        self.send(WireCommand::post(
            "send_keys",
            self.element_path(element, "value"),
            json!({ "text": text }),
        ))
        .await
        .map(|_| ())
    }

    async fn element_text(&self, element: &ElementRef) -> Result<String, AdapterError> {
        let reply = self
            .send(WireCommand::get("element_text", self.element_path(element, "text")))
            .await?;
        Ok(reply.as_str().unwrap_or_default().to_string())
    }

    async fn switch_to_frame(&self, target: &FrameTarget) -> Result<(), AdapterError> {
        self.send(WireCommand::post(
            "switch_to_frame",
            self.path("frame"),
            target.to_params(),
        ))
        .await
        .map(|_| ())
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value, AdapterError> {
        self.send(WireCommand::post(
            "execute_script",
            self.path("execute/sync"),
            json!({ "script": script, "args": args }),
        ))
        .await
    }

    async fn current_url(&self) -> Result<String, AdapterError> {
        let reply = self.send(WireCommand::get("current_url", self.path("url"))).await?;
        Ok(reply.as_str().unwrap_or_default().to_string())
    }

    async fn maximize_window(&self) -> Result<(), AdapterError> {
        self.send(WireCommand::post(
            "maximize_window",
            self.path("window/maximize"),
            json!({}),
        ))
        .await
        .map(|_| ())
    }

    async fn quit(&self) -> Result<(), AdapterError> {
        info!(session = %self.session, "closing webdriver session");
        self.send(WireCommand::delete(
            "delete_session",
            format!("session/{}", self.session),
        ))
        .await
        .map(|_| ())
    }
}
