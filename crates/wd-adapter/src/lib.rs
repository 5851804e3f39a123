//! Assignment-pilot L0 WebDriver adapter.
//!
//! This crate speaks the W3C WebDriver protocol to a locally spawned (or already running)
//! browser driver. Higher layers only see the [`adapter::WebDriver`] trait; the HTTP
//! transport and driver process handling live behind it. The in-memory `StubDriver`
//! is compiled with the `stub` feature.

use std::{env, path::PathBuf};
use which::which;

pub mod adapter;
pub mod commands;
pub mod metrics;
pub mod process;
#[cfg(any(test, feature = "stub"))]
pub mod stub;
pub mod transport;

pub use adapter::{WebDriver, WebDriverAdapter};
pub use commands::{scripts, By, FrameTarget, Locator, WireCommand, WireMethod};
pub use config::{BrowserKind, WebDriverConfig};
pub use error::{AdapterError, AdapterErrorKind};
pub use ids::{ElementRef, FrameId, SessionId};
pub use process::DriverProcess;
#[cfg(any(test, feature = "stub"))]
pub use stub::{StubDriver, StubEvent};
pub use transport::{HttpTransport, NoopTransport, WdTransport};

pub mod ids {
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Value};
    use std::fmt;

    /// Key under which the W3C protocol serialises web element references.
    pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

    /// Opaque handle to an element owned by the remote browser.
    #[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
    pub struct ElementRef(pub String);

    impl ElementRef {
        pub fn new(id: impl Into<String>) -> Self {
            Self(id.into())
        }

        pub fn as_str(&self) -> &str {
            &self.0
        }

        /// Wire representation used in script arguments and frame switches.
        pub fn to_wire(&self) -> Value {
            json!({ ELEMENT_KEY: self.0 })
        }

        pub fn from_wire(value: &Value) -> Option<Self> {
            value
                .get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(|id| Self(id.to_string()))
        }
    }

    impl fmt::Display for ElementRef {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    /// Identifier of a WebDriver session.
    #[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
    pub struct SessionId(pub String);

    impl fmt::Display for SessionId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    /// Identifier of a nested browsing context: the `id` attribute of its `<iframe>`.
    #[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct FrameId(pub String);

    impl FrameId {
        pub fn new(id: impl Into<String>) -> Self {
            Self(id.into())
        }

        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl From<&str> for FrameId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }

    impl fmt::Display for FrameId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }
}

pub mod error {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use thiserror::Error;

    /// High-level error categories surfaced by the adapter.
    #[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
    pub enum AdapterErrorKind {
        #[error("no such element")]
        NoSuchElement,
        #[error("no such frame")]
        NoSuchFrame,
        #[error("stale element reference")]
        StaleElement,
        #[error("element click intercepted")]
        ClickIntercepted,
        #[error("element not interactable")]
        NotInteractable,
        #[error("operation timed out")]
        Timeout,
        #[error("invalid session")]
        InvalidSession,
        #[error("transport failure")]
        Transport,
        #[error("protocol error")]
        Protocol,
        #[error("internal error")]
        Internal,
    }

    impl AdapterErrorKind {
        pub const ALL: [AdapterErrorKind; 10] = [
            Self::NoSuchElement,
            Self::NoSuchFrame,
            Self::StaleElement,
            Self::ClickIntercepted,
            Self::NotInteractable,
            Self::Timeout,
            Self::InvalidSession,
            Self::Transport,
            Self::Protocol,
            Self::Internal,
        ];

        /// Position in [`AdapterErrorKind::ALL`].
        pub fn ordinal(&self) -> usize {
            *self as usize
        }

        /// Maps a W3C WebDriver error code onto an adapter category.
        pub fn from_wire_code(code: &str) -> Self {
            match code {
                "no such element" => Self::NoSuchElement,
                "no such frame" | "no such window" => Self::NoSuchFrame,
                "stale element reference" | "detached shadow root" => Self::StaleElement,
                "element click intercepted" => Self::ClickIntercepted,
                "element not interactable" | "invalid element state" => Self::NotInteractable,
                "timeout" | "script timeout" => Self::Timeout,
                "invalid session id" | "session not created" => Self::InvalidSession,
                "unknown error" | "unsupported operation" => Self::Internal,
                _ => Self::Protocol,
            }
        }

        pub fn as_str(&self) -> &'static str {
            match self {
                Self::NoSuchElement => "no_such_element",
                Self::NoSuchFrame => "no_such_frame",
                Self::StaleElement => "stale_element",
                Self::ClickIntercepted => "click_intercepted",
                Self::NotInteractable => "not_interactable",
                Self::Timeout => "timeout",
                Self::InvalidSession => "invalid_session",
                Self::Transport => "transport",
                Self::Protocol => "protocol",
                Self::Internal => "internal",
            }
        }
    }

    /// Enriched error metadata passed back to higher layers.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AdapterError {
        pub kind: AdapterErrorKind,
        pub hint: Option<String>,
        pub retriable: bool,
        pub data: Option<serde_json::Value>,
    }

    impl fmt::Display for AdapterError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.kind)?;
            if let Some(hint) = &self.hint {
                write!(f, ": {}", hint)?;
            }
            Ok(())
        }
    }

    impl std::error::Error for AdapterError {}

    impl AdapterError {
        pub fn new(kind: AdapterErrorKind) -> Self {
            Self {
                kind,
                hint: None,
                retriable: false,
                data: None,
            }
        }

        pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
            self.hint = Some(hint.into());
            self
        }

        pub fn retriable(mut self, flag: bool) -> Self {
            self.retriable = flag;
            self
        }

        pub fn with_data(mut self, data: serde_json::Value) -> Self {
            self.data = Some(data);
            self
        }

        /// Errors that a poller should treat as "not yet" rather than as a hard failure.
        ///
        /// Frames being torn down and rebuilt surface as missing frames or stale
        /// references for a short while.
        pub fn is_transient(&self) -> bool {
            self.retriable
                || matches!(
                    self.kind,
                    AdapterErrorKind::NoSuchElement
                        | AdapterErrorKind::NoSuchFrame
                        | AdapterErrorKind::StaleElement
                        | AdapterErrorKind::Timeout
                )
        }
    }
}

pub mod config {
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Value};
    use std::path::PathBuf;

    /// Browser driven through the WebDriver session.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum BrowserKind {
        #[default]
        Edge,
        Chrome,
        Firefox,
    }

    impl BrowserKind {
        pub fn as_str(&self) -> &'static str {
            match self {
                BrowserKind::Edge => "edge",
                BrowserKind::Chrome => "chrome",
                BrowserKind::Firefox => "firefox",
            }
        }

        /// Driver executables searched for on `PATH`, most specific first.
        pub fn driver_names(&self) -> &'static [&'static str] {
            #[cfg(target_os = "windows")]
            {
                match self {
                    BrowserKind::Edge => &["msedgedriver.exe"],
                    BrowserKind::Chrome => &["chromedriver.exe"],
                    BrowserKind::Firefox => &["geckodriver.exe"],
                }
            }

            #[cfg(not(target_os = "windows"))]
            {
                match self {
                    BrowserKind::Edge => &["msedgedriver"],
                    BrowserKind::Chrome => &["chromedriver", "chromium.chromedriver"],
                    BrowserKind::Firefox => &["geckodriver"],
                }
            }
        }
    }

    /// Configuration for locating the driver and opening a session.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(default)]
    pub struct WebDriverConfig {
        /// Attach to an already running driver instead of spawning one.
        pub endpoint: Option<String>,
        pub driver_path: Option<PathBuf>,
        pub port: u16,
        pub browser: BrowserKind,
        pub headless: bool,
        pub start_maximized: bool,
        pub request_timeout_ms: u64,
        pub startup_timeout_ms: u64,
    }

    impl Default for WebDriverConfig {
        fn default() -> Self {
            Self {
                endpoint: None,
                driver_path: None,
                port: 9515,
                browser: BrowserKind::default(),
                headless: false,
                start_maximized: true,
                request_timeout_ms: 60_000,
                startup_timeout_ms: 20_000,
            }
        }
    }

    impl WebDriverConfig {
        pub fn local_endpoint(&self) -> String {
            format!("http://127.0.0.1:{}/", self.port)
        }

        /// New-session payload for the configured browser.
        pub fn capabilities(&self) -> Value {
            let mut args = Vec::new();
            if self.start_maximized {
                args.push("--start-maximized");
            }

            let always_match = match self.browser {
                BrowserKind::Edge => {
                    if self.headless {
                        args.push("--headless=new");
                    }
                    json!({
                        "browserName": "MicrosoftEdge",
                        "ms:edgeOptions": { "args": args },
                    })
                }
                BrowserKind::Chrome => {
                    if self.headless {
                        args.push("--headless=new");
                    }
                    json!({
                        "browserName": "chrome",
                        "goog:chromeOptions": { "args": args },
                    })
                }
                BrowserKind::Firefox => {
                    let args: Vec<&str> = if self.headless {
                        vec!["-headless"]
                    } else {
                        Vec::new()
                    };
                    json!({
                        "browserName": "firefox",
                        "moz:firefoxOptions": { "args": args },
                    })
                }
            };

            json!({ "capabilities": { "alwaysMatch": always_match } })
        }
    }
}

/// Locates a driver executable for `browser`.
///
/// `PILOT_WEBDRIVER` wins when it points at an existing file; otherwise the
/// browser-specific driver names are looked up on `PATH`.
pub fn detect_driver_executable(browser: config::BrowserKind) -> Option<PathBuf> {
    if let Ok(raw) = env::var("PILOT_WEBDRIVER") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    browser
        .driver_names()
        .iter()
        .find_map(|name| which(name).ok())
}
