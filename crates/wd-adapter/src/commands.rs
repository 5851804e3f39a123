//! Command and parameter types exposed by the WebDriver adapter interface.

use crate::ids::ElementRef;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Element location strategy.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum By {
    Css,
    #[serde(rename = "xpath")]
    XPath,
    Id,
    TagName,
    LinkText,
}

impl By {
    fn as_str(&self) -> &'static str {
        match self {
            By::Css => "css",
            By::XPath => "xpath",
            By::Id => "id",
            By::TagName => "tag",
            By::LinkText => "link",
        }
    }
}

/// Strategy plus expression identifying one or more elements in the current context.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub by: By,
    pub value: String,
}

impl Locator {
    pub fn new(by: By, value: impl Into<String>) -> Self {
        Self {
            by,
            value: value.into(),
        }
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(By::Css, value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(By::XPath, value)
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(By::Id, value)
    }

    pub fn tag(value: impl Into<String>) -> Self {
        Self::new(By::TagName, value)
    }

    /// `(using, value)` pair as sent to the driver. WebDriver has no id strategy,
    /// so ids travel as an attribute selector.
    pub fn wire(&self) -> (&'static str, String) {
        match self.by {
            By::Css => ("css selector", self.value.clone()),
            By::XPath => ("xpath", self.value.clone()),
            By::Id => (
                "css selector",
                format!("[id=\"{}\"]", self.value.replace('"', "\\\"")),
            ),
            By::TagName => ("tag name", self.value.clone()),
            By::LinkText => ("link text", self.value.clone()),
        }
    }

    pub fn to_params(&self) -> Value {
        let (using, value) = self.wire();
        json!({ "using": using, "value": value })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.by.as_str(), self.value)
    }
}

/// Destination of a frame switch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FrameTarget {
    /// The top-level document.
    Top,
    /// The nested context owned by an `<iframe>`/`<frame>` element.
    Element(ElementRef),
}

impl FrameTarget {
    pub fn to_params(&self) -> Value {
        match self {
            FrameTarget::Top => json!({ "id": Value::Null }),
            FrameTarget::Element(element) => json!({ "id": element.to_wire() }),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WireMethod {
    Get,
    Post,
    Delete,
}

/// One HTTP round trip against the driver.
#[derive(Clone, Debug)]
pub struct WireCommand {
    /// Stable label used for logging and metrics.
    pub name: &'static str,
    pub method: WireMethod,
    pub path: String,
    pub body: Option<Value>,
}

impl WireCommand {
    pub fn get(name: &'static str, path: impl Into<String>) -> Self {
        Self {
            name,
            method: WireMethod::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(name: &'static str, path: impl Into<String>, body: Value) -> Self {
        Self {
            name,
            method: WireMethod::Post,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn delete(name: &'static str, path: impl Into<String>) -> Self {
        Self {
            name,
            method: WireMethod::Delete,
            path: path.into(),
            body: None,
        }
    }
}

/// Scripts evaluated in the current browsing context.
pub mod scripts {
    pub const READY_STATE: &str = "return document.readyState;";
    pub const SCROLL_INTO_VIEW: &str = "arguments[0].scrollIntoView(true);";
    pub const CLICK: &str = "arguments[0].click();";
}
