//! In-memory [`WebDriver`] used when no real browser is attached.
//!
//! The stub models a tree of documents keyed by frame path (`""` for the top document,
//! `"outer/inner"` for nested frames). Elements may appear after a delay measured on the
//! tokio clock, so tests running with a paused clock stay deterministic. A scheduled
//! teardown simulates the driven page discarding the nested contexts while the session
//! has focus inside them.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::Instant;

use crate::adapter::WebDriver;
use crate::commands::{FrameTarget, Locator};
use crate::error::{AdapterError, AdapterErrorKind};
use crate::ids::ElementRef;

/// Observable side effects recorded by the stub.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StubEvent {
    Navigate(String),
    Click(ElementRef),
    ScriptClick(ElementRef),
    ScrollIntoView(ElementRef),
    Clear(ElementRef),
    Type(ElementRef, String),
    EnterFrame(String),
    ExitToTop,
    Quit,
}

#[derive(Clone, Debug)]
struct StubNode {
    element: ElementRef,
    doc: String,
    parent: Option<ElementRef>,
    locator: Locator,
    text: String,
    frame: Option<String>,
    appears_after: Duration,
    removed: bool,
}

#[derive(Debug)]
struct StubState {
    nodes: Vec<StubNode>,
    current: Vec<String>,
    url: String,
    ready_state: String,
    teardown_at: Option<Duration>,
    torn_down: bool,
    rejects_native_click: HashSet<ElementRef>,
    url_after_click: HashMap<ElementRef, String>,
    values: HashMap<ElementRef, String>,
    events: Vec<StubEvent>,
    next_id: u64,
}

pub struct StubDriver {
    origin: Instant,
    state: Mutex<StubState>,
}

impl Default for StubDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn doc_key(path: &[&str]) -> String {
    path.join("/")
}

impl StubDriver {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(StubState {
                nodes: Vec::new(),
                current: Vec::new(),
                url: "about:blank".to_string(),
                ready_state: "complete".to_string(),
                teardown_at: None,
                torn_down: false,
                rejects_native_click: HashSet::new(),
                url_after_click: HashMap::new(),
                values: HashMap::new(),
                events: Vec::new(),
                next_id: 0,
            }),
        }
    }

    fn insert(
        &self,
        doc: String,
        parent: Option<ElementRef>,
        locator: Locator,
        text: &str,
        frame: Option<String>,
    ) -> ElementRef {
        let mut state = self.state.lock();
        state.next_id += 1;
        let element = ElementRef::new(format!("stub-{}", state.next_id));
        state.nodes.push(StubNode {
            element: element.clone(),
            doc,
            parent,
            locator,
            text: text.to_string(),
            frame,
            appears_after: Duration::ZERO,
            removed: false,
        });
        element
    }

    /// Adds an element to the document at `path`.
    pub fn add_element(&self, path: &[&str], locator: Locator, text: &str) -> ElementRef {
        self.insert(doc_key(path), None, locator, text, None)
    }

    /// Adds an `<iframe id=frame_id>` to the document at `path`; its own document is
    /// `path + [frame_id]`.
    pub fn add_frame(&self, path: &[&str], frame_id: &str) -> ElementRef {
        self.insert(
            doc_key(path),
            None,
            Locator::id(frame_id),
            "",
            Some(frame_id.to_string()),
        )
    }

    /// Adds an element found only beneath `parent`.
    pub fn add_child(&self, parent: &ElementRef, locator: Locator, text: &str) -> ElementRef {
        let doc = {
            let state = self.state.lock();
            state
                .nodes
                .iter()
                .find(|node| &node.element == parent)
                .map(|node| node.doc.clone())
                .unwrap_or_default()
        };
        self.insert(doc, Some(parent.clone()), locator, text, None)
    }

    /// Keeps `element` invisible until `delay` has elapsed on the tokio clock.
    pub fn appear_after(&self, element: &ElementRef, delay: Duration) {
        let mut state = self.state.lock();
        if let Some(node) = state.nodes.iter_mut().find(|node| &node.element == element) {
            node.appears_after = delay;
        }
    }

    pub fn remove(&self, element: &ElementRef) {
        let mut state = self.state.lock();
        if let Some(node) = state.nodes.iter_mut().find(|node| &node.element == element) {
            node.removed = true;
        }
    }

    /// After `delay`, every nested context in focus is discarded until the session
    /// switches back to the top document.
    pub fn teardown_context_after(&self, delay: Duration) {
        self.state.lock().teardown_at = Some(delay);
    }

    pub fn set_url(&self, url: &str) {
        self.state.lock().url = url.to_string();
    }

    pub fn set_url_after_click(&self, element: &ElementRef, url: &str) {
        self.state
            .lock()
            .url_after_click
            .insert(element.clone(), url.to_string());
    }

    pub fn set_ready_state(&self, ready_state: &str) {
        self.state.lock().ready_state = ready_state.to_string();
    }

    /// Native clicks on `element` fail as if an overlay intercepted them.
    pub fn reject_native_click(&self, element: &ElementRef) {
        self.state.lock().rejects_native_click.insert(element.clone());
    }

    pub fn events(&self) -> Vec<StubEvent> {
        self.state.lock().events.clone()
    }

    /// Elements clicked natively or via script, in order.
    pub fn clicks(&self) -> Vec<ElementRef> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|event| match event {
                StubEvent::Click(element) | StubEvent::ScriptClick(element) => {
                    Some(element.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub fn was_clicked(&self, element: &ElementRef) -> bool {
        self.clicks().contains(element)
    }

    pub fn current_frames(&self) -> Vec<String> {
        self.state.lock().current.clone()
    }

    pub fn value_of(&self, element: &ElementRef) -> Option<String> {
        self.state.lock().values.get(element).cloned()
    }

    fn elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.origin)
    }
}

impl StubState {
    fn apply_teardown(&mut self, elapsed: Duration) {
        if let Some(at) = self.teardown_at {
            if elapsed >= at {
                self.teardown_at = None;
                self.torn_down = true;
            }
        }
    }

    fn ensure_context(&mut self, elapsed: Duration) -> Result<(), AdapterError> {
        self.apply_teardown(elapsed);
        if self.torn_down && !self.current.is_empty() {
            return Err(AdapterError::new(AdapterErrorKind::NoSuchFrame)
                .with_hint("browsing context has been discarded"));
        }
        Ok(())
    }

    fn current_doc(&self) -> String {
        self.current.join("/")
    }

    fn visible(&self, node: &StubNode, elapsed: Duration) -> bool {
        !node.removed && elapsed >= node.appears_after && node.doc == self.current_doc()
    }

    fn resolve(&self, element: &ElementRef, elapsed: Duration) -> Result<&StubNode, AdapterError> {
        let node = self
            .nodes
            .iter()
            .find(|node| &node.element == element)
            .ok_or_else(|| {
                AdapterError::new(AdapterErrorKind::NoSuchElement)
                    .with_hint(format!("unknown element {element}"))
            })?;
        if !self.visible(node, elapsed) {
            return Err(AdapterError::new(AdapterErrorKind::StaleElement)
                .with_hint(format!("element {element} is not attached to the current context")));
        }
        Ok(node)
    }
}

#[async_trait]
impl WebDriver for StubDriver {
    async fn navigate(&self, url: &str) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        state.url = url.to_string();
        state.current.clear();
        state.events.push(StubEvent::Navigate(url.to_string()));
        Ok(())
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementRef>, AdapterError> {
        let elapsed = self.elapsed();
        let mut state = self.state.lock();
        state.ensure_context(elapsed)?;
        Ok(state
            .nodes
            .iter()
            .filter(|node| {
                node.parent.is_none() && &node.locator == locator && state.visible(node, elapsed)
            })
            .map(|node| node.element.clone())
            .collect())
    }

    async fn find_elements_from(
        &self,
        parent: &ElementRef,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>, AdapterError> {
        let elapsed = self.elapsed();
        let mut state = self.state.lock();
        state.ensure_context(elapsed)?;
        state.resolve(parent, elapsed)?;
        Ok(state
            .nodes
            .iter()
            .filter(|node| {
                node.parent.as_ref() == Some(parent)
                    && &node.locator == locator
                    && state.visible(node, elapsed)
            })
            .map(|node| node.element.clone())
            .collect())
    }

    async fn click(&self, element: &ElementRef) -> Result<(), AdapterError> {
        let elapsed = self.elapsed();
        let mut state = self.state.lock();
        state.ensure_context(elapsed)?;
        state.resolve(element, elapsed)?;
        if state.rejects_native_click.contains(element) {
            return Err(AdapterError::new(AdapterErrorKind::ClickIntercepted)
                .with_hint(format!("element {element} is obscured")));
        }
        state.events.push(StubEvent::Click(element.clone()));
        if let Some(url) = state.url_after_click.get(element).cloned() {
            state.url = url;
        }
        Ok(())
    }

    async fn clear(&self, element: &ElementRef) -> Result<(), AdapterError> {
        let elapsed = self.elapsed();
        let mut state = self.state.lock();
        state.ensure_context(elapsed)?;
        state.resolve(element, elapsed)?;
        state.values.insert(element.clone(), String::new());
        state.events.push(StubEvent::Clear(element.clone()));
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), AdapterError> {
        let elapsed = self.elapsed();
        let mut state = self.state.lock();
        state.ensure_context(elapsed)?;
        state.resolve(element, elapsed)?;
        state
            .values
            .entry(element.clone())
            .or_default()
            .push_str(text);
        state
            .events
            .push(StubEvent::Type(element.clone(), text.to_string()));
        Ok(())
    }

    async fn element_text(&self, element: &ElementRef) -> Result<String, AdapterError> {
        let elapsed = self.elapsed();
        let mut state = self.state.lock();
        state.ensure_context(elapsed)?;
        Ok(state.resolve(element, elapsed)?.text.clone())
    }

    async fn switch_to_frame(&self, target: &FrameTarget) -> Result<(), AdapterError> {
        let elapsed = self.elapsed();
        let mut state = self.state.lock();
        match target {
            FrameTarget::Top => {
                state.apply_teardown(elapsed);
                state.torn_down = false;
                state.current.clear();
                state.events.push(StubEvent::ExitToTop);
                Ok(())
            }
            FrameTarget::Element(element) => {
                state.ensure_context(elapsed)?;
                let frame = state.resolve(element, elapsed)?.frame.clone().ok_or_else(|| {
                    AdapterError::new(AdapterErrorKind::NoSuchFrame)
                        .with_hint(format!("element {element} is not a frame"))
                })?;
                state.current.push(frame.clone());
                state.events.push(StubEvent::EnterFrame(frame));
                Ok(())
            }
        }
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value, AdapterError> {
        let elapsed = self.elapsed();
        let mut state = self.state.lock();
        state.ensure_context(elapsed)?;
        if script.contains("document.readyState") {
            return Ok(Value::String(state.ready_state.clone()));
        }

        let Some(element) = args.first().and_then(ElementRef::from_wire) else {
            return Ok(Value::Null);
        };
        state.resolve(&element, elapsed)?;
        if script.contains(".click()") {
            state.events.push(StubEvent::ScriptClick(element.clone()));
            if let Some(url) = state.url_after_click.get(&element).cloned() {
                state.url = url;
            }
        } else if script.contains("scrollIntoView") {
            state.events.push(StubEvent::ScrollIntoView(element));
        }
        Ok(Value::Null)
    }

    async fn current_url(&self) -> Result<String, AdapterError> {
        Ok(self.state.lock().url.clone())
    }

    async fn maximize_window(&self) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn quit(&self) -> Result<(), AdapterError> {
        self.state.lock().events.push(StubEvent::Quit);
        Ok(())
    }
}
