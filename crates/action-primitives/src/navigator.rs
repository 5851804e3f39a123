//! Frame navigation
//!
//! The navigator is the only component that moves the session's focus between
//! browsing contexts. It mirrors the session focus in an owned [`FramePath`] so callers
//! can always tell where they stand.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, warn};
use wd_adapter::{FrameId, FrameTarget, Locator};

use crate::errors::ActionError;
use crate::types::FramePath;
use crate::waiting::{OnTick, Synchronizer};

pub struct FrameNavigator {
    sync: Synchronizer,
    frame_timeout: Duration,
    path: Mutex<FramePath>,
}

impl FrameNavigator {
    /// `frame_timeout` bounds how long [`FrameNavigator::enter`] waits for a frame element.
    pub fn new(sync: Synchronizer, frame_timeout: Duration) -> Self {
        Self {
            sync,
            frame_timeout,
            path: Mutex::new(Vec::new()),
        }
    }

    pub fn synchronizer(&self) -> &Synchronizer {
        &self.sync
    }

    pub fn current_path(&self) -> FramePath {
        self.path.lock().clone()
    }

    pub fn depth(&self) -> usize {
        self.path.lock().len()
    }

    pub fn is_root(&self) -> bool {
        self.path.lock().is_empty()
    }

    /// Moves focus into the child frame `frame` of the current context.
    pub async fn enter(&self, frame: &FrameId) -> Result<(), ActionError> {
        self.enter_with_timeout(frame, self.frame_timeout).await
    }

    pub async fn enter_with_timeout(
        &self,
        frame: &FrameId,
        timeout: Duration,
    ) -> Result<(), ActionError> {
        let element = self
            .sync
            .await_element(&Locator::id(frame.as_str()), timeout)
            .await
            .map_err(|err| {
                ActionError::Navigation(format!("frame '{}' did not appear: {}", frame, err))
            })?;

        self.sync
            .driver()
            .switch_to_frame(&FrameTarget::Element(element))
            .await
            .map_err(|err| {
                ActionError::Navigation(format!("cannot enter frame '{}': {}", frame, err))
            })?;

        let mut path = self.path.lock();
        path.push(frame.clone());
        debug!(frame = %frame, depth = path.len(), "entered frame");
        Ok(())
    }

    /// Enters `parent`, then `child` inside it.
    pub async fn enter_nested(&self, parent: &FrameId, child: &FrameId) -> Result<(), ActionError> {
        self.enter(parent).await?;
        self.enter(child).await
    }

    /// Returns focus to the top document. Never fails; the logical path is cleared
    /// even when the driver rejects the switch.
    pub async fn reset_to_root(&self) {
        if let Err(err) = self.sync.driver().switch_to_frame(&FrameTarget::Top).await {
            warn!(error = %err, "switch to top document failed");
        }
        let mut path = self.path.lock();
        if !path.is_empty() {
            debug!(from_depth = path.len(), "reset to root");
        }
        path.clear();
    }

    /// Resets to the root and re-enters every frame of `path`, each bounded by the
    /// synchronizer's check window. Stops at the first frame that cannot be entered and
    /// reports whether the whole path was restored.
    pub async fn reaffiliate(&self, path: &[FrameId]) -> bool {
        self.reset_to_root().await;
        let window = self.sync.config().check_timeout;
        for frame in path {
            if let Err(err) = self.enter_with_timeout(frame, window).await {
                debug!(frame = %frame, error = %err, "re-affiliation incomplete");
                return false;
            }
        }
        true
    }

    /// Tick hook that re-affiliates to `path` between polls.
    pub fn reaffiliation(&self, path: FramePath) -> Reaffiliate<'_> {
        Reaffiliate {
            navigator: self,
            path,
        }
    }
}

/// [`OnTick`] that restores a frame path the page may have torn down
pub struct Reaffiliate<'a> {
    navigator: &'a FrameNavigator,
    path: FramePath,
}

#[async_trait]
impl OnTick for Reaffiliate<'_> {
    async fn on_tick(&self) {
        self.navigator.reaffiliate(&self.path).await;
    }
}
