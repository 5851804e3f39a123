//! Shared handles for one browser session

use action_primitives::{DefaultActionPrimitives, FrameNavigator, Synchronizer};
use std::sync::Arc;
use wd_adapter::WebDriver;

use crate::types::{SiteProfile, TimingProfile};

/// Everything the flow components need to drive one session: the frame navigator
/// (sole owner of frame focus), element primitives and the site and timing profiles.
pub struct FlowContext {
    pub navigator: FrameNavigator,
    pub primitives: DefaultActionPrimitives,
    pub site: SiteProfile,
    pub timing: TimingProfile,
}

impl FlowContext {
    pub fn new(driver: Arc<dyn WebDriver>, site: SiteProfile, timing: TimingProfile) -> Self {
        let sync = Synchronizer::new(driver, timing.sync_config());
        Self {
            navigator: FrameNavigator::new(sync.clone(), timing.element_timeout()),
            primitives: DefaultActionPrimitives::new(sync),
            site,
            timing,
        }
    }

    pub fn sync(&self) -> &Synchronizer {
        self.navigator.synchronizer()
    }

    pub fn driver(&self) -> &Arc<dyn WebDriver> {
        self.sync().driver()
    }
}
