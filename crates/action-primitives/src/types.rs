//! Core data types for action primitives

use serde::{Deserialize, Serialize};
use std::time::Duration;
use wd_adapter::FrameId;

/// Logical position in the nested-frame tree; empty means the top document.
pub type FramePath = Vec<FrameId>;

/// Polling cadence shared by every wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Pause between two checks of a bounded wait
    pub poll_interval: Duration,

    /// Window of each bounded wait issued by a deadline-driven wait
    pub check_timeout: Duration,

    /// Pause after an `on_tick` before the next bounded wait
    pub tick_pause: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            check_timeout: Duration::from_secs(1),
            tick_pause: Duration::from_secs(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sync_config() {
        let config = SyncConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.check_timeout, Duration::from_secs(1));
        assert_eq!(config.tick_pause, Duration::from_secs(2));
    }
}
