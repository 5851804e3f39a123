use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::PilotConfig;

pub struct CliContext {
    config: Arc<PilotConfig>,
    config_path: Option<PathBuf>,
}

impl CliContext {
    pub fn new(config: PilotConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
        }
    }

    pub fn config(&self) -> &PilotConfig {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
