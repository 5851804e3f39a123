//! Bootstrap errors for the CLI

use std::path::PathBuf;

use thiserror::Error;
use wd_adapter::AdapterError;

/// Failures before a run starts: configuration, driver discovery, session setup,
/// operator prompts
#[derive(Debug, Error)]
pub enum PilotError {
    #[error("configuration file not found: {}", .0.display())]
    ConfigMissing(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("no {0} driver found on PATH; install it or set PILOT_WEBDRIVER")]
    DriverNotFound(&'static str),

    #[error("webdriver error: {0}")]
    Driver(#[from] AdapterError),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("render failed: {0}")]
    Render(String),
}

impl From<dialoguer::Error> for PilotError {
    fn from(err: dialoguer::Error) -> Self {
        PilotError::Prompt(err.to_string())
    }
}
