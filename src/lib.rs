//! assignment-pilot: walks an operator's assignment list in a nested-frame web app
//! through a WebDriver session.
//!
//! The heavy lifting lives in the workspace crates (`wd-adapter`, `action-primitives`,
//! `action-flow`); this package wires configuration, logging, the browser session and
//! the operator prompts into a CLI.

pub mod cli;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod session;

pub use config::{LoadedConfig, LoginChoice, PilotConfig, RunSettings};
pub use errors::PilotError;
pub use session::BrowserSession;
