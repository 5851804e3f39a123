//! Layered configuration
//!
//! Sources, later ones winning: built-in defaults, one configuration file, `PILOT__*`
//! environment variables. Command-line flags are applied on top by the CLI.

use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};
use action_flow::{SiteProfile, TimingProfile};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wd_adapter::WebDriverConfig;

use crate::errors::PilotError;

const ENV_PREFIX: &str = "PILOT";
const LOCAL_CONFIG_STEM: &str = "config/pilot";
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// How the operator authenticates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LoginChoice {
    /// Fill the login form from EMAIL / PASSWORD
    Auto,
    /// Log in by hand in the browser window
    Manual,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Unset means ask at startup
    pub login_mode: Option<LoginChoice>,
    pub max_items: Option<usize>,
    /// Unset means ask when the run ends
    pub close_browser: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    pub webdriver: WebDriverConfig,
    pub site: SiteProfile,
    pub timing: TimingProfile,
    pub run: RunSettings,
}

pub struct LoadedConfig {
    pub config: PilotConfig,
    /// File that contributed, if any
    pub path: Option<PathBuf>,
}

impl PilotConfig {
    /// Loads configuration from `explicit` (which must exist) or from the first file
    /// found among `config/pilot.*` and the user configuration directory.
    pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig, PilotError> {
        let path = match explicit {
            Some(path) if path.exists() => Some(path.to_path_buf()),
            Some(path) => return Err(PilotError::ConfigMissing(path.to_path_buf())),
            None => discover_config_file(),
        };
        let config = Self::from_sources(path.as_deref())?;

        match &path {
            Some(path) => info!(path = %path.display(), "Loaded configuration"),
            None => debug!("No configuration file found, using defaults"),
        }
        Ok(LoadedConfig { config, path })
    }

    fn from_sources(path: Option<&Path>) -> Result<Self, PilotError> {
        let defaults = Config::try_from(&PilotConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Serializable view for display; never carries credentials.
    pub fn to_yaml(&self) -> Result<String, PilotError> {
        serde_yaml::to_string(self).map_err(|err| PilotError::Render(err.to_string()))
    }
}

/// `config/pilot.{toml,yaml,yml,json}` first, then the user configuration directory.
pub fn discover_config_file() -> Option<PathBuf> {
    let mut stems = vec![PathBuf::from(LOCAL_CONFIG_STEM)];
    if let Some(mut dir) = dirs::config_dir() {
        dir.push("assignment-pilot");
        dir.push("config");
        stems.push(dir);
    }

    stems.into_iter().find_map(|stem| {
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| stem.with_extension(ext))
            .find(|candidate| candidate.is_file())
    })
}
