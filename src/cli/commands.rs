use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::config::ConfigArgs;
use crate::config::{LoginChoice, PilotConfig};
use wd_adapter::BrowserKind;

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Log in and work through the assignment list
    Run(RunArgs),

    /// Inspect the effective configuration
    Config(ConfigArgs),

    /// Show build, driver and metrics information
    Info,
}

#[derive(Args, Clone, Debug, Default)]
pub struct RunArgs {
    /// Login mode; asked interactively when neither this nor the configuration sets it
    #[arg(long, value_enum)]
    pub login: Option<LoginChoice>,

    /// Stop after this many assignments
    #[arg(long, value_name = "N")]
    pub max_items: Option<usize>,

    /// Page opened before login
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Browser to drive
    #[arg(long, value_parser = parse_browser)]
    pub browser: Option<BrowserKind>,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Driver executable (msedgedriver, chromedriver, geckodriver)
    #[arg(long, value_name = "PATH")]
    pub driver: Option<PathBuf>,

    /// Attach to an already running WebDriver endpoint instead of spawning a driver
    #[arg(long, value_name = "URL", conflicts_with = "driver")]
    pub endpoint: Option<String>,

    /// Close the browser when the run ends without asking
    #[arg(long, conflicts_with = "keep_open")]
    pub close: bool,

    /// Leave the browser open when the run ends without asking
    #[arg(long)]
    pub keep_open: bool,
}

impl RunArgs {
    /// Applies command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut PilotConfig) {
        if let Some(login) = self.login {
            config.run.login_mode = Some(login);
        }
        if self.max_items.is_some() {
            config.run.max_items = self.max_items;
        }
        if let Some(url) = &self.url {
            config.site.target_url = url.clone();
        }
        if let Some(browser) = self.browser {
            config.webdriver.browser = browser;
        }
        if self.headless {
            config.webdriver.headless = true;
        }
        if let Some(driver) = &self.driver {
            config.webdriver.driver_path = Some(driver.clone());
        }
        if let Some(endpoint) = &self.endpoint {
            config.webdriver.endpoint = Some(endpoint.clone());
        }
        if self.close {
            config.run.close_browser = Some(true);
        } else if self.keep_open {
            config.run.close_browser = Some(false);
        }
    }
}

fn parse_browser(raw: &str) -> Result<BrowserKind, String> {
    match raw.to_ascii_lowercase().as_str() {
        "edge" | "msedge" => Ok(BrowserKind::Edge),
        "chrome" | "chromium" => Ok(BrowserKind::Chrome),
        "firefox" => Ok(BrowserKind::Firefox),
        other => Err(format!("unsupported browser '{other}' (edge, chrome, firefox)")),
    }
}
