//! Browser session lifecycle
//!
//! Resolves the driver (attach to an endpoint, or spawn a local executable), opens a
//! WebDriver session with the configured capabilities and tears everything down again.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use wd_adapter::process::wait_until_ready;
use wd_adapter::{
    detect_driver_executable, DriverProcess, HttpTransport, WdTransport, WebDriver,
    WebDriverAdapter, WebDriverConfig,
};

use crate::errors::PilotError;

pub struct BrowserSession {
    driver: Arc<WebDriverAdapter>,
    process: Option<DriverProcess>,
}

impl BrowserSession {
    pub async fn open(cfg: &WebDriverConfig) -> Result<Self, PilotError> {
        let (endpoint, process) = match &cfg.endpoint {
            Some(endpoint) => {
                info!(%endpoint, "Attaching to running webdriver");
                (endpoint.clone(), None)
            }
            None => {
                let executable = match &cfg.driver_path {
                    Some(path) => path.clone(),
                    None => detect_driver_executable(cfg.browser)
                        .ok_or(PilotError::DriverNotFound(cfg.browser.as_str()))?,
                };
                let process = DriverProcess::spawn(&executable, cfg.port)?;
                (process.endpoint().to_string(), Some(process))
            }
        };

        let transport = Arc::new(HttpTransport::new(
            &endpoint,
            Duration::from_millis(cfg.request_timeout_ms),
        )?);
        wait_until_ready(
            transport.as_ref() as &dyn WdTransport,
            Duration::from_millis(cfg.startup_timeout_ms),
        )
        .await?;

        let driver = WebDriverAdapter::connect(transport, cfg.capabilities()).await?;
        info!(session = %driver.session_id().0, browser = cfg.browser.as_str(), "Browser session opened");

        if cfg.start_maximized && !cfg.headless {
            if let Err(err) = driver.maximize_window().await {
                warn!(error = %err, "Could not maximize browser window");
            }
        }

        Ok(Self {
            driver: Arc::new(driver),
            process,
        })
    }

    pub fn driver(&self) -> Arc<dyn WebDriver> {
        self.driver.clone()
    }

    pub async fn navigate(&self, url: &str) -> Result<(), PilotError> {
        info!(%url, "Opening target page");
        self.driver.navigate(url).await?;
        Ok(())
    }

    /// Ends the session and stops a spawned driver.
    pub async fn close(self) {
        if let Err(err) = self.driver.quit().await {
            warn!(error = %err, "Failed to end browser session");
        }
        if let Some(process) = self.process {
            process.shutdown().await;
        }
        info!("Browser closed");
    }

    /// Leaves the browser window open for the operator.
    pub fn keep_open(self) {
        if let Some(process) = self.process {
            process.leave_running();
        }
        info!("Browser left open; close it manually");
    }
}
