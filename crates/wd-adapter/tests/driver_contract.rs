//! Contract tests against a real browser driver. Ignored by default because they need
//! `msedgedriver`/`chromedriver` on the host.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use wd_adapter::process::wait_until_ready;
use wd_adapter::{
    detect_driver_executable, BrowserKind, DriverProcess, HttpTransport, Locator, WebDriver,
    WebDriverAdapter, WebDriverConfig,
};

fn contract_enabled() -> bool {
    env::var("PILOT_WEBDRIVER_CONTRACT")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[tokio::test]
#[ignore = "requires a browser driver; set PILOT_WEBDRIVER_CONTRACT=1"]
async fn contract_navigate_and_query() {
    if !contract_enabled() {
        eprintln!("skipping webdriver contract test (PILOT_WEBDRIVER_CONTRACT not enabled)");
        return;
    }

    let cfg = WebDriverConfig {
        browser: BrowserKind::Chrome,
        headless: true,
        port: 9631,
        ..WebDriverConfig::default()
    };
    let executable = detect_driver_executable(cfg.browser).expect("driver on PATH");
    let process = DriverProcess::spawn(&executable, cfg.port).expect("spawn driver");
    let transport = Arc::new(
        HttpTransport::new(process.endpoint(), Duration::from_secs(30)).expect("transport"),
    );
    wait_until_ready(transport.as_ref(), Duration::from_secs(20))
        .await
        .expect("driver ready");

    let driver = WebDriverAdapter::connect(transport, cfg.capabilities())
        .await
        .expect("session");
    driver
        .navigate("data:text/html,<h3 id='title'>hello</h3>")
        .await
        .expect("navigate");
    let found = driver
        .find_elements(&Locator::id("title"))
        .await
        .expect("query");
    assert_eq!(driver.element_text(&found[0]).await.expect("text"), "hello");
    assert_eq!(
        driver.document_ready_state().await.expect("ready state"),
        "complete"
    );

    driver.quit().await.expect("quit");
    process.shutdown().await;
}
