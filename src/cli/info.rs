use anyhow::Result;
use wd_adapter::{detect_driver_executable, metrics as wd_metrics};

use super::context::CliContext;

pub async fn cmd_info(ctx: &CliContext) -> Result<()> {
    let config = ctx.config();
    let webdriver = &config.webdriver;

    println!("assignment-pilot {}", env!("CARGO_PKG_VERSION"));
    println!(
        "Build: {} ({}, {})",
        env!("BUILD_DATE"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE")
    );
    println!();

    match ctx.config_path() {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none, using built-in defaults)"),
    }
    println!("Target page: {}", config.site.target_url);
    println!("Browser:     {}", webdriver.browser.as_str());
    match (&webdriver.endpoint, &webdriver.driver_path) {
        (Some(endpoint), _) => println!("Driver:      attach to {}", endpoint),
        (None, Some(path)) => println!("Driver:      {} (configured)", path.display()),
        (None, None) => match detect_driver_executable(webdriver.browser) {
            Some(path) => println!("Driver:      {} (detected)", path.display()),
            None => println!(
                "Driver:      not found (looked for {})",
                webdriver.browser.driver_names().join(", ")
            ),
        },
    }
    println!();

    println!("Metrics served on /metrics by `assignment-pilot --metrics-port N run`:");
    for name in wd_metrics::METRIC_NAMES {
        println!("  {}", name);
    }
    Ok(())
}
