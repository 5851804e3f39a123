use std::sync::Arc;

use action_flow::{FlowContext, FlowError, LoginMode, RunController};
use anyhow::{Context, Result};
use tracing::{info, warn};
use wd_adapter::metrics as wd_metrics;

use super::commands::RunArgs;
use super::context::CliContext;
use super::output::{render_summary, render_traffic, OutputFormat};
use super::prompt::{confirm_close, resolve_credentials, select_login_mode, ConsoleOperator};
use crate::config::LoginChoice;
use crate::session::BrowserSession;

pub async fn cmd_run(args: RunArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let mut config = ctx.config().clone();
    args.apply(&mut config);

    let choice = match config.run.login_mode {
        Some(choice) => choice,
        None => select_login_mode().await?,
    };
    let mode = match choice {
        LoginChoice::Auto => LoginMode::Unattended(resolve_credentials().await?),
        LoginChoice::Manual => LoginMode::Attended,
    };

    let session = BrowserSession::open(&config.webdriver)
        .await
        .context("Failed to start the browser")?;

    let result = match session.navigate(&config.site.target_url).await {
        Ok(()) => {
            let flow = Arc::new(FlowContext::new(
                session.driver(),
                config.site.clone(),
                config.timing,
            ));
            RunController::new(flow)
                .with_max_items(config.run.max_items)
                .run(&mode, &ConsoleOperator)
                .await
                .map_err(anyhow::Error::from)
        }
        Err(err) => Err(anyhow::Error::from(err).context("Failed to open the target page")),
    };

    match &result {
        Ok(summary) => println!("{}", render_summary(summary, &output)?),
        Err(err) => warn!(error = %err, "Run aborted"),
    }
    let traffic = wd_metrics::snapshot();
    info!(
        commands = traffic.commands,
        transient_failures = traffic.transient_failures,
        hard_failures = traffic.hard_failures,
        "WebDriver traffic"
    );
    if matches!(output, OutputFormat::Human) {
        println!("{}", render_traffic(&traffic));
    }

    let close = match config.run.close_browser {
        Some(close) => close,
        None => confirm_close().await.unwrap_or_else(|err| {
            warn!(error = %err, "Close prompt failed, closing the browser");
            true
        }),
    };
    if close {
        session.close().await;
    } else {
        session.keep_open();
    }

    match result {
        Ok(summary) => {
            info!(
                succeeded = summary.tally.succeeded,
                failed = summary.tally.failed,
                "Run complete"
            );
            Ok(())
        }
        Err(err) if matches!(err.downcast_ref::<FlowError>(), Some(FlowError::LoginFailed(_))) => {
            Err(err.context("Login failed"))
        }
        Err(err) => Err(err),
    }
}
