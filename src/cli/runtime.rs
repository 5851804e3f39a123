use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging sink and verbosity resolved from the command line
#[derive(Clone, Debug, Default)]
pub struct LoggingOptions {
    pub level: String,
    pub debug: bool,
    pub json: bool,
    pub file: Option<PathBuf>,
}

impl LoggingOptions {
    fn filter(&self) -> Result<EnvFilter> {
        let level = if self.debug {
            tracing::Level::DEBUG
        } else {
            self.level.parse().context("Invalid log level")?
        };
        Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string())))
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `--log-level`. The returned
/// guard flushes the non-blocking writer and must be kept alive until exit.
pub fn init_logging(options: &LoggingOptions) -> Result<WorkerGuard> {
    let filter = options.filter()?;

    let (writer, guard) = match &options.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let name = path
                .file_name()
                .context("Log file path has no file name")?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            tracing_appender::non_blocking(appender)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };
    let ansi = options.file.is_none();

    let registry = tracing_subscriber::registry().with(filter);
    if options.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_ansi(ansi).with_writer(writer))
            .init();
    }

    Ok(guard)
}
