use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::info;

use crate::cli::context::CliContext;
use crate::config::{discover_config_file, PilotConfig};

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Print which configuration file is in use
    Path,

    /// Check that a configuration file parses
    Validate {
        /// File to check; defaults to the discovered file
        file: Option<std::path::PathBuf>,
    },
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            print!("{}", ctx.config().to_yaml()?);
        }
        ConfigAction::Path => match ctx.config_path() {
            Some(path) => println!("{}", path.display()),
            None => println!("(none, using built-in defaults)"),
        },
        ConfigAction::Validate { file } => {
            let path = file
                .or_else(discover_config_file)
                .context("No configuration file to validate")?;
            PilotConfig::load(Some(&path))
                .with_context(|| format!("{} is not valid", path.display()))?;
            info!(path = %path.display(), "Configuration validated");
            println!("{} is valid", path.display());
        }
    }
    Ok(())
}
