//! ---
//! claw_section: "05-operator-interfaces"
//! claw_subsection: "binary"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Operator CLI for the Claw control plane."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use claw_common::config::{AppConfig, LoggingConfig};
use claw_common::logging::{init_tracing, LogTarget};
use tracing::{debug, info};

mod render;
mod simulate;

const DEFAULT_CONFIG_CANDIDATES: &[&str] = &["configs/claw.toml", "/etc/claw/claw.toml"];

#[derive(Debug, Parser)]
#[command(author, version, about = "Claw control plane operator utility", long_about = None)]
struct Cli {
    /// Configuration file; falls back to CLAW_CONFIG, then the default locations.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "List instance types with an adapter and the image fallback table")]
    Types,
    #[command(about = "Render the configuration document for an instance type")]
    Render(render::RenderCommand),
    #[command(about = "Resolve the container image for an instance type")]
    Image(render::ImageCommand),
    #[command(about = "Run an instance lifecycle against an in-memory cluster")]
    Simulate(simulate::SimulateCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_tracing("clawctl", &cli_logging(&config))?;
    info!(command = ?cli.command, "clawctl starting");

    match cli.command {
        Commands::Types => render::list_types(&config),
        Commands::Render(cmd) => cmd.execute(),
        Commands::Image(cmd) => cmd.execute(&config),
        Commands::Simulate(cmd) => cmd.execute(config).await,
    }
}

/// Explicit path, then `CLAW_CONFIG`, then the default locations, then defaults.
fn load_config(explicit: Option<&PathBuf>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return AppConfig::from_path(path);
    }
    match AppConfig::locate(DEFAULT_CONFIG_CANDIDATES) {
        Some(source) => {
            debug!(source = ?source, "configuration located");
            AppConfig::from_path(source.path())
        }
        None => Ok(AppConfig::default()),
    }
}

/// Diagnostics go to stderr so command output on stdout stays parseable.
fn cli_logging(config: &AppConfig) -> LoggingConfig {
    LoggingConfig {
        target: LogTarget::Stderr,
        ..config.logging.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_never_share_stdout_with_output() {
        let mut config = AppConfig::default();
        config.logging.target = LogTarget::Stdout;
        let logging = cli_logging(&config);
        assert_eq!(logging.target, LogTarget::Stderr);
        assert_eq!(logging.format, config.logging.format);
        assert_eq!(logging.level, config.logging.level);
    }

    #[test]
    fn render_arguments_parse() {
        let cli = Cli::try_parse_from(["clawctl", "render", "--type", "OpenClaw"]).unwrap();
        assert!(matches!(cli.command, Commands::Render(_)));
    }
}
