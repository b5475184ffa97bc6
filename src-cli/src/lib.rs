//! Licensure command-line shell
//!
//! This is the thin shell that parses arguments, opens the license store and
//! dispatches commands. Crawling and storage live in the `crates/` directory.

pub mod commands;
pub mod state;

use anyhow::Context;
use clap::{Parser, Subcommand};
use licensure_core::{AppConfig, SourceId};
use serde::Serialize;
use state::AppState;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// Collect professional-license records from government registries.
#[derive(Parser, Debug)]
#[command(name = "licensure", version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Crawl one registry and store its records
    Crawl {
        /// Registry to crawl (penn, florida)
        source: SourceId,
    },
    /// Print one page of stored records as JSON
    Search {
        /// Only names starting with this text (case-insensitive)
        #[arg(long)]
        prefix: Option<String>,

        /// Return records with an id greater than this
        #[arg(long, default_value_t = 0)]
        cursor: i64,
    },
}

/// Initialize tracing subscriber for logging.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,licensure=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Run a parsed command line.
///
/// A crawl that stopped early or left records unwritten exits with a
/// failure status after printing its summary.
pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    info!("Starting Licensure v{}", env!("CARGO_PKG_VERSION"));

    let config =
        AppConfig::load_with_env(cli.config.as_deref()).context("failed to load configuration")?;
    let state = AppState::open(config).await?;

    let code = match cli.command {
        Command::Crawl { source } => {
            let summary = commands::crawl::crawl(&state, source).await?;
            print_json(&summary)?;
            if summary.complete {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::Search { prefix, cursor } => {
            let page = commands::search::search(&state, prefix.as_deref(), cursor).await?;
            print_json(&page)?;
            ExitCode::SUCCESS
        }
    };

    state.close().await;
    Ok(code)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crawl() {
        let cli = Cli::try_parse_from(["licensure", "crawl", "florida"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Crawl {
                source: SourceId::Florida
            }
        );
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_parse_unknown_source() {
        assert!(Cli::try_parse_from(["licensure", "crawl", "texas"]).is_err());
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from([
            "licensure",
            "search",
            "--prefix",
            "smi",
            "--cursor",
            "50",
            "--config",
            "/etc/licensure.toml",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Command::Search {
                prefix: Some("smi".to_string()),
                cursor: 50
            }
        );
        assert_eq!(cli.config, Some(PathBuf::from("/etc/licensure.toml")));
    }

    #[test]
    fn test_search_defaults() {
        let cli = Cli::try_parse_from(["licensure", "search"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Search {
                prefix: None,
                cursor: 0
            }
        );
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
