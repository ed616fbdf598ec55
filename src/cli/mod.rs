//! cli
//!
//! Command-line interface layer for keelson.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! handlers that drive [`crate::engine::Client`] on a tokio runtime.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a log filter directive.
pub const LOG_ENV: &str = "KEELSON_LOG";

/// Settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Explicit config file
    pub config: Option<PathBuf>,
    /// Debug logging enabled
    pub debug: bool,
    /// Minimal output
    pub quiet: bool,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.debug, cli.quiet);

    let ctx = Context {
        config: cli.config.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}

/// Send log events to stderr.
///
/// `KEELSON_LOG` (or `RUST_LOG`) wins; otherwise `--debug` selects debug
/// and `--quiet` errors only.
fn init_logging(debug: bool, quiet: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| {
            if debug {
                EnvFilter::new("debug")
            } else if quiet {
                EnvFilter::new("error")
            } else {
                EnvFilter::new("warn")
            }
        });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
