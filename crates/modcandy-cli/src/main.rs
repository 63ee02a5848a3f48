//! Modcandy CLI - a command-line dashboard for the Modcandy moderation
//! platform.
//!
//! Staff log in once, and the session token is kept between runs. Each
//! subcommand opens one dashboard view (incidents, message log, player
//! statistics, settings) and prints its data as JSON.

mod app;
mod cli;

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use cli::Cli;

/// Log file prefix inside the data directory
const LOG_FILE_PREFIX: &str = "modcandy.log";

/// Initialize the tracing subscriber for logging.
///
/// Warnings and above go to stderr; the same events are written to a daily
/// log file when the data directory is available. The returned guard must be
/// held until exit so buffered lines are flushed.
fn init_tracing(log_dir: Option<std::path::PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut app = App::new(cli.base_url.as_deref())?;
    let _log_guard = init_tracing(app.log_dir());
    info!("Modcandy CLI starting");

    let result = app.run(cli.command).await;

    info!("Modcandy CLI shutting down");
    result
}
