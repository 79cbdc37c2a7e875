//! `basis-arb`: cross-venue cryptocurrency arbitrage engine.
//!
//! Usage:
//!
//! ```text
//! basis-arb --config basis.toml
//! ```
//!
//! Credentials come from the environment variables named in the config.
//! Any non-empty line on stdin (or Ctrl-C) requests a graceful shutdown.

use basis_arb_strategy::{engine, Config};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "basis-arb", about = "Cross-venue cryptocurrency arbitrage engine")]
struct Args {
    /// Configuration file.
    #[arg(long, default_value = "basis.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("basis-arb: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = init_logging(config.engine.log_file.as_deref());
    info!(config = %args.config.display(), "starting new run");
    println!("Running...");

    match engine::run(config).await {
        Ok(()) => {
            println!("done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(%e, "fatal");
            eprintln!("basis-arb: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Line-oriented, append-only logging: to a file when configured, otherwise
/// to stdout. The returned guard must live for the whole run.
fn init_logging(log_file: Option<&Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = path.file_name().unwrap_or_else(|| "basis-arb.log".as_ref());
            let appender = tracing_appender::rolling::never(
                directory.unwrap_or_else(|| Path::new(".")),
                file_name,
            );
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}
