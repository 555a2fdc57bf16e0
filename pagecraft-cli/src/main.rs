//! # Pagecraft
//!
//! Command-line entry point for the page-builder engine.

use clap::Parser;
use pagecraft_cli::{run_replay, CliArgs, Command};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,pagecraft_core=debug).
/// Set `PAGECRAFT_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pagecraft_core=debug"));

    // Logs go to stderr so stdout carries only the document.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("PAGECRAFT_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    match args.command {
        Command::Replay(replay) => {
            tracing::info!("Replaying {}", replay.scenario.display());
            let json = run_replay(&replay)?;
            println!("{json}");
        }
    }
    Ok(())
}
