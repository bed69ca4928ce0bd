use clap::Parser;
use telemetry::TelemetrySubscriber;

mod cli;
pub mod result;

pub use crate::cli::*;
pub mod commands;

/// Parses the process arguments and runs the selected command. Responses go
/// to stdout, logs to stderr.
pub async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    TelemetrySubscriber::init(std::io::stderr, args.debug)?;

    commands::exec(args).await?;

    Ok(())
}
