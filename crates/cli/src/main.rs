//! Organization audit CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: global flags and environment variables are
//!    parsed with `clap` and validated into a [`config::CliConfig`].
//! 2. **Wire observability**: configure `tracing-subscriber` with a JSON (or
//!    pretty) layer on stderr and, when an endpoint is configured, an
//!    OpenTelemetry OTLP exporter. All `tracing` spans and structured events
//!    emitted by every crate in the workspace flow through this layer.
//! 3. **Construct infrastructure**: create the [`github::GithubClient`] and
//!    inject it into an [`audit::AuditClient`] as both transport ports.
//! 4. **Dispatch**: run the selected command inside a root span carrying a
//!    fresh [`audit::AuditRunId`] and print its JSON result on stdout.

use std::process::ExitCode;

use clap::Parser;
use tracing::{info_span, Instrument};

mod args;
mod commands;
mod config;
mod observability;

use args::Cli;
use audit::AuditRunId;
use config::CliConfig;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("org-audit error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::from_args(&cli)?;
    let _telemetry = observability::init(config.log_format, config.otlp_endpoint.as_deref())?;

    let client = commands::connect(&config)?;
    let run_id = AuditRunId::new_random();
    let span = info_span!("org_audit", run_id = %run_id, command = cli.command.name());

    let output = commands::execute(&cli.command, &config, &client, std::io::stdin().lock())
        .instrument(span)
        .await?;

    if let Some(value) = output {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
