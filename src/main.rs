use anyhow::Context;
use clap::Parser;
use netsniff::cli::Cli;
use netsniff::config::AppSettings;
use netsniff::output;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = AppSettings::load(cli.config.as_deref()).context("failed to load settings")?;
    init_tracing(cli.effective_log_level(&settings));

    cli.run(&settings).await?;
    Ok(())
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
