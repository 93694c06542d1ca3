use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use serverless_scout::cli::{Cli, effective_log_filter};
use serverless_scout::error::{categorize_error, format_cli_error};
use serverless_scout::runner::run_cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&effective_log_filter(&cli))?;

    if let Err(err) = run_cli(cli).await {
        eprintln!("{}", format_cli_error(&err, false));
        tracing::error!(category = %categorize_error(&err).code(), error = %err, "command failed");
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(log_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}
