use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use repayment_schedule::cli::{Cli, run};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse()).await
}
