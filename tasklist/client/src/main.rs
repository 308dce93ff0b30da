use clap::Parser;
use std::process::ExitCode;
use tasklist_client::cli::{self, Cli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let outcome = cli::run(Cli::parse()).await?;
    Ok(cli::exit_code(&outcome))
}
