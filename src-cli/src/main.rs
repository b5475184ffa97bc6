use clap::Parser;
use licensure_cli::Cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    licensure_cli::init_tracing();
    licensure_cli::run(cli).await
}
