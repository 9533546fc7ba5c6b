use std::process::ExitCode;

use clap::Parser;
use pinned_fetch_lib::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    pinned_fetch_lib::app_logger::init(cli.verbose)?;
    pinned_fetch_lib::run(cli).await
}
