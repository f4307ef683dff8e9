//! as3 CLI
//!
//! Fast S3 listing with bounded-concurrency prefix crawling.

use clap::Parser;

mod args;
mod progress;
mod run;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Logs go to stderr, so stdout stays clean for listings
    as3_cli_common::init_logging(args.log_level)?;

    run::execute(args.command).await
}
