mod cli;
mod config;
mod contract;
mod interpret;
mod model;
mod parser;
mod runlog;
mod sync;
mod tracker;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use cli::Command;

#[tokio::main]
async fn main() -> Result<()> {
    // Keys may live in a local .env
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tasksync=warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match cli::parse_args(&args)? {
        Command::Run(opts) => cli::handle_run(&opts).await,
        Command::Parse { path } => cli::handle_parse(&path),
        Command::Log { limit } => cli::handle_log(limit),
        Command::Help => {
            cli::print_help();
            Ok(())
        }
    }
}
