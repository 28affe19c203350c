use clap::Parser;
use qa_learning_cache::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Migrate => cli::migrate::run().await,
        Command::Ask { query } => cli::query::ask(&query).await,
        Command::Stats => cli::query::stats().await,
    }
}
