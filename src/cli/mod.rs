//! CLI module for the learning Q&A cache
//!
//! - `serve`: HTTP server
//! - `migrate`: apply database migrations and verify the schema
//! - `ask`: answer one query and print the result as JSON
//! - `stats`: print store statistics as JSON

pub mod migrate;
pub mod query;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Learning Q&A cache - reuses generated answers for similar queries
#[derive(Parser)]
#[command(name = "qa-learning-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,

    /// Apply pending migrations and verify the schema
    Migrate,

    /// Answer a single query and print the response
    Ask {
        /// The question to answer
        query: String,
    },

    /// Print store statistics
    Stats,
}

/// Loads `.env` and the layered configuration, then installs logging
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from(["qa-learning-cache", "ask", "What is the capital of France?"])
            .unwrap();

        match cli.command {
            Command::Ask { query } => assert_eq!(query, "What is the capital of France?"),
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_ask_requires_query() {
        assert!(Cli::try_parse_from(["qa-learning-cache", "ask"]).is_err());
    }
}
