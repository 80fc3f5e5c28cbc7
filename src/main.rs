/*
 * Responsibility
 * - CLI の解釈 (serve / seed-recommendations)
 * - tokio runtime 起動と app::* の呼び出し (ロジックは置かない)
 */
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod api;
mod app;
mod config;
mod error;
mod middleware;
mod repos;
mod services;
mod state;

/// Backend for the portfolio blog, newsletter and related-post recommendations.
#[derive(Parser, Debug)]
#[command(name = "portfolio-blog", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,

    /// Replace all stored recommendations with the contents of a JSON file.
    SeedRecommendations {
        /// JSON object mapping each blog slug to its list of recommendations
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    app::init_tracing();
    let config = config::Config::from_env()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => app::serve(config).await,
        Command::SeedRecommendations { file } => app::seed_recommendations(config, &file).await,
    }
}
