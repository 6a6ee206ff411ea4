//! taxa administrative CLI

mod cli;
mod commands;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use taxa_core::TagService;
use taxa_sqlite::{SqliteConfig, SqlitePool, SqliteProblemStore, SqliteTagStore};
use tracing_subscriber::filter::LevelFilter;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(cli.log_level))
        .with_target(false)
        .init();

    let pool = SqlitePool::new(SqliteConfig::new(&cli.db))?;

    match cli.command {
        Commands::Tag(command) => {
            let service = TagService::new(Arc::new(SqliteTagStore::new(pool)));
            commands::tag::execute(&service, command).await
        }
        Commands::Problem(command) => {
            let store = SqliteProblemStore::new(pool);
            commands::problem::execute(&store, command).await
        }
    }
}
