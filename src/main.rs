// Entry point of the moderation CLI.
//
// **Architecture Overview:**
// - `core/` = Business logic (storage-agnostic)
// - `infra/` = Implementations of core traits (SQLite, in-memory, notifier)
// - `cli/` = Command line adapter
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Run one command and print its JSON result

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "cli/cli_layer.rs"]
mod cli;
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::cli::{acting_user, execute, Cli};
use crate::config::AppConfig;
use crate::core::moderation::{ContentRegistry, ContentType, ModerationService, SpamScoringService};
use crate::infra::moderation::{
    InMemoryContentAdapter, InMemoryModerationStore, LogNotifier, SqliteModerationDb,
};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Logs go to stderr, stdout carries the JSON result
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let user = acting_user(&cli.actor, &cli.role);

    let output = if cli.in_memory {
        tracing::debug!("Using in-memory storage");
        let store = InMemoryModerationStore::new();
        let registry = ContentRegistry::new(
            Box::new(InMemoryContentAdapter::new(ContentType::Article)),
            Box::new(InMemoryContentAdapter::new(ContentType::Topic)),
            Box::new(InMemoryContentAdapter::new(ContentType::Reply)),
            Box::new(InMemoryContentAdapter::new(ContentType::Job)),
        );
        let service = ModerationService::new(
            registry,
            store.clone(),
            store.clone(),
            SpamScoringService::new(store, config.scoring.clone()),
            Box::new(LogNotifier),
        );
        execute(cli.command, &service, &user).await?
    } else {
        let db = SqliteModerationDb::connect(&config.database_url).await?;
        tracing::debug!(database_url = %config.database_url, "Connected to moderation database");
        let service = ModerationService::new(
            db.content_registry(),
            db.report_store(),
            db.audit_store(),
            SpamScoringService::new(db.keyword_store(), config.scoring.clone()),
            Box::new(LogNotifier),
        );
        execute(cli.command, &service, &user).await?
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
