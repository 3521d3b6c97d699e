//! Rewards Control - CLI front-end for the rewards & progression engine
//!
//! Drives the in-process engine: records uploads, shows progression stats,
//! milestone catalogs, and level benefits.

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use rewards_core::{Catalog, ProgressionStore, QueryFacade, RewardsEngine};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let catalog = match &cli.catalog {
        Some(path) => {
            debug!(path = %path.display(), "Loading catalog");
            Arc::new(Catalog::from_toml_file(path)?)
        }
        None => Arc::new(Catalog::default_catalog()),
    };

    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => default_data_dir().context("Could not resolve a data directory")?,
    };
    debug!(data_dir = %data_dir.display(), "Opening progression store");

    let store = Arc::new(ProgressionStore::open(catalog.clone(), &data_dir)?);
    let engine = RewardsEngine::new(catalog.clone(), store.clone());
    let facade = QueryFacade::new(catalog, store);

    match cli.command {
        Commands::Upload {
            user,
            date,
            event_key,
            json,
        } => commands::upload(&engine, &user, date.as_deref(), event_key.as_deref(), json),
        Commands::Stats { user, json } => commands::stats(&facade, &user, json),
        Commands::Milestones { json } => commands::milestones(&facade, json),
        Commands::Benefits { level, json } => commands::benefits(&facade, level, json),
    }
}

fn default_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("receipt-rewards").join("progression"))
}
