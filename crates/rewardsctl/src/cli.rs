//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap.
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Receipt Rewards CLI
#[derive(Parser)]
#[command(name = "rewardsctl")]
#[command(about = "Receipt rewards - points, milestones, and levels", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Data directory for progression records (default: platform data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Catalog definitions file (TOML); built-in defaults when omitted
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Record one accepted receipt upload
    Upload {
        /// User to credit
        #[arg(long)]
        user: String,

        /// Upload date (YYYY-MM-DD); defaults to today (UTC)
        #[arg(long)]
        date: Option<String>,

        /// Idempotency key; a repeated key is a no-op
        #[arg(long)]
        event_key: Option<String>,

        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// Show upload statistics and progression for a user
    Stats {
        #[arg(long)]
        user: String,

        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// List the milestone catalogs
    Milestones {
        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// Show benefits unlocked up to a level
    Benefits {
        #[arg(long)]
        level: u32,

        /// Output JSON only
        #[arg(long)]
        json: bool,
    },
}
