// Safeguard — CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: add, list, search, get, update, delete, path.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::execute;

/// Safeguard — a local password record store.
#[derive(Parser, Debug)]
#[command(name = "safeguard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the record store (defaults to the platform data directory).
    #[arg(long, global = true, env = "SAFEGUARD_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new record.
    Add {
        /// The site or application name (e.g., "GitHub").
        #[arg(long)]
        service: String,

        /// The account identifier.
        #[arg(long)]
        username: String,

        /// The password.
        /// Prefer the SAFEGUARD_SECRET variable to keep it out of shell history.
        #[arg(long, env = "SAFEGUARD_SECRET", hide_env_values = true)]
        secret: String,
    },

    /// List all records, most recently modified first (no secrets).
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Find records whose service or username contains the query.
    Search {
        /// Case-insensitive substring; blank lists everything.
        query: String,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show one record.
    Get {
        /// The record ID.
        id: String,

        /// Print the secret as well.
        #[arg(long)]
        reveal: bool,
    },

    /// Change fields of an existing record. Omitted fields are kept.
    Update {
        /// The record ID.
        id: String,

        #[arg(long)]
        service: Option<String>,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        secret: Option<String>,
    },

    /// Delete a record by ID.
    Delete {
        /// The record ID.
        id: String,
    },

    /// Print the location of the record store.
    Path,
}
