//! CLI argument parsing for planstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ps")]
#[command(author, version, about = "File-backed per-run document store", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all runs and the documents each holds
    List,

    /// Print a stored document as JSON
    Get {
        /// Run ID
        #[arg(required = true)]
        run_id: String,

        /// Document kind (e.g. "context", "document")
        #[arg(default_value = "context")]
        kind: String,
    },

    /// Delete a run and all its documents
    Delete {
        /// Run ID to delete
        #[arg(required = true)]
        run_id: String,
    },
}
