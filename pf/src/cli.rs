//! Command-line interface definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pf", about = "Confidence-gated planning document drafting", version)]
pub struct Cli {
    /// Path to config file (default: .planforge.yml, then ~/.config/planforge/planforge.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start a new run from a goal statement
    Run {
        /// Goal the plan should address
        goal: String,

        /// Who the plan is for
        #[arg(long)]
        actor: String,

        /// Age at which the plan starts
        #[arg(long)]
        start_age: f64,

        /// Age at which the plan ends
        #[arg(long)]
        end_age: f64,

        /// Number of tiers (2 or 3)
        #[arg(long, default_value_t = 3)]
        tiers: u8,

        /// File with reference text to include during intake
        #[arg(long)]
        excerpt: Option<PathBuf>,
    },

    /// Answer the open clarify questions for a run
    Answer {
        run_id: String,

        /// The answer text
        text: String,
    },

    /// Run the internal review gate
    Review { run_id: String },

    /// Generate the document (run must be at 'ready')
    Generate { run_id: String },

    /// Show a run's context, or its generated document
    Show {
        run_id: String,

        /// Show the generated document instead of the context
        #[arg(long)]
        document: bool,
    },

    /// Offline structural scan of a document JSON file (no reasoner calls)
    Validate {
        /// Path to a document JSON file
        file: PathBuf,
    },

    /// Run one enrichment task to completion
    Research {
        /// The research query
        query: String,

        /// Tier containing the segment to enrich
        #[arg(long, default_value_t = 1)]
        tier: u8,

        /// Segment index within the tier
        #[arg(long, default_value_t = 0)]
        segment: usize,

        /// Compute tier: lite, standard, or deep
        #[arg(long, default_value = "standard")]
        compute: String,

        /// Research the overall goal instead of a segment
        #[arg(long)]
        goal: bool,
    },
}
