use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use planstore::PlanStore;
use planstore::cli::Cli;
use planstore::config::Config;

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("planstore starting");

    match cli.command {
        planstore::cli::Command::List => {
            let store = PlanStore::open(&config.store_path)?;
            let runs = store.list_runs()?;
            if runs.is_empty() {
                println!("No runs found");
            } else {
                for run in runs {
                    println!("{} [{}]", run.run_id.cyan(), run.kinds.join(", "));
                }
            }
        }
        planstore::cli::Command::Get { run_id, kind } => {
            let store = PlanStore::open(&config.store_path)?;
            let value: serde_json::Value = store.get(&run_id, &kind)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        planstore::cli::Command::Delete { run_id } => {
            let store = PlanStore::open(&config.store_path)?;
            store.delete(&run_id)?;
            println!("{} Deleted run: {}", "✓".green(), run_id);
        }
    }

    Ok(())
}
