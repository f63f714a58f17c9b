use std::fs;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use tracing::info;

use planforge::cli::{Cli, Command};
use planforge::config::Config;
use planforge::domain::{ComputeTier, PlanDocument, RunSettings, TaskStatus, TaskType, segment_ref};
use planforge::events::create_event_bus;
use planforge::pipeline::{Coordinator, GateDecision, StageOutcome};
use planforge::research::HttpResearchClient;
use planforge::tasks::TaskOrchestrator;
use planforge::validator;

use planstore::PlanStore;

/// Tracing goes to a log file so stdout stays clean for command output
fn setup_logging(config: &Config, verbose: bool) -> Result<()> {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    let log_dir = config.storage.store_dir.clone();
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;
    let log_file = fs::File::create(log_dir.join("planforge.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(&config, cli.verbose)?;

    match cli.command {
        Command::Run {
            goal,
            actor,
            start_age,
            end_age,
            tiers,
            excerpt,
        } => {
            let uploaded_excerpt = match excerpt {
                Some(path) => Some(fs::read_to_string(&path).context(format!("Failed to read {}", path.display()))?),
                None => None,
            };
            let settings = RunSettings {
                goal,
                actor,
                start_age,
                end_age,
                tier_count: tiers,
                uploaded_excerpt,
            };
            let coordinator = build_coordinator(&config)?;
            let outcome = coordinator.start_run(settings).await?;
            println!("{} Started run: {}", "✓".green(), outcome.run_id.cyan());
            print_outcome(&outcome);
        }
        Command::Answer { run_id, text } => {
            let coordinator = build_coordinator(&config)?;
            let outcome = coordinator.submit_answer(&run_id, &text).await?;
            print_outcome(&outcome);
        }
        Command::Review { run_id } => {
            let coordinator = build_coordinator(&config)?;
            let outcome = coordinator.run_review(&run_id).await?;
            print_outcome(&outcome);
        }
        Command::Generate { run_id } => {
            let coordinator = build_coordinator(&config)?;
            let outcome = coordinator.run_generate(&run_id).await?;
            print_outcome(&outcome);
        }
        Command::Show { run_id, document } => {
            let store = PlanStore::open(&config.storage.store_dir)?;
            if document {
                if !store.exists(&run_id, planstore::KIND_DOCUMENT) {
                    bail!("run {} has no generated document yet", run_id);
                }
                let doc: serde_json::Value = store.get(&run_id, planstore::KIND_DOCUMENT)?;
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                let context: serde_json::Value = store.get(&run_id, planstore::KIND_CONTEXT)?;
                println!("{}", serde_json::to_string_pretty(&context)?);
            }
        }
        Command::Validate { file } => {
            let content = fs::read_to_string(&file).context(format!("Failed to read {}", file.display()))?;
            let value: serde_json::Value = serde_json::from_str(&content).context("Failed to parse document JSON")?;
            let document = PlanDocument::from_value(value).context("Not a planning document")?;

            let violations = validator::scan(&document, &config.validator);
            if violations.is_empty() {
                println!("{} Document is structurally valid", "✓".green());
            } else {
                println!("{} {} violation(s):", "✗".red(), violations.len());
                for violation in &violations {
                    println!("  - {}", violation);
                }
                std::process::exit(1);
            }
        }
        Command::Research {
            query,
            tier,
            segment,
            compute,
            goal,
        } => {
            let compute = parse_tier(&compute)?;
            let (target, task_type) = if goal {
                ("goal".to_string(), TaskType::GoalResearch)
            } else {
                (segment_ref(tier, segment), TaskType::SegmentResearch)
            };

            let research = Arc::new(HttpResearchClient::from_config(&config.research)?);
            let bus = create_event_bus();
            let orchestrator = TaskOrchestrator::new(research, bus, Duration::from_secs(config.tasks.retention_secs));
            let _gc = orchestrator.spawn_gc(Duration::from_secs(config.tasks.gc_interval_secs));

            let created = orchestrator.create_task(target, query, compute, task_type).await;
            println!(
                "{} Task {} accepted (estimated {}s)",
                "✓".green(),
                created.id.cyan(),
                created.estimated_seconds
            );

            let done = orchestrator.await_task(&created.id).await?;
            match done.status {
                TaskStatus::Complete => {
                    let payload = done.result.unwrap_or(serde_json::Value::Null);
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                }
                TaskStatus::Error => {
                    println!("{} Task failed: {}", "✗".red(), done.error.unwrap_or_default());
                    std::process::exit(1);
                }
                _ => unreachable!("await_task returns terminal tasks only"),
            }
        }
    }

    Ok(())
}

fn build_coordinator(config: &Config) -> Result<Coordinator> {
    config.validate()?;
    let reasoner = planforge::reasoner::create_client(&config.reasoner)?;
    let store = Arc::new(PlanStore::open(&config.storage.store_dir)?);
    let bus = create_event_bus();
    Coordinator::new(reasoner, store, bus, config)
}

fn parse_tier(tier: &str) -> Result<ComputeTier> {
    match tier {
        "lite" => Ok(ComputeTier::Lite),
        "standard" => Ok(ComputeTier::Standard),
        "deep" => Ok(ComputeTier::Deep),
        other => bail!("unknown compute tier '{}' (expected lite, standard, or deep)", other),
    }
}

fn print_outcome(outcome: &StageOutcome) {
    let gate = match outcome.gate {
        GateDecision::Passed => "passed".green(),
        GateDecision::Failed => "failed".yellow(),
        GateDecision::Exhausted => "exhausted".red(),
    };
    println!(
        "{}: confidence {:.1}, gate {}, now at {}",
        outcome.stage.to_string().bold(),
        outcome.confidence,
        gate,
        outcome.next_stage.to_string().cyan()
    );

    if !outcome.open_questions.is_empty() {
        println!("{}", "Open questions:".bold());
        for question in &outcome.open_questions {
            println!("  - {}", question.yellow());
        }
    }

    if let Some(query) = &outcome.research_query {
        println!("{} {}", "Suggested research:".bold(), query);
    }

    if let Some(report) = &outcome.report {
        if report.repair_attempted {
            println!(
                "Repair attempted: {} violation(s) remaining",
                report.remaining_violations.len()
            );
        }
        if !report.is_valid {
            for violation in &report.remaining_violations {
                println!("  - {}", violation.to_string().red());
            }
        }
    }

    if outcome.next_stage.is_terminal() {
        println!("{} Document generated and stored", "✓".green());
    }
}
