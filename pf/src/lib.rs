//! Planforge - confidence-gated drafting of tiered planning documents
//!
//! Architecture:
//!
//! ```text
//!                     +--------------+
//!        settings --> | Coordinator  | --> AttentionContext (planstore)
//!                     |  (pipeline)  | --> PlanDocument     (planstore)
//!                     +------+-------+
//!                            |
//!              +-------------+--------------+
//!              v             v              v
//!        ReasonerClient   Corrector   TaskOrchestrator
//!        (structured      (scan + one  (async research
//!         reasoning)      repair)      tasks, TTL GC)
//! ```
//!
//! A run moves `Intake -> Clarify* -> InternalReview -> Ready -> Generate ->
//! Generated`, gated at each reasoning stage by self-reported confidence.
//! Generated documents pass a deterministic structural scan with a single
//! bounded repair before they are persisted.

pub mod cli;
pub mod config;
pub mod domain;
pub mod events;
pub mod pipeline;
pub mod prompts;
pub mod reasoner;
pub mod research;
pub mod tasks;
pub mod validator;

pub use config::Config;
pub use domain::{AttentionContext, PlanDocument, RunSettings};
pub use events::{EventBus, PfEvent};
pub use pipeline::{Coordinator, GateDecision, PipelineStage, StageOutcome};
pub use tasks::TaskOrchestrator;
pub use validator::{CorrectionReport, Violation};
