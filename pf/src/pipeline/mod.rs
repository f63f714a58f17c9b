//! The drafting pipeline
//!
//! Stages, confidence gates, and the coordinator that drives a run from
//! intake to a validated document.

mod coordinator;
mod stage;

pub use coordinator::{Coordinator, StageOutcome};
pub use stage::{GateDecision, PipelineStage, evaluate_gate};
