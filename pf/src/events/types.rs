//! Event payloads

use serde::{Deserialize, Serialize};

use crate::pipeline::{GateDecision, PipelineStage};

/// Everything observable about a run or task, as it happens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PfEvent {
    /// A pipeline stage began executing
    StageStarted { run_id: String, stage: PipelineStage },

    /// A pipeline stage finished and its gate was evaluated
    StageCompleted {
        run_id: String,
        stage: PipelineStage,
        confidence: f64,
        gate: GateDecision,
        next_stage: PipelineStage,
    },

    /// The single repair call was made for a generated document
    RepairAttempted { run_id: String, remaining_violations: usize },

    /// A run produced a valid document and reached its terminal stage
    RunGenerated { run_id: String },

    /// An enrichment task was accepted; always precedes its terminal event
    TaskStarted {
        task_id: String,
        target: String,
        estimated_seconds: u64,
    },

    /// An enrichment task completed with a result payload
    TaskCompleted { task_id: String, target: String },

    /// An enrichment task failed
    TaskFailed {
        task_id: String,
        target: String,
        message: String,
    },
}

impl PfEvent {
    /// Stable name for logging and filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            PfEvent::StageStarted { .. } => "stage_started",
            PfEvent::StageCompleted { .. } => "stage_completed",
            PfEvent::RepairAttempted { .. } => "repair_attempted",
            PfEvent::RunGenerated { .. } => "run_generated",
            PfEvent::TaskStarted { .. } => "task_started",
            PfEvent::TaskCompleted { .. } => "task_completed",
            PfEvent::TaskFailed { .. } => "task_failed",
        }
    }

    /// The run or task this event concerns
    pub fn subject_id(&self) -> &str {
        match self {
            PfEvent::StageStarted { run_id, .. }
            | PfEvent::StageCompleted { run_id, .. }
            | PfEvent::RepairAttempted { run_id, .. }
            | PfEvent::RunGenerated { run_id } => run_id,
            PfEvent::TaskStarted { task_id, .. }
            | PfEvent::TaskCompleted { task_id, .. }
            | PfEvent::TaskFailed { task_id, .. } => task_id,
        }
    }
}
