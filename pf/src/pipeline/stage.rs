//! Pipeline stages and confidence gates

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The drafting pipeline's states
///
/// `Intake -> Clarify* -> InternalReview -> Ready -> Generate -> Generated`.
/// Progression is gated by self-reported confidence; no gate is ever
/// skipped, and `Generate` fires only on an explicit trigger from `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Intake,
    Clarify,
    InternalReview,
    Ready,
    Generate,
    Generated,
}

impl PipelineStage {
    /// Stable name used as the attention-slot key
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::Intake => "intake",
            PipelineStage::Clarify => "clarify",
            PipelineStage::InternalReview => "internal_review",
            PipelineStage::Ready => "ready",
            PipelineStage::Generate => "generate",
            PipelineStage::Generated => "generated",
        }
    }

    /// Parse a stage from its stable name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "intake" => Some(PipelineStage::Intake),
            "clarify" => Some(PipelineStage::Clarify),
            "internal_review" => Some(PipelineStage::InternalReview),
            "ready" => Some(PipelineStage::Ready),
            "generate" => Some(PipelineStage::Generate),
            "generated" => Some(PipelineStage::Generated),
            _ => None,
        }
    }

    /// Whether the run has reached its terminal state
    pub fn is_terminal(&self) -> bool {
        *self == PipelineStage::Generated
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of evaluating a confidence gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    /// Score met the gate (inclusive)
    Passed,
    /// Score fell below the gate; normal control flow, not an error
    Failed,
    /// Gate failed and the Clarify/InternalReview round cap is spent
    Exhausted,
}

impl GateDecision {
    pub fn passed(&self) -> bool {
        *self == GateDecision::Passed
    }
}

/// Evaluate a confidence score against a gate threshold
///
/// Inclusive: a score exactly equal to the gate passes.
pub fn evaluate_gate(score: f64, gate: f64) -> GateDecision {
    let decision = if score >= gate {
        GateDecision::Passed
    } else {
        GateDecision::Failed
    };
    debug!(score, gate, ?decision, "evaluate_gate");
    decision
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_is_inclusive() {
        assert_eq!(evaluate_gate(95.0, 95.0), GateDecision::Passed);
        assert_eq!(evaluate_gate(95.1, 95.0), GateDecision::Passed);
    }

    #[test]
    fn test_one_below_never_passes() {
        assert_eq!(evaluate_gate(94.0, 95.0), GateDecision::Failed);
        assert_eq!(evaluate_gate(94.999, 95.0), GateDecision::Failed);
    }

    #[test]
    fn test_stage_name_roundtrip() {
        for stage in [
            PipelineStage::Intake,
            PipelineStage::Clarify,
            PipelineStage::InternalReview,
            PipelineStage::Ready,
            PipelineStage::Generate,
            PipelineStage::Generated,
        ] {
            assert_eq!(PipelineStage::from_name(stage.name()), Some(stage));
        }
        assert_eq!(PipelineStage::from_name("bogus"), None);
    }

    #[test]
    fn test_only_generated_is_terminal() {
        assert!(PipelineStage::Generated.is_terminal());
        assert!(!PipelineStage::Ready.is_terminal());
        assert!(!PipelineStage::Generate.is_terminal());
    }
}
