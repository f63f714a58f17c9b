//! Attention Context - the shared per-run record threaded through the pipeline
//!
//! An explicit value passed into and returned from each stage call, never
//! ambient state. Single-writer: the coordinator merges exactly one tagged
//! slot per stage invocation; a stage may read any prior slot but writes
//! only its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::pipeline::PipelineStage;

/// User-supplied configuration for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Goal statement the plan should address
    pub goal: String,

    /// Name of the person the plan is for
    pub actor: String,

    pub start_age: f64,
    pub end_age: f64,

    /// Requested number of tiers (2 or 3)
    pub tier_count: u8,

    /// Text extracted from an uploaded document, if any
    pub uploaded_excerpt: Option<String>,
}

/// A stage's typed contribution to the context
///
/// Stored keyed by stage name; the tag doubles as the slot key so a stage
/// can never overwrite another stage's contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum AttentionSlot {
    Intake {
        confidence: f64,
        /// What information is still missing
        open_questions: Vec<String>,
        summary: String,
    },
    Clarify {
        confidence: f64,
        open_questions: Vec<String>,
        /// Condensed record of what the answers established
        answers_digest: String,
    },
    InternalReview {
        confidence: f64,
        should_research: bool,
        /// Suggested research query when should_research is set
        research_query: Option<String>,
        notes: String,
    },
    Generate {
        confidence: f64,
    },
}

impl AttentionSlot {
    /// The stage this slot belongs to
    pub fn stage(&self) -> PipelineStage {
        match self {
            AttentionSlot::Intake { .. } => PipelineStage::Intake,
            AttentionSlot::Clarify { .. } => PipelineStage::Clarify,
            AttentionSlot::InternalReview { .. } => PipelineStage::InternalReview,
            AttentionSlot::Generate { .. } => PipelineStage::Generate,
        }
    }

    /// The self-reported confidence score (0-100)
    pub fn confidence(&self) -> f64 {
        match self {
            AttentionSlot::Intake { confidence, .. }
            | AttentionSlot::Clarify { confidence, .. }
            | AttentionSlot::InternalReview { confidence, .. }
            | AttentionSlot::Generate { confidence, .. } => *confidence,
        }
    }

    /// Open questions carried by this slot, if any
    pub fn open_questions(&self) -> &[String] {
        match self {
            AttentionSlot::Intake { open_questions, .. } | AttentionSlot::Clarify { open_questions, .. } => {
                open_questions
            }
            _ => &[],
        }
    }
}

/// Who said what in the run's conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerRole {
    User,
    Assistant,
}

/// One ordered entry in the run transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: SpeakerRole,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: SpeakerRole::User,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: SpeakerRole::Assistant,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// Where the run currently is and how it got there
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDescriptor {
    /// Current pipeline stage
    pub current_stage: PipelineStage,

    /// Clarify answers consumed so far
    pub clarify_rounds: usize,

    /// InternalReview fallbacks into Clarify so far
    pub review_fallbacks: usize,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowDescriptor {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            current_stage: PipelineStage::Intake,
            clarify_rounds: 0,
            review_fallbacks: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total rounds spent in the Clarify/InternalReview cycle
    ///
    /// This is the quantity the round cap bounds.
    pub fn total_rounds(&self) -> usize {
        self.clarify_rounds + self.review_fallbacks
    }
}

/// The accumulating shared record passed between pipeline stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttentionContext {
    /// Opaque run id the external store keys on
    pub run_id: String,

    pub settings: RunSettings,

    /// Stage-name -> that stage's contribution (append-only per stage)
    pub slots: BTreeMap<String, AttentionSlot>,

    /// Ordered conversation transcript
    pub transcript: Vec<TranscriptEntry>,

    pub workflow: WorkflowDescriptor,
}

impl AttentionContext {
    /// Create a fresh context for a new run
    pub fn new(settings: RunSettings) -> Self {
        let run_id = uuid::Uuid::now_v7().to_string();
        debug!(%run_id, "AttentionContext::new: created");
        Self {
            run_id,
            settings,
            slots: BTreeMap::new(),
            transcript: Vec::new(),
            workflow: WorkflowDescriptor::new(),
        }
    }

    /// Merge a stage's slot under its own tag
    ///
    /// The slot key is derived from the slot itself, so a stage invocation
    /// cannot write into another stage's slot. Re-running a stage replaces
    /// that stage's previous contribution.
    pub fn merge_slot(&mut self, slot: AttentionSlot) {
        let key = slot.stage().name().to_string();
        debug!(slot = %key, run_id = %self.run_id, "AttentionContext::merge_slot");
        self.slots.insert(key, slot);
        self.workflow.updated_at = Utc::now();
    }

    /// Read a prior stage's slot
    pub fn slot(&self, stage: PipelineStage) -> Option<&AttentionSlot> {
        self.slots.get(stage.name())
    }

    /// Append an entry to the transcript
    pub fn record(&mut self, entry: TranscriptEntry) {
        self.transcript.push(entry);
        self.workflow.updated_at = Utc::now();
    }

    /// Advance the workflow to a new stage
    pub fn advance_to(&mut self, stage: PipelineStage) {
        debug!(run_id = %self.run_id, from = %self.workflow.current_stage, to = %stage, "AttentionContext::advance_to");
        self.workflow.current_stage = stage;
        self.workflow.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RunSettings {
        RunSettings {
            goal: "become a concert pianist".to_string(),
            actor: "Sam".to_string(),
            start_age: 10.0,
            end_age: 18.0,
            tier_count: 3,
            uploaded_excerpt: None,
        }
    }

    #[test]
    fn test_new_context_starts_at_intake() {
        let ctx = AttentionContext::new(settings());
        assert_eq!(ctx.workflow.current_stage, PipelineStage::Intake);
        assert!(ctx.slots.is_empty());
        assert!(!ctx.run_id.is_empty());
    }

    #[test]
    fn test_merge_slot_keys_by_own_stage() {
        let mut ctx = AttentionContext::new(settings());

        ctx.merge_slot(AttentionSlot::Intake {
            confidence: 80.0,
            open_questions: vec!["budget?".to_string()],
            summary: "needs budget".to_string(),
        });
        ctx.merge_slot(AttentionSlot::Clarify {
            confidence: 96.0,
            open_questions: vec![],
            answers_digest: "budget is 10k".to_string(),
        });

        assert_eq!(ctx.slots.len(), 2);
        assert!(ctx.slot(PipelineStage::Intake).is_some());
        assert!(ctx.slot(PipelineStage::Clarify).is_some());
        assert!(ctx.slot(PipelineStage::InternalReview).is_none());
    }

    #[test]
    fn test_rerun_replaces_own_slot_only() {
        let mut ctx = AttentionContext::new(settings());

        ctx.merge_slot(AttentionSlot::Clarify {
            confidence: 70.0,
            open_questions: vec!["q1".to_string()],
            answers_digest: String::new(),
        });
        ctx.merge_slot(AttentionSlot::Clarify {
            confidence: 97.0,
            open_questions: vec![],
            answers_digest: "answered".to_string(),
        });

        assert_eq!(ctx.slots.len(), 1);
        let slot = ctx.slot(PipelineStage::Clarify).unwrap();
        assert_eq!(slot.confidence(), 97.0);
    }

    #[test]
    fn test_transcript_ordering_preserved() {
        let mut ctx = AttentionContext::new(settings());
        ctx.record(TranscriptEntry::assistant("what is the budget?"));
        ctx.record(TranscriptEntry::user("10k"));

        assert_eq!(ctx.transcript.len(), 2);
        assert_eq!(ctx.transcript[0].role, SpeakerRole::Assistant);
        assert_eq!(ctx.transcript[1].role, SpeakerRole::User);
    }

    #[test]
    fn test_total_rounds_sums_both_counters() {
        let mut ctx = AttentionContext::new(settings());
        ctx.workflow.clarify_rounds = 3;
        ctx.workflow.review_fallbacks = 2;
        assert_eq!(ctx.workflow.total_rounds(), 5);
    }
}
