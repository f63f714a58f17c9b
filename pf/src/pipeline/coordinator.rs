//! Pipeline coordinator
//!
//! Owns stage progression for a run: calls the reasoner, merges each
//! stage's slot into the context, evaluates the stage's gate, and persists
//! the context after every transition. A low confidence score is normal
//! control flow here; the only errors this module returns are operational
//! (store I/O, reasoner transport, a request against the wrong stage).

use std::sync::Arc;

use eyre::{Context as _, Result, bail};
use planstore::{KIND_CONTEXT, KIND_DOCUMENT, PlanStore};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::domain::{AttentionContext, AttentionSlot, PlanDocument, RunSettings, TranscriptEntry};
use crate::events::{EventBus, PfEvent};
use crate::prompts::{self, Prompts};
use crate::reasoner::{CallCost, ReasonerClient, ReasonerRequest, StructuredResult};
use crate::validator::{CorrectionReport, Corrector};

use super::stage::{GateDecision, PipelineStage, evaluate_gate};

/// What one stage invocation produced
#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub run_id: String,

    /// The stage that just ran
    pub stage: PipelineStage,

    /// Self-reported confidence from the stage's slot
    pub confidence: f64,

    pub gate: GateDecision,

    /// Where the run now is
    pub next_stage: PipelineStage,

    /// Questions the user should answer next, if any
    pub open_questions: Vec<String>,

    /// Research query suggested by internal review, if any
    pub research_query: Option<String>,

    /// The validated document, present only when the run reached Generated
    pub document: Option<PlanDocument>,

    /// Validation/repair report from the generation step
    pub report: Option<CorrectionReport>,

    /// What this stage cost, repair call included
    pub cost: CallCost,
}

/// Drives runs through the gated drafting pipeline
pub struct Coordinator {
    reasoner: Arc<dyn ReasonerClient>,
    store: Arc<PlanStore>,
    bus: Arc<EventBus>,
    corrector: Corrector,
    prompts: Prompts,
    gates: crate::config::GatesConfig,
    max_tokens: u32,
}

impl Coordinator {
    pub fn new(
        reasoner: Arc<dyn ReasonerClient>,
        store: Arc<PlanStore>,
        bus: Arc<EventBus>,
        config: &Config,
    ) -> Result<Self> {
        Ok(Self {
            corrector: Corrector::new(reasoner.clone(), config.validator.clone())?,
            reasoner,
            store,
            bus,
            prompts: Prompts::new()?,
            gates: config.gates.clone(),
            max_tokens: config.reasoner.max_tokens,
        })
    }

    /// Begin a new run: create its context and execute Intake
    ///
    /// Intake passing its gate goes straight to InternalReview; no gate is
    /// ever skipped. Failing falls into Clarify with the open questions.
    pub async fn start_run(&self, settings: RunSettings) -> Result<StageOutcome> {
        let mut context = AttentionContext::new(settings);
        let run_id = context.run_id.clone();
        info!(%run_id, "start_run");
        self.emit_started(&run_id, PipelineStage::Intake);

        let prompt = self.prompts.render_intake(&context)?;
        let result = self.invoke(prompt, prompts::assessment_schema()).await?;
        let slot = parse_intake_slot(&result.value);

        let confidence = slot.confidence();
        let open_questions = slot.open_questions().to_vec();
        if !open_questions.is_empty() {
            context.record(TranscriptEntry::assistant(open_questions.join("\n")));
        }
        context.merge_slot(slot);

        let gate = evaluate_gate(confidence, self.gates.intake);
        let next_stage = if gate.passed() {
            PipelineStage::InternalReview
        } else {
            PipelineStage::Clarify
        };
        context.advance_to(next_stage);
        self.persist(&context)?;

        Ok(self.complete(StageOutcome {
            run_id,
            stage: PipelineStage::Intake,
            confidence,
            gate,
            next_stage,
            open_questions,
            research_query: None,
            document: None,
            report: None,
            cost: result.cost,
        }))
    }

    /// Consume one user answer and re-run Clarify
    ///
    /// Each answer consumes one round of the shared cap; once spent, the
    /// gate reports `Exhausted` and the run stays put.
    pub async fn submit_answer(&self, run_id: &str, answer: &str) -> Result<StageOutcome> {
        let mut context = self.load(run_id)?;
        if context.workflow.current_stage != PipelineStage::Clarify {
            bail!(
                "run {} is at stage '{}', not awaiting clarification",
                run_id,
                context.workflow.current_stage
            );
        }
        self.emit_started(run_id, PipelineStage::Clarify);

        context.record(TranscriptEntry::user(answer));
        context.workflow.clarify_rounds += 1;

        let prompt = self.prompts.render_clarify(&context)?;
        let result = self.invoke(prompt, prompts::assessment_schema()).await?;
        let slot = parse_clarify_slot(&result.value);

        let confidence = slot.confidence();
        let open_questions = slot.open_questions().to_vec();
        if !open_questions.is_empty() {
            context.record(TranscriptEntry::assistant(open_questions.join("\n")));
        }
        context.merge_slot(slot);

        let mut gate = evaluate_gate(confidence, self.gates.intake);
        let next_stage = if gate.passed() {
            PipelineStage::InternalReview
        } else {
            if context.workflow.total_rounds() >= self.gates.max_rounds {
                debug!(%run_id, rounds = context.workflow.total_rounds(), "clarify round cap spent");
                gate = GateDecision::Exhausted;
            }
            PipelineStage::Clarify
        };
        context.advance_to(next_stage);
        self.persist(&context)?;

        Ok(self.complete(StageOutcome {
            run_id: run_id.to_string(),
            stage: PipelineStage::Clarify,
            confidence,
            gate,
            next_stage,
            open_questions,
            research_query: None,
            document: None,
            report: None,
            cost: result.cost,
        }))
    }

    /// Run the internal review gate
    ///
    /// Passing marks the run Ready; failing falls back into Clarify (one
    /// more round consumed) unless the cap is spent.
    pub async fn run_review(&self, run_id: &str) -> Result<StageOutcome> {
        let mut context = self.load(run_id)?;
        if context.workflow.current_stage != PipelineStage::InternalReview {
            bail!(
                "run {} is at stage '{}', not awaiting internal review",
                run_id,
                context.workflow.current_stage
            );
        }
        self.emit_started(run_id, PipelineStage::InternalReview);

        let prompt = self.prompts.render_review(&context)?;
        let result = self.invoke(prompt, prompts::review_schema()).await?;
        let slot = parse_review_slot(&result.value);

        let confidence = slot.confidence();
        let research_query = match &slot {
            AttentionSlot::InternalReview {
                should_research: true,
                research_query,
                ..
            } => research_query.clone(),
            _ => None,
        };
        let notes = match &slot {
            AttentionSlot::InternalReview { notes, .. } => notes.clone(),
            _ => String::new(),
        };
        context.merge_slot(slot);

        let mut gate = evaluate_gate(confidence, self.gates.review);
        let next_stage = if gate.passed() {
            PipelineStage::Ready
        } else {
            context.workflow.review_fallbacks += 1;
            if context.workflow.total_rounds() >= self.gates.max_rounds {
                debug!(%run_id, rounds = context.workflow.total_rounds(), "review round cap spent");
                gate = GateDecision::Exhausted;
                PipelineStage::InternalReview
            } else {
                // Surface the reviewer's concerns so the next clarify
                // round can address them
                if !notes.is_empty() {
                    context.record(TranscriptEntry::assistant(notes));
                }
                PipelineStage::Clarify
            }
        };
        context.advance_to(next_stage);
        self.persist(&context)?;

        Ok(self.complete(StageOutcome {
            run_id: run_id.to_string(),
            stage: PipelineStage::InternalReview,
            confidence,
            gate,
            next_stage,
            open_questions: Vec::new(),
            research_query,
            document: None,
            report: None,
            cost: result.cost,
        }))
    }

    /// Generate the document - explicit trigger, only from Ready
    ///
    /// A failed G3 gate leaves the run at Ready with no automatic retry.
    /// A passing gate hands the document to the corrector; only a
    /// structurally valid result reaches Generated.
    pub async fn run_generate(&self, run_id: &str) -> Result<StageOutcome> {
        let mut context = self.load(run_id)?;
        if context.workflow.current_stage != PipelineStage::Ready {
            bail!(
                "run {} is at stage '{}'; generation requires a run at 'ready'",
                run_id,
                context.workflow.current_stage
            );
        }
        self.emit_started(run_id, PipelineStage::Generate);

        let prompt = self.prompts.render_generate(&context)?;
        let result = self.invoke(prompt, prompts::generation_schema()).await?;

        let confidence = confidence_of(&result.value);
        context.merge_slot(AttentionSlot::Generate { confidence });

        let gate = evaluate_gate(confidence, self.gates.generate);
        if !gate.passed() {
            // Stays Ready; the client decides whether to trigger again
            context.advance_to(PipelineStage::Ready);
            self.persist(&context)?;
            return Ok(self.complete(StageOutcome {
                run_id: run_id.to_string(),
                stage: PipelineStage::Generate,
                confidence,
                gate,
                next_stage: PipelineStage::Ready,
                open_questions: Vec::new(),
                research_query: None,
                document: None,
                report: None,
                cost: result.cost,
            }));
        }

        // An absent document decodes to an empty one; the scan flags it
        // and the repair gets its one chance
        let document_value = result
            .value
            .get("document")
            .cloned()
            .unwrap_or_else(|| serde_json::json!({}));
        let document = PlanDocument::from_value(document_value).context("generation returned a malformed document")?;

        let report = self.corrector.validate_and_correct(document).await?;
        if report.repair_attempted {
            self.bus.emit(PfEvent::RepairAttempted {
                run_id: run_id.to_string(),
                remaining_violations: report.remaining_violations.len(),
            });
        }

        let next_stage = if report.is_valid {
            self.store.put(run_id, KIND_DOCUMENT, &report.document)?;
            self.bus.emit(PfEvent::RunGenerated { run_id: run_id.to_string() });
            PipelineStage::Generated
        } else {
            PipelineStage::Ready
        };
        context.advance_to(next_stage);
        self.persist(&context)?;

        Ok(self.complete(StageOutcome {
            run_id: run_id.to_string(),
            stage: PipelineStage::Generate,
            confidence,
            gate,
            next_stage,
            open_questions: Vec::new(),
            research_query: None,
            document: report.is_valid.then(|| report.document.clone()),
            cost: result.cost.add(report.repair_cost),
            report: Some(report),
        }))
    }

    /// Load a run's context from the store
    pub fn context(&self, run_id: &str) -> Result<AttentionContext> {
        self.load(run_id)
    }

    /// Load a run's generated document from the store
    pub fn document(&self, run_id: &str) -> Result<PlanDocument> {
        Ok(self.store.get(run_id, KIND_DOCUMENT)?)
    }

    async fn invoke(&self, prompt: String, schema: Value) -> Result<StructuredResult> {
        let mut request = ReasonerRequest::new(prompt, schema);
        request.max_tokens = self.max_tokens;
        Ok(self.reasoner.invoke(request).await?)
    }

    fn load(&self, run_id: &str) -> Result<AttentionContext> {
        Ok(self.store.get(run_id, KIND_CONTEXT)?)
    }

    fn persist(&self, context: &AttentionContext) -> Result<()> {
        Ok(self.store.put(&context.run_id, KIND_CONTEXT, context)?)
    }

    fn emit_started(&self, run_id: &str, stage: PipelineStage) {
        self.bus.emit(PfEvent::StageStarted {
            run_id: run_id.to_string(),
            stage,
        });
    }

    fn complete(&self, outcome: StageOutcome) -> StageOutcome {
        self.bus.emit(PfEvent::StageCompleted {
            run_id: outcome.run_id.clone(),
            stage: outcome.stage,
            confidence: outcome.confidence,
            gate: outcome.gate,
            next_stage: outcome.next_stage,
        });
        outcome
    }
}

/// Defensive field access for reasoner slot payloads
///
/// Schemas make malformed slots rare, not impossible; a missing confidence
/// reads as 0 (never passes a gate) rather than crashing the run.
fn confidence_of(value: &Value) -> f64 {
    value
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
        .clamp(0.0, 100.0)
}

fn string_of(value: &Value, field: &str) -> String {
    value.get(field).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn questions_of(value: &Value) -> Vec<String> {
    value
        .get("open_questions")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|q| q.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

fn parse_intake_slot(value: &Value) -> AttentionSlot {
    AttentionSlot::Intake {
        confidence: confidence_of(value),
        open_questions: questions_of(value),
        summary: string_of(value, "summary"),
    }
}

fn parse_clarify_slot(value: &Value) -> AttentionSlot {
    AttentionSlot::Clarify {
        confidence: confidence_of(value),
        open_questions: questions_of(value),
        answers_digest: string_of(value, "answers_digest"),
    }
}

fn parse_review_slot(value: &Value) -> AttentionSlot {
    AttentionSlot::InternalReview {
        confidence: confidence_of(value),
        should_research: value.get("should_research").and_then(Value::as_bool).unwrap_or(false),
        research_query: value
            .get("research_query")
            .and_then(Value::as_str)
            .map(String::from),
        notes: string_of(value, "notes"),
    }
}
