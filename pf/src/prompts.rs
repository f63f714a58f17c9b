//! Prompt templates and response schemas
//!
//! Templates are embedded and rendered with Handlebars. Each reasoning
//! stage pairs a prompt with the JSON schema its response must satisfy;
//! schemas are what make defensive slot parsing rarely needed rather than
//! impossible to need.

use eyre::{Context, Result};
use handlebars::Handlebars;
use serde_json::{Value, json};

use crate::domain::{AttentionContext, PlanDocument};
use crate::validator::Violation;

const INTAKE_TEMPLATE: &str = r#"You are drafting a tiered planning document.

Goal: {{goal}}
Actor: {{actor}}
Age range: {{start_age}} to {{end_age}}
Tiers requested: {{tier_count}}
{{#if uploaded_excerpt}}
Reference material provided by the user:
---
{{uploaded_excerpt}}
---
{{/if}}

Assess whether the request is specific enough to plan against. Report your
confidence (0-100) that you understand the goal well enough to draft a
complete document, a short summary of your understanding, and any open
questions the user must answer first. Be skeptical: an underspecified goal
deserves low confidence and pointed questions.
"#;

const CLARIFY_TEMPLATE: &str = r#"You are clarifying a planning request through dialogue.

Goal: {{goal}}
Actor: {{actor}}
Age range: {{start_age}} to {{end_age}}

Conversation so far:
{{#each transcript}}
[{{this.role}}] {{this.text}}
{{/each}}

Previous assessment:
{{prior_slots}}

Given the user's latest answer, reassess. Report your updated confidence
(0-100), the open questions that remain, and a digest of the answers
gathered so far. Only raise confidence when an answer genuinely resolves a
question.
"#;

const REVIEW_TEMPLATE: &str = r#"You are the internal reviewer for a planning run.

Goal: {{goal}}
Actor: {{actor}}
Age range: {{start_age}} to {{end_age}}

Everything gathered so far:
{{context}}

Critically review whether this is ready for document generation. Report
your confidence (0-100) that generation would produce a sound document,
whether background research would materially improve it
(should_research), a suggested research query if so, and brief notes on
any weaknesses you found.
"#;

const GENERATE_TEMPLATE: &str = r#"Generate the complete tiered planning document.

Goal: {{goal}}
Actor: {{actor}}
Age range: {{start_age}} to {{end_age}}
Tiers: {{tier_count}}

Everything gathered during intake, clarification, and review:
{{context}}

Structural rules:
- Every tier spans the full age range {{start_age}} to {{end_age}}.
- Within a tier, segments are contiguous: each starts where the previous
  ended, the first at the tier start, the last ending at the tier end.
- Each segment's duration equals end_age - start_age.
- Tier 1 segments span 4-10 years, tier 2 spans 1-4 years, tier 3 spans
  0.25-1 years.

Report the document and your confidence (0-100) in its quality.
"#;

const REPAIR_TEMPLATE: &str = r#"A generated planning document failed structural validation.

Document:
{{document}}

Violations found:
{{#each violations}}
- {{this}}
{{/each}}

Produce a corrected document that fixes every violation while preserving
the content (titles, descriptions, goal, actor) as closely as possible.
Adjust ages and durations only as far as needed to satisfy the structure.
"#;

/// Compiled prompt registry
pub struct Prompts {
    registry: Handlebars<'static>,
}

impl Prompts {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);

        registry
            .register_template_string("intake", INTAKE_TEMPLATE)
            .context("Failed to register intake template")?;
        registry
            .register_template_string("clarify", CLARIFY_TEMPLATE)
            .context("Failed to register clarify template")?;
        registry
            .register_template_string("review", REVIEW_TEMPLATE)
            .context("Failed to register review template")?;
        registry
            .register_template_string("generate", GENERATE_TEMPLATE)
            .context("Failed to register generate template")?;
        registry
            .register_template_string("repair", REPAIR_TEMPLATE)
            .context("Failed to register repair template")?;

        Ok(Self { registry })
    }

    pub fn render_intake(&self, context: &AttentionContext) -> Result<String> {
        let data = json!({
            "goal": context.settings.goal,
            "actor": context.settings.actor,
            "start_age": context.settings.start_age,
            "end_age": context.settings.end_age,
            "tier_count": context.settings.tier_count,
            "uploaded_excerpt": context.settings.uploaded_excerpt,
        });
        self.registry.render("intake", &data).context("Failed to render intake prompt")
    }

    pub fn render_clarify(&self, context: &AttentionContext) -> Result<String> {
        let transcript: Vec<Value> = context
            .transcript
            .iter()
            .map(|entry| json!({ "role": entry.role, "text": entry.text }))
            .collect();
        let data = json!({
            "goal": context.settings.goal,
            "actor": context.settings.actor,
            "start_age": context.settings.start_age,
            "end_age": context.settings.end_age,
            "transcript": transcript,
            "prior_slots": serde_json::to_string_pretty(&context.slots)?,
        });
        self.registry.render("clarify", &data).context("Failed to render clarify prompt")
    }

    pub fn render_review(&self, context: &AttentionContext) -> Result<String> {
        let data = json!({
            "goal": context.settings.goal,
            "actor": context.settings.actor,
            "start_age": context.settings.start_age,
            "end_age": context.settings.end_age,
            "context": serde_json::to_string_pretty(context)?,
        });
        self.registry.render("review", &data).context("Failed to render review prompt")
    }

    pub fn render_generate(&self, context: &AttentionContext) -> Result<String> {
        let data = json!({
            "goal": context.settings.goal,
            "actor": context.settings.actor,
            "start_age": context.settings.start_age,
            "end_age": context.settings.end_age,
            "tier_count": context.settings.tier_count,
            "context": serde_json::to_string_pretty(context)?,
        });
        self.registry.render("generate", &data).context("Failed to render generate prompt")
    }

    pub fn render_repair(&self, document: &PlanDocument, violations: &[Violation]) -> Result<String> {
        let described: Vec<String> = violations.iter().map(|v| v.describe()).collect();
        let data = json!({
            "document": serde_json::to_string_pretty(document)?,
            "violations": described,
        });
        self.registry.render("repair", &data).context("Failed to render repair prompt")
    }
}

/// Schema for intake and clarify assessment slots
pub fn assessment_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "confidence": { "type": "number", "minimum": 0, "maximum": 100 },
            "summary": { "type": "string" },
            "open_questions": { "type": "array", "items": { "type": "string" } },
            "answers_digest": { "type": "string" }
        },
        "required": ["confidence"]
    })
}

/// Schema for the internal review slot
pub fn review_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "confidence": { "type": "number", "minimum": 0, "maximum": 100 },
            "should_research": { "type": "boolean" },
            "research_query": { "type": ["string", "null"] },
            "notes": { "type": "string" }
        },
        "required": ["confidence", "should_research"]
    })
}

/// Schema for a full planning document
pub fn document_schema() -> Value {
    let segment = json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "description": { "type": "string" },
            "start_age": { "type": "number" },
            "end_age": { "type": "number" },
            "duration": { "type": "number" }
        },
        "required": ["title", "start_age", "end_age", "duration"]
    });
    json!({
        "type": "object",
        "properties": {
            "goal": { "type": "string" },
            "actor": { "type": "string" },
            "start_age": { "type": "number" },
            "end_age": { "type": "number" },
            "tier_count": { "type": "integer", "enum": [2, 3] },
            "tiers": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "title": { "type": "string" },
                        "start_age": { "type": "number" },
                        "end_age": { "type": "number" },
                        "segments": { "type": "array", "items": segment }
                    },
                    "required": ["id", "start_age", "end_age", "segments"]
                }
            }
        },
        "required": ["goal", "actor", "start_age", "end_age", "tier_count", "tiers"]
    })
}

/// Schema for the generation response: confidence plus the document
pub fn generation_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "confidence": { "type": "number", "minimum": 0, "maximum": 100 },
            "document": document_schema()
        },
        "required": ["confidence", "document"]
    })
}
