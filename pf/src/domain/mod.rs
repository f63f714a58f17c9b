//! Domain types for planforge
//!
//! - [`document`] - the Planning Document (tiers of segments over an age range)
//! - [`context`] - the Attention Context threaded between pipeline stages
//! - [`task`] - enrichment task records tracked by the orchestrator

mod context;
mod document;
mod task;

pub use context::{AttentionContext, AttentionSlot, RunSettings, SpeakerRole, TranscriptEntry, WorkflowDescriptor};
pub use document::{PlanDocument, Segment, Tier, segment_ref};
pub use task::{ComputeTier, EnrichmentTask, TaskStatus, TaskType};
