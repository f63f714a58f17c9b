//! Planning Document model
//!
//! The hierarchical artifact being drafted: a document spans an age range and
//! holds 2 or 3 tiers of increasing resolution; each tier spans the full
//! document range and is partitioned into contiguous segments.
//!
//! All ages and durations are `f64` so JSON integers and floats compare
//! equal by construction (`14` and `14.0` decode to the same value).

use serde::{Deserialize, Serialize};

/// The Planning Document drafted by Generate and finalized by the corrector
///
/// Produced wholesale; the corrector replaces the whole document, never a
/// partial patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanDocument {
    /// Goal statement the plan addresses
    pub goal: String,

    /// Name of the person the plan is for
    pub actor: String,

    /// Age at which the plan starts (decimal-capable)
    pub start_age: f64,

    /// Age at which the plan ends
    pub end_age: f64,

    /// Declared number of tiers (2 or 3)
    pub tier_count: u8,

    /// Resolution levels, ordered coarse to fine
    pub tiers: Vec<Tier>,
}

impl PlanDocument {
    /// Decode a document from a reasoner result value
    ///
    /// Missing fields default to empty/zero; a structurally different value
    /// (wrong types) is an error for the caller to raise.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// One resolution level of the document
///
/// Invariant: every tier spans the document's full age range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tier {
    /// 1-based tier index (1 = coarsest)
    pub id: u8,

    /// Tier title
    pub title: String,

    pub start_age: f64,
    pub end_age: f64,

    /// Contiguous segments partitioning [start_age, end_age]
    pub segments: Vec<Segment>,
}

/// One contiguous, bounded-duration unit inside a tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Segment {
    pub title: String,
    pub description: String,
    pub start_age: f64,
    pub end_age: f64,

    /// Stated duration; must equal `end_age - start_age` within tolerance
    pub duration: f64,
}

impl Segment {
    /// The age span this segment covers
    pub fn span(&self) -> f64 {
        self.end_age - self.start_age
    }
}

/// Reference to a segment inside a document, used by enrichment tasks
pub fn segment_ref(tier_id: u8, segment_index: usize) -> String {
    format!("tier{}/segment{}", tier_id, segment_index)
}
