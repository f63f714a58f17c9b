//! Planning Document validator/corrector
//!
//! A deterministic structural scan plus at most one reasoner-backed repair.
//! The scan is pure - it never makes an external call and running it twice
//! on the same document yields the same violation list.

mod corrector;
mod scan;

pub use corrector::{CorrectionReport, Corrector};
pub use scan::{DurationBand, ValidatorConfig, Violation, scan};
