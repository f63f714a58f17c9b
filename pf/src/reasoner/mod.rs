//! Structured Reasoner client module
//!
//! The reasoner is the external text-generation capability: one call takes a
//! prompt plus a JSON schema and returns a structured result with its cost.
//! Everything upstream of this seam (prompt content, model choice) is opaque
//! to the pipeline.

mod error;
mod http;
pub mod client;
mod types;

pub use client::ReasonerClient;
pub use error::ReasonerError;
pub use http::HttpReasonerClient;
pub use types::{CallCost, ReasonerRequest, StructuredResult};

use std::sync::Arc;

use crate::config::ReasonerConfig;

/// Create a reasoner client from configuration
pub fn create_client(config: &ReasonerConfig) -> Result<Arc<dyn ReasonerClient>, ReasonerError> {
    Ok(Arc::new(HttpReasonerClient::from_config(config)?))
}
