//! ReasonerClient trait definition

use async_trait::async_trait;

use super::{ReasonerError, ReasonerRequest, StructuredResult};

/// Stateless structured-reasoning client - each call is independent
///
/// This is the core abstraction for invoking the external reasoning
/// capability. No conversation state is maintained between calls; every
/// request carries the full prompt assembled from the attention context.
#[async_trait]
pub trait ReasonerClient: Send + Sync {
    /// Send a single structured request (suspends until complete or raised)
    ///
    /// Returns a JSON value conforming to the request schema plus the cost
    /// of the call. Network, timeout, and schema failures raise
    /// [`ReasonerError`] - they are never folded into the result.
    async fn invoke(&self, request: ReasonerRequest) -> Result<StructuredResult, ReasonerError>;
}
