//! Async enrichment tasks
//!
//! Background research operations tracked in an in-memory registry. The
//! registry is the single source of truth for task state; a TTL garbage
//! collector evicts terminal records so long-lived daemons do not grow
//! without bound.

mod orchestrator;

pub use orchestrator::TaskOrchestrator;
