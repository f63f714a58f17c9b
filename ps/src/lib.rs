//! PlanStore - file-backed per-run document store
//!
//! Stores the JSON documents a planning run accumulates (attention context,
//! finalized planning document) under an opaque run id. Each write replaces
//! the whole document for its key: last write wins per (run_id, kind).
//!
//! # Architecture
//!
//! ```text
//! .planstore/
//! └── {run_id}/
//!     ├── context.json     # attention context snapshot
//!     └── document.json    # validated planning document
//! ```
//!
//! # Example
//!
//! ```ignore
//! use planstore::{PlanStore, KIND_CONTEXT};
//!
//! let store = PlanStore::open(".planstore")?;
//! store.put(&run_id, KIND_CONTEXT, &context)?;
//! let context: AttentionContext = store.get(&run_id, KIND_CONTEXT)?;
//! ```

pub mod cli;
pub mod config;
mod store;

pub use store::{PlanStore, RunId, RunSummary, StoreError};

/// Key under which the attention context snapshot is stored
pub const KIND_CONTEXT: &str = "context";

/// Key under which the validated planning document is stored
pub const KIND_DOCUMENT: &str = "document";
