//! Core PlanStore implementation

use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Unique identifier for a planning run
pub type RunId = String;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Run not found: {0}")]
    RunNotFound(RunId),

    #[error("Document not found: {run_id}/{kind}")]
    DocumentNotFound { run_id: RunId, kind: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Summary of one stored run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Run identifier
    pub run_id: RunId,
    /// Document kinds present for this run
    pub kinds: Vec<String>,
}

/// The main plan store
///
/// One directory per run id, one JSON file per document kind. Writes go
/// through a temp file + rename so a reader never observes a partial
/// document; concurrent writers to one key resolve last-write-wins.
pub struct PlanStore {
    /// Base path for storage
    base_path: PathBuf,
}

impl PlanStore {
    /// Open or create a plan store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        debug!(?base_path, "Opened plan store");
        Ok(Self { base_path })
    }

    /// Persist a document for a run, replacing any previous version
    pub fn put<T: Serialize>(&self, run_id: &str, kind: &str, value: &T) -> Result<(), StoreError> {
        let run_path = self.base_path.join(run_id);
        fs::create_dir_all(&run_path)?;

        let payload = serde_json::to_vec_pretty(value)?;
        let final_path = run_path.join(format!("{}.json", kind));
        let tmp_path = run_path.join(format!(".{}.json.tmp", kind));

        fs::write(&tmp_path, &payload)?;
        fs::rename(&tmp_path, &final_path)?;

        debug!(run_id, kind, bytes = payload.len(), "Persisted document");
        Ok(())
    }

    /// Load a document for a run
    pub fn get<T: DeserializeOwned>(&self, run_id: &str, kind: &str) -> Result<T, StoreError> {
        let path = self.document_path(run_id, kind);
        if !path.exists() {
            if !self.base_path.join(run_id).exists() {
                return Err(StoreError::RunNotFound(run_id.to_string()));
            }
            return Err(StoreError::DocumentNotFound {
                run_id: run_id.to_string(),
                kind: kind.to_string(),
            });
        }

        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Check whether a document exists for a run
    pub fn exists(&self, run_id: &str, kind: &str) -> bool {
        self.document_path(run_id, kind).exists()
    }

    /// List all stored runs with the document kinds each holds
    pub fn list_runs(&self) -> Result<Vec<RunSummary>, StoreError> {
        let mut runs = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let Some(run_id) = entry.file_name().to_str().map(String::from) else {
                continue;
            };

            let mut kinds = Vec::new();
            for doc in fs::read_dir(entry.path())? {
                let doc = doc?;
                let path = doc.path();
                if path.extension().map(|e| e == "json").unwrap_or(false)
                    && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                    && !stem.starts_with('.')
                {
                    kinds.push(stem.to_string());
                }
            }
            kinds.sort();

            runs.push(RunSummary { run_id, kinds });
        }

        runs.sort_by(|a, b| a.run_id.cmp(&b.run_id));
        Ok(runs)
    }

    /// Delete a run and all its documents
    pub fn delete(&self, run_id: &str) -> Result<(), StoreError> {
        let run_path = self.base_path.join(run_id);
        if run_path.exists() {
            fs::remove_dir_all(&run_path)?;
            info!(run_id, "Deleted run");
        }
        Ok(())
    }

    fn document_path(&self, run_id: &str, kind: &str) -> PathBuf {
        self.base_path.join(run_id).join(format!("{}.json", kind))
    }
}
