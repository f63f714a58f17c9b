//! Enrichment task records
//!
//! A tracked background operation querying the research capability. Tasks
//! progress `pending -> running -> {complete | error}`; terminal records are
//! retained for a TTL so clients can poll results, then purged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered cost/latency band for a research, generation, or repair call
///
/// Advisory only: drives the client-facing time estimate, never an internal
/// timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeTier {
    Lite,
    Standard,
    Deep,
}

impl ComputeTier {
    /// Client-facing latency estimate in seconds
    pub fn estimated_seconds(&self) -> u64 {
        match self {
            ComputeTier::Lite => 60,
            ComputeTier::Standard => 180,
            ComputeTier::Deep => 600,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeTier::Lite => "lite",
            ComputeTier::Standard => "standard",
            ComputeTier::Deep => "deep",
        }
    }
}

impl std::fmt::Display for ComputeTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Routing tag for the enrichment capability a task needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Research a single segment of the document
    SegmentResearch,
    /// Research the document's overall goal
    GoalResearch,
}

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Complete,
    Error,
}

impl TaskStatus {
    /// Terminal tasks are eligible for TTL eviction; live ones never are
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Complete | TaskStatus::Error)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Complete => "complete",
            TaskStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// One tracked enrichment task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentTask {
    pub id: String,

    /// Segment reference this task enriches (e.g. "tier1/segment0")
    pub target: String,

    pub query: String,
    pub compute_tier: ComputeTier,
    pub task_type: TaskType,
    pub status: TaskStatus,

    /// Research payload, present once complete
    pub result: Option<serde_json::Value>,

    /// Error message, present once failed
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Advisory latency estimate shown to the client
    pub estimated_seconds: u64,
}

impl EnrichmentTask {
    /// Create a new pending task
    pub fn new(
        target: impl Into<String>,
        query: impl Into<String>,
        compute_tier: ComputeTier,
        task_type: TaskType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            target: target.into(),
            query: query.into(),
            compute_tier,
            task_type,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            estimated_seconds: compute_tier.estimated_seconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_is_pending() {
        let task = EnrichmentTask::new("tier1/segment0", "piano teachers", ComputeTier::Lite, TaskType::SegmentResearch);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.result.is_none());
        assert!(task.error.is_none());
        assert_eq!(task.estimated_seconds, 60);
    }

    #[test]
    fn test_compute_tier_ordering() {
        assert!(ComputeTier::Lite < ComputeTier::Standard);
        assert!(ComputeTier::Standard < ComputeTier::Deep);
    }

    #[test]
    fn test_compute_tier_estimates() {
        assert_eq!(ComputeTier::Lite.estimated_seconds(), 60);
        assert_eq!(ComputeTier::Standard.estimated_seconds(), 180);
        assert_eq!(ComputeTier::Deep.estimated_seconds(), 600);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Complete.is_terminal());
        assert!(TaskStatus::Error.is_terminal());
    }
}
