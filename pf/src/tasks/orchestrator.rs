//! Task orchestrator - spawn, track, and garbage-collect enrichment tasks

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use eyre::Result;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::{ComputeTier, EnrichmentTask, TaskStatus, TaskType};
use crate::events::{EventBus, PfEvent};
use crate::research::ResearchClient;

/// How often `await_task` re-checks a live task
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Spawns enrichment tasks and tracks their lifecycle
///
/// Cheap to clone: all state is behind Arcs. Status transitions only move
/// forward (`pending -> running -> {complete | error}`) and are made under
/// the registry write lock, so readers never observe a half-applied update.
#[derive(Clone)]
pub struct TaskOrchestrator {
    registry: Arc<RwLock<HashMap<String, EnrichmentTask>>>,
    research: Arc<dyn ResearchClient>,
    bus: Arc<EventBus>,
    retention: Duration,
}

impl TaskOrchestrator {
    pub fn new(research: Arc<dyn ResearchClient>, bus: Arc<EventBus>, retention: Duration) -> Self {
        Self {
            registry: Arc::new(RwLock::new(HashMap::new())),
            research,
            bus,
            retention,
        }
    }

    /// Create and dispatch an enrichment task
    ///
    /// Returns immediately with the pending record (id plus the advisory
    /// latency estimate for its compute tier). The `TaskStarted` event is
    /// emitted here, before dispatch, so it always precedes the task's
    /// terminal event.
    pub async fn create_task(
        &self,
        target: impl Into<String>,
        query: impl Into<String>,
        compute_tier: ComputeTier,
        task_type: TaskType,
    ) -> EnrichmentTask {
        let task = EnrichmentTask::new(target, query, compute_tier, task_type);
        info!(
            task_id = %task.id,
            target = %task.target,
            tier = %task.compute_tier,
            "create_task: accepted"
        );

        self.registry.write().await.insert(task.id.clone(), task.clone());

        self.bus.emit(PfEvent::TaskStarted {
            task_id: task.id.clone(),
            target: task.target.clone(),
            estimated_seconds: task.estimated_seconds,
        });

        let this = self.clone();
        let task_id = task.id.clone();
        tokio::spawn(async move {
            this.execute(task_id).await;
        });

        task
    }

    /// Run one task to its terminal state
    ///
    /// A missing registry record (evicted or never created) is logged and
    /// skipped; it never panics the worker.
    async fn execute(&self, task_id: String) {
        let (query, tier) = {
            let mut registry = self.registry.write().await;
            match registry.get_mut(&task_id) {
                Some(task) => {
                    task.status = TaskStatus::Running;
                    task.updated_at = Utc::now();
                    debug!(task_id = %task.id, "execute: running");
                    (task.query.clone(), task.compute_tier)
                }
                None => {
                    warn!(%task_id, "execute: task record missing at dispatch, skipping");
                    return;
                }
            }
        };

        // Both task types route to the research capability today; the type
        // shapes the query upstream and tags the record for consumers.
        let outcome = self.research.research(&query, tier).await;

        let mut registry = self.registry.write().await;
        let Some(task) = registry.get_mut(&task_id) else {
            warn!(%task_id, "execute: task record evicted mid-flight, dropping result");
            return;
        };
        task.updated_at = Utc::now();

        match outcome {
            Ok(payload) => {
                task.status = TaskStatus::Complete;
                task.result = Some(payload);
                info!(task_id = %task.id, target = %task.target, "execute: complete");
                self.bus.emit(PfEvent::TaskCompleted {
                    task_id: task.id.clone(),
                    target: task.target.clone(),
                });
            }
            Err(e) => {
                task.status = TaskStatus::Error;
                task.error = Some(e.to_string());
                warn!(task_id = %task.id, target = %task.target, "execute: failed: {}", e);
                self.bus.emit(PfEvent::TaskFailed {
                    task_id: task.id.clone(),
                    target: task.target.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    /// Get a task by id
    pub async fn get_task(&self, task_id: &str) -> Option<EnrichmentTask> {
        self.registry.read().await.get(task_id).cloned()
    }

    /// All tasks enriching one segment reference, oldest first
    pub async fn list_by_target(&self, target: &str) -> Vec<EnrichmentTask> {
        let registry = self.registry.read().await;
        let mut tasks: Vec<EnrichmentTask> = registry.values().filter(|t| t.target == target).cloned().collect();
        tasks.sort_by_key(|t| t.created_at);
        tasks
    }

    /// All tasks currently running, oldest first
    pub async fn list_running(&self) -> Vec<EnrichmentTask> {
        let registry = self.registry.read().await;
        let mut tasks: Vec<EnrichmentTask> = registry
            .values()
            .filter(|t| t.status == TaskStatus::Running)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.created_at);
        tasks
    }

    /// Block until a task reaches a terminal state, then return its record
    ///
    /// Errors if the task id is unknown (or gets evicted while waiting).
    pub async fn await_task(&self, task_id: &str) -> Result<EnrichmentTask> {
        loop {
            match self.get_task(task_id).await {
                Some(task) if task.status.is_terminal() => return Ok(task),
                Some(_) => tokio::time::sleep(POLL_INTERVAL).await,
                None => eyre::bail!("unknown task: {}", task_id),
            }
        }
    }

    /// Evict terminal tasks older than the retention window
    ///
    /// Pending and running tasks are never evicted regardless of age.
    /// Returns the number of records removed.
    pub async fn sweep(&self) -> usize {
        let cutoff = Utc::now() - chrono::Duration::from_std(self.retention).unwrap_or(chrono::Duration::zero());

        let mut registry = self.registry.write().await;
        let before = registry.len();
        registry.retain(|_, task| !(task.status.is_terminal() && task.updated_at < cutoff));
        let evicted = before - registry.len();

        if evicted > 0 {
            info!(evicted, "sweep: evicted expired task records");
        }
        evicted
    }

    /// Run the GC sweep on an interval until the handle is dropped/aborted
    pub fn spawn_gc(&self, interval: Duration) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                this.sweep().await;
            }
        })
    }
}
