//! Executes a `TaskGraph` level by level with bounded parallelism per task
//! kind, retry-with-backoff for retryable tasks, dynamic successor
//! enqueuing, and cooperative cancellation.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use schema_core::context::TenantScope;
use schema_core::error::{Result, SchemaIntelError};

use crate::cancellation::CancellationToken;
use crate::dag::{TaskGraph, TaskNode};
use crate::retry::{backoff_for_attempt, should_retry};

/// A handle a running task uses to add successors to the runner's queue.
/// Dynamically enqueued tasks become runnable once every name in their
/// `depends_on` has completed; a dependency on a task that never runs
/// leaves the enqueued task stranded (logged, never silently dropped).
#[derive(Clone)]
pub struct Enqueuer {
    pending: Arc<Mutex<Vec<TaskNode>>>,
}

impl Enqueuer {
    pub fn enqueue(&self, node: TaskNode) {
        self.pending.lock().unwrap().push(node);
    }
}

#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn run(&self, scope: &TenantScope, enqueuer: &Enqueuer) -> Result<()>;
}

pub struct RunOutcome {
    pub completed: Vec<String>,
    pub failing_task: Option<String>,
    pub cancelled: bool,
}

/// Per-kind concurrency caps (§5): LLM tasks default to 1 concurrent call,
/// deterministic tasks to `num_cpus`-equivalent.
pub struct Concurrency {
    pub llm_permits: usize,
    pub deterministic_permits: usize,
}

impl Default for Concurrency {
    fn default() -> Self {
        Self {
            llm_permits: 1,
            deterministic_permits: 4,
        }
    }
}

pub async fn run_graph(
    graph: TaskGraph,
    handlers: &HashMap<String, Arc<dyn TaskHandler>>,
    scope: TenantScope,
    concurrency: Concurrency,
    cancellation: CancellationToken,
) -> Result<RunOutcome> {
    let llm_semaphore = Arc::new(Semaphore::new(concurrency.llm_permits.max(1)));
    let deterministic_semaphore = Arc::new(Semaphore::new(concurrency.deterministic_permits.max(1)));
    let pending_dynamic: Arc<Mutex<Vec<TaskNode>>> = Arc::new(Mutex::new(Vec::new()));

    let mut remaining: VecDeque<Vec<TaskNode>> = graph.levels().iter().cloned().collect();
    let mut completed: HashSet<String> = HashSet::new();
    let mut completed_order: Vec<String> = Vec::new();

    while let Some(level) = remaining.pop_front() {
        if cancellation.is_cancelled() {
            return Ok(RunOutcome {
                completed: completed_order,
                failing_task: None,
                cancelled: true,
            });
        }

        let mut join_handles = Vec::with_capacity(level.len());
        for node in level {
            let handler = handlers
                .get(&node.name)
                .cloned()
                .ok_or_else(|| SchemaIntelError::Internal(anyhow::anyhow!("no handler registered for task '{}'", node.name)))?;
            let sem = if node.is_llm_task {
                llm_semaphore.clone()
            } else {
                deterministic_semaphore.clone()
            };
            let enqueuer = Enqueuer {
                pending: pending_dynamic.clone(),
            };
            let task_scope = scope.clone();
            let name = node.name.clone();
            let retryable = node.retryable;

            join_handles.push(tokio::spawn(async move {
                let _permit = sem.acquire_owned().await.expect("semaphore never closed");
                let mut attempt = 0;
                loop {
                    attempt += 1;
                    match handler.run(&task_scope, &enqueuer).await {
                        Ok(()) => return Ok(name),
                        Err(err) if should_retry(attempt, retryable) => {
                            warn!(task = %name, attempt, error = %err, "task failed, retrying");
                            tokio::time::sleep(backoff_for_attempt(attempt + 1)).await;
                        }
                        Err(err) => return Err((name, err)),
                    }
                }
            }));
        }

        for handle in join_handles {
            let outcome = handle
                .await
                .map_err(|e| SchemaIntelError::Internal(anyhow::anyhow!("task panicked: {e}")))?;
            match outcome {
                Ok(name) => {
                    info!(task = %name, "task completed");
                    completed.insert(name.clone());
                    completed_order.push(name);
                }
                Err((name, err)) => {
                    warn!(task = %name, error = %err, "task failed permanently");
                    return Ok(RunOutcome {
                        completed: completed_order,
                        failing_task: Some(name),
                        cancelled: false,
                    });
                }
            }
        }

        let mut pending = pending_dynamic.lock().unwrap();
        let (ready, deferred): (Vec<TaskNode>, Vec<TaskNode>) = pending
            .drain(..)
            .partition(|n| n.depends_on.iter().all(|d| completed.contains(d)));
        *pending = deferred;
        drop(pending);
        if !ready.is_empty() {
            remaining.push_front(ready);
        }
    }

    Ok(RunOutcome {
        completed: completed_order,
        failing_task: None,
        cancelled: false,
    })
}
