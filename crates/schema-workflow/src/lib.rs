//! Workflow engine (§4.2): task DAG, bounded-parallelism runner with
//! retry-with-backoff, and per-project start/cancel/status/resume
//! orchestration.

pub mod cancellation;
pub mod dag;
pub mod engine;
pub mod retry;
pub mod runner;

pub use cancellation::CancellationToken;
pub use dag::{TaskGraph, TaskNode};
pub use engine::{WorkflowEngine, WorkflowStatusView};
pub use runner::{run_graph, Concurrency, Enqueuer, RunOutcome, TaskHandler};
