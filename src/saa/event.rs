//! Workflow event system.
//!
//! Provides a callback-based observability layer for workflow runs. Implement
//! [`EventHandler`] to receive real-time notifications about:
//!
//! - **Run lifecycle**: start, completion, failure
//! - **Planning**: whether the objective was answered directly or split into sub-tasks
//! - **Worker pool**: each sub-task being dispatched and settling
//! - **Refinement and persistence**: summary ready, exchange log written
//!
//! The handler is wrapped in `Arc<dyn EventHandler>` and shared between the
//! [`Orchestrator`](crate::Orchestrator) and its [`WorkerPool`](crate::WorkerPool);
//! registering it via [`Orchestrator::with_event_handler`](crate::Orchestrator::with_event_handler)
//! propagates it to the pool.
//!
//! # Example
//!
//! ```rust
//! use saa_orchestrator::event::{EventHandler, WorkflowEvent};
//! use async_trait::async_trait;
//!
//! struct Progress;
//!
//! #[async_trait]
//! impl EventHandler for Progress {
//!     async fn on_workflow_event(&self, event: &WorkflowEvent) {
//!         if let WorkflowEvent::TaskCompleted { index, task, failed, .. } = event {
//!             println!("#{} {} {}", index + 1, task, if *failed { "failed" } else { "done" });
//!         }
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

/// Events emitted while a workflow runs, in the order listed for a decomposed run.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// `run()` accepted the objective.
    RunStarted {
        run_id: Uuid,
        objective: String,
        use_case: Option<String>,
    },

    /// The planner answered.
    PlanReady {
        run_id: Uuid,
        /// `true` when the explanation is the final answer and no worker will run.
        objective_completion: bool,
        task_count: usize,
    },

    /// A sub-task was handed to a worker.
    TaskStarted {
        /// Position of the task in the plan, 0-based.
        index: usize,
        task: String,
        worker: String,
    },

    /// A sub-task settled. Failed tasks carry an `"Error: ..."` result.
    TaskCompleted {
        index: usize,
        task: String,
        worker: String,
        failed: bool,
    },

    /// Every sub-task of the batch settled.
    BatchCompleted {
        task_count: usize,
        failed_count: usize,
    },

    /// The refiner produced the final answer.
    SummaryReady { run_id: Uuid, length: usize },

    ExchangeLogSaved { run_id: Uuid, location: PathBuf },

    RunCompleted {
        run_id: Uuid,
        exchange_count: usize,
        output_length: usize,
    },

    /// The run ended in error; `error` is the display form of the wrapped cause.
    RunFailed { run_id: Uuid, error: String },
}

/// Receives [`WorkflowEvent`]s. The default implementation ignores them.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_workflow_event(&self, _event: &WorkflowEvent) {}
}

/// Handler that forwards every event to the `log` facade at debug level.
pub struct LoggingEventHandler;

#[async_trait]
impl EventHandler for LoggingEventHandler {
    async fn on_workflow_event(&self, event: &WorkflowEvent) {
        log::debug!("workflow event: {:?}", event);
    }
}
