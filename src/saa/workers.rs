//! Sub-tasks and the worker pool that executes them.
//!
//! The pool owns a fixed set of [`Assistant`] handles. A batch is executed with
//! gather-all, fail-individually semantics: every sub-task runs in its own tokio task, the
//! pool waits for all of them, and a task whose invocation fails (or panics) gets a result
//! starting with [`ERROR_MARKER`] instead of aborting the batch.
//!
//! Tasks are assigned round-robin: `task[i]` runs on `worker[i % pool_size]`. When the
//! plan holds more tasks than there are workers, a worker serves several tasks at once;
//! no task is left unfulfilled.
//!
//! A pool given a workspace hands its workers the file tools and tells them, in every
//! task prompt, where file operations land.

use crate::assistant::Assistant;
use crate::error::{SaaError, SaaResult};
use crate::event::{EventHandler, WorkflowEvent};
use crate::tool_protocol::ToolRegistry;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Prefix of the result of a sub-task whose execution failed.
pub const ERROR_MARKER: &str = "Error:";

/// One unit of decomposed work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    /// Brief description of the task.
    pub task: String,
    /// Detailed prompt for the worker to accomplish the task.
    pub prompt: String,
    /// Result of the task execution; set once by the worker pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl SubTask {
    pub fn new(task: impl Into<String>, prompt: impl Into<String>) -> Self {
        SubTask {
            task: task.into(),
            prompt: prompt.into(),
            result: None,
        }
    }

    /// `true` when the worker pool recorded a failure for this task.
    pub fn is_failed(&self) -> bool {
        self.result
            .as_deref()
            .map_or(false, |result| result.starts_with(ERROR_MARKER))
    }

    /// The result, or an empty string while the task is pending.
    pub fn result_text(&self) -> &str {
        self.result.as_deref().unwrap_or_default()
    }
}

pub struct WorkerPool {
    workers: Vec<Assistant>,
    workspace: Option<PathBuf>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl WorkerPool {
    pub fn new(workers: Vec<Assistant>) -> Self {
        WorkerPool {
            workers,
            workspace: None,
            event_handler: None,
        }
    }

    /// Give every worker `tools` and point task prompts at the `root` directory.
    pub fn with_workspace(mut self, root: impl Into<PathBuf>, tools: Arc<ToolRegistry>) -> Self {
        self.workers = self
            .workers
            .into_iter()
            .map(|worker| worker.with_tools(Arc::clone(&tools)))
            .collect();
        self.workspace = Some(root.into());
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub(crate) fn set_event_handler(&mut self, handler: Option<Arc<dyn EventHandler>>) {
        self.event_handler = handler;
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn workers(&self) -> &[Assistant] {
        &self.workers
    }

    /// The worker that runs the task at `index`.
    pub fn worker_for(&self, index: usize) -> Option<&Assistant> {
        if self.workers.is_empty() {
            None
        } else {
            self.workers.get(index % self.workers.len())
        }
    }

    /// The prompt a worker receives for `task`.
    pub fn task_prompt(&self, task: &SubTask) -> String {
        match &self.workspace {
            Some(root) => format!(
                "{}\n\nExecute this task and provide the result. Use the provided functions to create, read, or list files as needed. All file operations should be relative to the '{}' directory.",
                task.prompt,
                root.display()
            ),
            None => task.prompt.clone(),
        }
    }

    async fn emit(&self, event: WorkflowEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_workflow_event(&event).await;
        }
    }

    /// Run every task concurrently and return them, in input order, with `result` set.
    ///
    /// Only a dispatch problem (an empty pool facing a non-empty batch) is returned as an
    /// error; individual task failures end up in the task's result.
    pub async fn execute_batch(&self, tasks: Vec<SubTask>) -> SaaResult<Vec<SubTask>> {
        if tasks.is_empty() {
            return Ok(tasks);
        }
        if self.workers.is_empty() {
            return Err(SaaError::Configuration(format!(
                "worker pool has no workers for {} sub-task(s)",
                tasks.len()
            )));
        }

        log::info!(
            "Dispatching {} sub-task(s) to {} worker(s)",
            tasks.len(),
            self.workers.len()
        );

        let mut handles = Vec::with_capacity(tasks.len());
        for (index, task) in tasks.iter().enumerate() {
            let worker = self.workers[index % self.workers.len()].clone();
            self.emit(WorkflowEvent::TaskStarted {
                index,
                task: task.task.clone(),
                worker: worker.name().to_string(),
            })
            .await;

            let prompt = self.task_prompt(task);
            handles.push(tokio::spawn(async move { worker.invoke(&prompt).await }));
        }

        let outcomes = join_all(handles).await;

        let mut completed = Vec::with_capacity(tasks.len());
        let mut failed_count = 0;
        for (index, (mut task, outcome)) in tasks.into_iter().zip(outcomes).enumerate() {
            let result = match outcome {
                Ok(Ok(text)) => text,
                Ok(Err(err)) => {
                    log::error!("Task failed: {}. Error: {}", task.task, err);
                    format!("{} {}", ERROR_MARKER, err)
                }
                Err(join_err) => {
                    log::error!("Task panicked: {}. Error: {}", task.task, join_err);
                    format!("{} task aborted: {}", ERROR_MARKER, join_err)
                }
            };
            task.result = Some(result);

            let failed = task.is_failed();
            if failed {
                failed_count += 1;
            }
            let worker = self.workers[index % self.workers.len()].name().to_string();
            self.emit(WorkflowEvent::TaskCompleted {
                index,
                task: task.task.clone(),
                worker,
                failed,
            })
            .await;
            completed.push(task);
        }

        self.emit(WorkflowEvent::BatchCompleted {
            task_count: completed.len(),
            failed_count,
        })
        .await;

        Ok(completed)
    }
}
