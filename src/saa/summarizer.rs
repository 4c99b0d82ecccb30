//! Refine step: folds the results of the sub-tasks into the final answer.
//!
//! The refiner assistant receives the objective plus every `Task:`/`Result:` pair,
//! failed ones included, and its reply is returned unmodified. With a workspace set, the
//! prompt also points the refiner at the directory the workers wrote their files to.

use crate::assistant::Assistant;
use crate::error::SaaResult;
use crate::workers::SubTask;
use std::path::PathBuf;

/// Folds the results of a decomposed run into one answer with a single request.
#[derive(Debug, Clone, Default)]
pub struct Summarizer {
    workspace: Option<PathBuf>,
}

impl Summarizer {
    pub fn new() -> Self {
        Summarizer::default()
    }

    pub fn with_workspace(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace = Some(root.into());
        self
    }

    pub fn build_prompt(&self, objective: &str, completed_tasks: &[SubTask]) -> String {
        let mut prompt = format!("Objective: {}\n\nTask results:\n", objective);
        for task in completed_tasks {
            prompt.push_str(&format!(
                "Task: {}\nResult: {}\n\n",
                task.task,
                task.result_text()
            ));
        }
        prompt.push_str(
            "Please summarize these results into a coherent final output that addresses the original objective.",
        );
        if let Some(root) = &self.workspace {
            prompt.push_str(&format!(
                " You can use the provided functions to list and read files if needed. All files are in the '{}' directory.",
                root.display()
            ));
        }
        prompt
    }

    /// One call to `refiner`; its reply is returned untouched. No retries beyond the
    /// assistant's own policy.
    pub async fn summarize(
        &self,
        objective: &str,
        completed_tasks: &[SubTask],
        refiner: &Assistant,
    ) -> SaaResult<String> {
        log::info!(
            "Summarizing {} task result(s) with {}",
            completed_tasks.len(),
            refiner.name()
        );
        refiner
            .invoke(&self.build_prompt(objective, completed_tasks))
            .await
    }
}
