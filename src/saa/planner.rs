//! Planner: decides whether an objective is answered directly or split into sub-tasks.
//!
//! The planner sends one request to a "TaskPlanner" assistant derived from the main
//! assistant (same client, planner description) and expects a JSON document shaped like
//! [`PlanDecision`]. A malformed answer is a hard [`SaaError::PlanningFailure`]; retrying
//! on format errors is left to the caller.
//!
//! # Example: parsing a planner reply
//!
//! ```rust
//! use saa_orchestrator::planner::parse_plan;
//!
//! let plan = parse_plan(r#"{
//!     "objective_completion": false,
//!     "explanation": "Two independent parts.",
//!     "tasks": [
//!         {"task": "Backend", "prompt": "Design the REST API"},
//!         {"task": "Frontend", "prompt": "Sketch the UI"}
//!     ]
//! }"#).unwrap();
//!
//! assert!(!plan.objective_completion);
//! assert_eq!(plan.task_titles(), vec!["Backend", "Frontend"]);
//! ```

use crate::assistant::Assistant;
use crate::error::{SaaError, SaaResult};
use crate::workers::SubTask;
use serde::{Deserialize, Serialize};

pub const PLANNER_NAME: &str = "TaskPlanner";
pub const PLANNER_DESCRIPTION: &str =
    "You are a task planner that analyzes objectives and breaks them down into subtasks if necessary.";

/// The planner's verdict for one objective.
///
/// When `objective_completion` is `true` the `explanation` is the final answer and
/// `tasks` is empty; otherwise `tasks` lists the sub-tasks to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDecision {
    pub objective_completion: bool,
    pub explanation: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tasks: Vec<SubTask>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<SubTask>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<SubTask>>::deserialize(deserializer)?.unwrap_or_default())
}

impl PlanDecision {
    /// A plan answering the objective directly.
    pub fn complete(explanation: impl Into<String>) -> Self {
        PlanDecision {
            objective_completion: true,
            explanation: explanation.into(),
            tasks: Vec::new(),
        }
    }

    /// A plan splitting the objective into `tasks`.
    pub fn decompose(explanation: impl Into<String>, tasks: Vec<SubTask>) -> Self {
        PlanDecision {
            objective_completion: false,
            explanation: explanation.into(),
            tasks,
        }
    }

    pub fn task_titles(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.task.as_str()).collect()
    }

    /// Text recorded in the exchange log for this plan.
    pub fn announcement(&self) -> String {
        if self.objective_completion {
            return self.explanation.clone();
        }
        let mut text = format!("{}\n\nSub-tasks:", self.explanation);
        for (index, task) in self.tasks.iter().enumerate() {
            text.push_str(&format!("\n{}. {}", index + 1, task.task));
        }
        text
    }

    /// Check the "tasks iff not complete" rule, dropping what the rule says is
    /// meaningless: tasks of a complete plan, results the model should not have produced.
    fn normalize(mut self) -> SaaResult<Self> {
        if self.objective_completion {
            if !self.tasks.is_empty() {
                log::warn!(
                    "Planner marked the objective complete but listed {} sub-task(s); ignoring them",
                    self.tasks.len()
                );
                self.tasks.clear();
            }
        } else if self.tasks.is_empty() {
            return Err(SaaError::PlanningFailure(
                "plan requires decomposition but lists no sub-tasks".to_string(),
            ));
        }
        for task in &mut self.tasks {
            task.result = None;
        }
        Ok(self)
    }
}

/// Parse a raw planner reply into a validated [`PlanDecision`].
///
/// The reply may be bare JSON or JSON inside a Markdown code fence.
pub fn parse_plan(raw: &str) -> SaaResult<PlanDecision> {
    let body = strip_code_fence(raw);
    let plan: PlanDecision = serde_json::from_str(body).map_err(|err| {
        log::error!("Failed to parse plan response: {}", raw);
        SaaError::PlanningFailure(format!("invalid plan response: {}", err))
    })?;
    plan.normalize()
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string ("json") up to the end of the opening fence line.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// Issues the planning request.
#[derive(Debug, Clone)]
pub struct Planner {
    num_workers: usize,
}

impl Planner {
    /// `num_workers` is the number of sub-tasks requested when decomposition is needed.
    pub fn new(num_workers: usize) -> Self {
        Planner { num_workers }
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// The full request sent to the planner for `objective_or_prompt`.
    pub fn build_prompt(&self, objective_or_prompt: &str) -> String {
        format!(
            r#"Analyze the following objective and determine if it requires subtask decomposition:

Objective: {objective}

Respond with a JSON object that follows this structure:

{{
    "objective_completion": boolean,
    "explanation": string,
    "tasks": [
        {{
            "task": string,
            "prompt": string
        }},
        ...
    ]
}}

If the objective can be accomplished without subtask decomposition:
- Set "objective_completion" to true
- Provide a concise solution or response to the objective in the "explanation" field
- Leave the "tasks" array empty

If the objective requires subtask decomposition:
- Set "objective_completion" to false
- Provide a brief explanation in the "explanation" field
- Break down the objective into {count} subtasks in the "tasks" array
- For each subtask, include a "task" field with a brief description and a "prompt" field with detailed instructions

Respond with the JSON object only. Create prompts that are clear, specific, and actionable."#,
            objective = objective_or_prompt,
            count = self.num_workers,
        )
    }

    /// Ask `main_assistant`'s model for a plan.
    pub async fn plan(
        &self,
        objective_or_prompt: &str,
        main_assistant: &Assistant,
    ) -> SaaResult<PlanDecision> {
        let planner = main_assistant.derive(PLANNER_NAME, PLANNER_DESCRIPTION);
        let response = planner.invoke(&self.build_prompt(objective_or_prompt)).await?;
        let plan = parse_plan(&response)?;
        log::info!(
            "Plan received: objective_completion={}, {} sub-task(s)",
            plan.objective_completion,
            plan.tasks.len()
        );
        Ok(plan)
    }
}
