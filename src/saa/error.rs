//! Error taxonomy shared by every stage of a workflow run.
//!
//! Individual sub-task failures never show up here: the worker pool folds them into the
//! task's result string. Everything else (planning, summarization, plugin lookup,
//! persistence) surfaces as a [`SaaError`], and [`Orchestrator::run_workflow`] wraps it
//! once more in [`SaaError::WorkflowFailure`] so callers match on a single variant.
//!
//! # Example
//!
//! ```
//! use saa_orchestrator::SaaError;
//!
//! let err = SaaError::workflow(SaaError::PluginNotFound("missing".into()));
//! assert_eq!(err.to_string(), "Workflow failed: Plugin 'missing' not found");
//! assert!(matches!(err.cause(), SaaError::PluginNotFound(_)));
//! ```
//!
//! [`Orchestrator::run_workflow`]: crate::Orchestrator::run_workflow

use thiserror::Error;

pub type SaaResult<T> = Result<T, SaaError>;

#[derive(Error, Debug)]
pub enum SaaError {
    /// An assistant call kept failing until the retry budget ran out.
    #[error("Assistant '{assistant}' failed after {attempts} attempt(s): {cause}")]
    AssistantFailure {
        assistant: String,
        attempts: usize,
        cause: String,
    },

    /// The planner's structured response could not be parsed or violated the plan schema.
    #[error("Planning failed: {0}")]
    PlanningFailure(String),

    #[error("Plugin '{0}' not found")]
    PluginNotFound(String),

    /// No client family is known for the model identifier.
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Umbrella raised at the orchestrator boundary; `source` is the stage that failed.
    #[error("Workflow failed: {source}")]
    WorkflowFailure {
        #[source]
        source: Box<SaaError>,
    },
}

impl SaaError {
    /// Wrap `cause` in a [`SaaError::WorkflowFailure`]. Already wrapped errors are returned
    /// as they are, so a failure is never reported as "Workflow failed: Workflow failed: ..".
    pub fn workflow(cause: SaaError) -> Self {
        match cause {
            SaaError::WorkflowFailure { .. } => cause,
            other => SaaError::WorkflowFailure {
                source: Box::new(other),
            },
        }
    }

    /// The innermost stage error, looking through [`SaaError::WorkflowFailure`].
    pub fn cause(&self) -> &SaaError {
        match self {
            SaaError::WorkflowFailure { source } => source.cause(),
            other => other,
        }
    }
}
