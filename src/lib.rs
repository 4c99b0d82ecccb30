//! # SAA Orchestrator
//!
//! SAA Orchestrator coordinates several Large Language Model "assistants" to accomplish one
//! objective: a main assistant plans, a pool of sub-assistants works on the resulting
//! sub-tasks in parallel, and a refiner assistant folds their results into the final answer.
//!
//! The crate provides layered abstractions for:
//!
//! * **Providers**: the [`ClientWrapper`] trait, implemented for OpenAI, Anthropic Claude,
//!   Google Gemini and xAI Grok over OpenAI-compatible endpoints, and a factory picking the
//!   right one from a model name ([`clients::create_client`])
//! * **Assistants**: [`Assistant`] pairs a client with a name, a system description and a
//!   [`RetryPolicy`]; `invoke(prompt)` is the only way the workflow reaches a model
//! * **Planning**: [`planner::Planner`] asks the main assistant whether the objective can be
//!   answered directly or must be split into [`SubTask`]s
//! * **Parallel execution**: [`WorkerPool`] runs a batch of sub-tasks concurrently; a failing
//!   sub-task yields an `"Error: ..."` result instead of aborting the batch
//! * **Synthesis**: [`summarizer::Summarizer`] turns the sub-task results into one answer
//! * **Orchestration**: [`Orchestrator`] drives the whole run and writes the audit trail
//!   through an [`exchange_log::ExchangeLogSink`]
//! * **Use-case plugins**: [`plugins::PluginRegistry`] maps plugin names to planning prompts
//! * **Workspace tools**: [`tools::FileSystemTool`] lets workers and the refiner create, read
//!   and list files under the output directory through a [`ToolRegistry`]
//!
//! ## Running a workflow
//!
//! ```rust,no_run
//! use saa_orchestrator::{Orchestrator, OrchestratorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     saa_orchestrator::init_logger();
//!
//!     let config = OrchestratorConfig::from_env()?
//!         .with_main_assistant_model("gpt-4o")
//!         .with_sub_assistant_model("gpt-4o-mini")
//!         .with_refiner_assistant_model("gpt-4o");
//!     let orchestrator = Orchestrator::new(config)?;
//!
//!     let report = orchestrator.run("Design a small REST API for a todo app", None).await?;
//!     println!("{}", report.final_output);
//!     println!("{} exchanges recorded", report.state.exchanges().len());
//!     Ok(())
//! }
//! ```
//!
//! ## Bringing your own client
//!
//! Anything implementing [`ClientWrapper`] can back an assistant, which is how the tests run
//! the full workflow without network access:
//!
//! ```rust
//! use async_trait::async_trait;
//! use saa_orchestrator::client_wrapper::{ClientError, ClientWrapper, Message, Role};
//! use saa_orchestrator::Assistant;
//! use std::sync::Arc;
//!
//! struct Canned;
//!
//! #[async_trait]
//! impl ClientWrapper for Canned {
//!     async fn send_message(&self, _messages: &[Message]) -> Result<Message, ClientError> {
//!         Ok(Message { role: Role::Assistant, content: "42".into() })
//!     }
//!
//!     fn model_name(&self) -> &str {
//!         "canned"
//!     }
//! }
//!
//! let assistant = Assistant::new("Oracle", Arc::new(Canned));
//! assert_eq!(assistant.model_name(), "canned");
//! ```

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Environment variable naming a file that receives the log instead of stderr.
pub const LOG_FILE_ENV: &str = "SAA_LOG_FILE";

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Applications embedding the orchestrator opt in to `RUST_LOG` driven diagnostics by
/// calling this early; calling it again is a no-op. When [`LOG_FILE_ENV`] is set (for
/// example to `logs/saa_orchestrator.log`) records are appended to that file, its
/// directory created as needed; stderr is used if the file cannot be opened.
///
/// ```rust
/// saa_orchestrator::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let log_file = std::env::var_os(LOG_FILE_ENV).map(|path| open_log_file(Path::new(&path)));
        match log_file {
            Some(Ok(file)) => env_logger::Builder::from_default_env()
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init(),
            Some(Err(err)) => {
                env_logger::init();
                log::warn!("Cannot open {} log file, logging to stderr: {}", LOG_FILE_ENV, err);
            }
            None => env_logger::init(),
        }
    });
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

// Import the top-level `saa` module.
pub mod saa;

// Re-exporting key items for easier external access.
pub use saa::assistant;
pub use saa::assistant::{Assistant, RetryPolicy};
pub use saa::client_wrapper;
pub use saa::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
pub use saa::clients;
pub use saa::config;
pub use saa::config::{ApiKeys, OrchestratorConfig};
pub use saa::error;
pub use saa::error::{SaaError, SaaResult};
pub use saa::event;
pub use saa::event::{EventHandler, WorkflowEvent};
pub use saa::exchange_log;
pub use saa::exchange_log::{Exchange, ExchangeRole, WorkflowState};
pub use saa::orchestrator;
pub use saa::orchestrator::{Orchestrator, WorkflowPhase, WorkflowReport};
pub use saa::planner;
pub use saa::planner::PlanDecision;
pub use saa::plugins;
pub use saa::summarizer;
pub use saa::tool_protocol;
pub use saa::tool_protocol::{ToolProtocol, ToolRegistry};
pub use saa::tools;
pub use saa::workers;
pub use saa::workers::{SubTask, WorkerPool};
