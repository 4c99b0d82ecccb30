//! The audit trail of a workflow run.
//!
//! [`WorkflowState`] collects [`Exchange`]s while a run progresses; once the run succeeds
//! the orchestrator hands an [`ExchangeRecord`] to an [`ExchangeLogSink`]. The default sink
//! renders Markdown into `exchange_log.md`:
//!
//! ```text
//! # SAA Orchestrator Exchange Log
//!
//! ## Objective
//! Build app
//!
//! ## Task Breakdown and Execution
//!
//! ### User
//! Build app
//!
//! ### Main_assistant
//! ...
//!
//! ## Final Output
//! Final
//! ```

use crate::error::SaaResult;
use crate::workers::SubTask;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub const EXCHANGE_LOG_FILE: &str = "exchange_log.md";

/// Who produced an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeRole {
    /// The objective as supplied by the caller.
    User,
    /// The planner's announcement.
    MainAssistant,
    /// One worker result.
    SubAssistant,
    /// The final summary.
    RefinerAssistant,
}

impl ExchangeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeRole::User => "user",
            ExchangeRole::MainAssistant => "main_assistant",
            ExchangeRole::SubAssistant => "sub_assistant",
            ExchangeRole::RefinerAssistant => "refiner_assistant",
        }
    }

    /// Section heading in the Markdown log: first letter upper-cased, the rest kept
    /// lower-case (`main_assistant` -> `Main_assistant`).
    pub fn heading(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for ExchangeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub role: ExchangeRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Exchange {
    pub fn new(role: ExchangeRole, content: impl Into<String>) -> Self {
        Exchange {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Exchanges and completed sub-tasks of one run, both in append order.
///
/// Completed tasks are only added through [`WorkflowState::record_task`], which also
/// appends the matching `sub_assistant` exchange, so the two counts never drift apart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowState {
    exchanges: Vec<Exchange>,
    tasks: Vec<SubTask>,
}

impl WorkflowState {
    pub fn new() -> Self {
        WorkflowState::default()
    }

    /// Append a user, planner or refiner exchange.
    ///
    /// Worker exchanges only enter through [`WorkflowState::record_task`]; a
    /// `SubAssistant` exchange passed here is dropped with a warning.
    pub fn push_exchange(&mut self, role: ExchangeRole, content: impl Into<String>) {
        if role == ExchangeRole::SubAssistant {
            log::warn!(
                "WorkflowState::push_exchange: sub_assistant exchanges must come with their task, ignoring"
            );
            return;
        }
        self.exchanges.push(Exchange::new(role, content));
    }

    /// Append a completed task together with its worker exchange.
    pub fn record_task(&mut self, task: SubTask) {
        self.exchanges
            .push(Exchange::new(ExchangeRole::SubAssistant, task.result_text()));
        self.tasks.push(task);
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn tasks(&self) -> &[SubTask] {
        &self.tasks
    }

    pub fn roles(&self) -> Vec<ExchangeRole> {
        self.exchanges.iter().map(|e| e.role).collect()
    }

    pub fn count_role(&self, role: ExchangeRole) -> usize {
        self.exchanges.iter().filter(|e| e.role == role).count()
    }
}

/// Everything persisted for one successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRecord {
    pub objective: String,
    pub exchanges: Vec<Exchange>,
    pub final_output: String,
}

impl ExchangeRecord {
    /// Markdown form written by [`MarkdownFileSink`].
    pub fn to_markdown(&self) -> String {
        let mut log_content = String::from("# SAA Orchestrator Exchange Log\n\n");
        log_content.push_str(&format!("## Objective\n{}\n\n", self.objective));
        log_content.push_str("## Task Breakdown and Execution\n\n");
        for exchange in &self.exchanges {
            log_content.push_str(&format!(
                "### {}\n{}\n\n",
                exchange.role.heading(),
                exchange.content
            ));
        }
        log_content.push_str(&format!("## Final Output\n{}\n", self.final_output));
        log_content
    }
}

/// Destination of exchange records.
#[async_trait]
pub trait ExchangeLogSink: Send + Sync {
    /// Persist `record`, replacing whatever a previous run left.
    async fn persist(&self, record: &ExchangeRecord) -> SaaResult<()>;

    /// Human-readable location, for progress output.
    fn location(&self) -> PathBuf;
}

/// Writes the Markdown log to a fixed file, creating parent directories as needed.
pub struct MarkdownFileSink {
    path: PathBuf,
}

impl MarkdownFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        MarkdownFileSink { path: path.into() }
    }

    /// `<output_dir>/exchange_log.md`
    pub fn in_dir(output_dir: impl AsRef<Path>) -> Self {
        MarkdownFileSink::new(output_dir.as_ref().join(EXCHANGE_LOG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ExchangeLogSink for MarkdownFileSink {
    async fn persist(&self, record: &ExchangeRecord) -> SaaResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, record.to_markdown()).await?;
        log::info!("Exchange log saved to: {}", self.path.display());
        Ok(())
    }

    fn location(&self) -> PathBuf {
        self.path.clone()
    }
}

/// Keeps the last persisted record in memory.
#[derive(Default)]
pub struct InMemorySink {
    last: Mutex<Option<ExchangeRecord>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        InMemorySink::default()
    }

    pub async fn last_record(&self) -> Option<ExchangeRecord> {
        self.last.lock().await.clone()
    }
}

#[async_trait]
impl ExchangeLogSink for InMemorySink {
    async fn persist(&self, record: &ExchangeRecord) -> SaaResult<()> {
        *self.last.lock().await = Some(record.clone());
        Ok(())
    }

    fn location(&self) -> PathBuf {
        PathBuf::from("<memory>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_capitalize_only_the_first_letter() {
        assert_eq!(ExchangeRole::User.heading(), "User");
        assert_eq!(ExchangeRole::MainAssistant.heading(), "Main_assistant");
        assert_eq!(ExchangeRole::RefinerAssistant.heading(), "Refiner_assistant");
    }

    #[test]
    fn recording_a_task_adds_one_worker_exchange() {
        let mut state = WorkflowState::new();
        state.push_exchange(ExchangeRole::User, "Build app");
        let mut task = SubTask::new("API", "Design the API");
        task.result = Some("R1".into());
        state.record_task(task);

        assert_eq!(state.tasks().len(), 1);
        assert_eq!(state.count_role(ExchangeRole::SubAssistant), 1);
        assert_eq!(state.exchanges()[1].content, "R1");
    }

    #[test]
    fn worker_exchange_without_a_task_is_ignored() {
        let mut state = WorkflowState::new();
        state.push_exchange(ExchangeRole::User, "Build app");
        state.push_exchange(ExchangeRole::SubAssistant, "orphan result");

        assert_eq!(state.exchanges().len(), 1);
        assert_eq!(state.count_role(ExchangeRole::SubAssistant), 0);
        assert!(state.tasks().is_empty());
    }

    #[test]
    fn markdown_has_all_sections_in_order() {
        let record = ExchangeRecord {
            objective: "Test objective".into(),
            exchanges: vec![
                Exchange::new(ExchangeRole::User, "Test objective"),
                Exchange::new(ExchangeRole::MainAssistant, "Test response"),
            ],
            final_output: "Test output".into(),
        };
        let md = record.to_markdown();

        assert!(md.starts_with("# SAA Orchestrator Exchange Log\n\n## Objective\nTest objective\n\n"));
        let breakdown = md.find("## Task Breakdown and Execution").unwrap();
        let main = md.find("### Main_assistant\nTest response").unwrap();
        let output = md.find("## Final Output\nTest output\n").unwrap();
        assert!(breakdown < main && main < output);
    }

    #[test]
    fn roles_serialize_in_snake_case() {
        assert_eq!(
            serde_json::to_string(&ExchangeRole::RefinerAssistant).unwrap(),
            "\"refiner_assistant\""
        );
    }
}
