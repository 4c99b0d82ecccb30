//! The orchestrator: Plan → (Execute) → Summarize → Log.
//!
//! An [`Orchestrator`] owns three kinds of assistants, all built from an immutable
//! [`OrchestratorConfig`]:
//!
//! - the **main assistant**, whose client the [`Planner`] uses to decide whether the
//!   objective can be answered directly or must be split into sub-tasks;
//! - the **workers** of a [`WorkerPool`], which execute sub-tasks concurrently;
//! - the **refiner assistant**, which the [`Summarizer`] uses to fold the worker results
//!   into one answer.
//!
//! # Workflow phases
//!
//! ```text
//! Started ──► Planned ──┬──────────────► Summarized ──► Logged ──► Done
//!                       └─► Executing ──┘
//!    (any error) ──► Failed
//! ```
//!
//! 1. **Started**: the objective is recorded as a `user` exchange and the planning prompt is
//!    chosen: the named plugin, else the configured custom template (with `{objective}`
//!    substituted), else the default template asking for `num_workers` sub-tasks.
//! 2. **Planned**: the planner's explanation (plus the numbered sub-task titles when the
//!    objective was split) is recorded as a `main_assistant` exchange.
//! 3. **Executing**: only for split objectives. Every sub-task runs on the pool; each
//!    result is recorded as a `sub_assistant` exchange, in plan order.
//! 4. **Summarized**: a directly answered objective uses the explanation verbatim; a split
//!    one gets a single refiner call, recorded as a `refiner_assistant` exchange.
//! 5. **Logged**: the objective, every exchange and the final output go to the
//!    [`ExchangeLogSink`].
//! 6. **Done**: the final output is returned.
//!
//! Any error along the way ends the run in **Failed** and surfaces as a single
//! [`SaaError::WorkflowFailure`] wrapping the cause. Nothing is persisted for failed runs.
//!
//! The state of a run lives in the `run` call, so one orchestrator can serve several
//! workflows at the same time.
//!
//! # Workspace
//!
//! [`Orchestrator::new`] gives the workers and the refiner a [`FileSystemTool`] rooted at
//! `output_dir`, next to `exchange_log.md`. Workers are told to create, read or list files
//! there; the refiner is told it can list and read them. The planner has no tools.
//!
//! # Example
//!
//! ```rust,no_run
//! use saa_orchestrator::{init_logger, Orchestrator, OrchestratorConfig};
//!
//! # async fn demo() -> saa_orchestrator::SaaResult<()> {
//! init_logger();
//! let config = OrchestratorConfig::from_env()?.with_num_workers(4);
//! let orchestrator = Orchestrator::new(config)?;
//!
//! let answer = orchestrator
//!     .run_workflow("Plan a three-day trip to Lisbon", Some("project_planning"))
//!     .await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

use crate::assistant::{Assistant, RetryPolicy};
use crate::config::OrchestratorConfig;
use crate::error::{SaaError, SaaResult};
use crate::event::{EventHandler, WorkflowEvent};
use crate::exchange_log::{
    ExchangeLogSink, ExchangeRecord, ExchangeRole, MarkdownFileSink, WorkflowState,
};
use crate::planner::Planner;
use crate::plugins::PluginRegistry;
use crate::summarizer::Summarizer;
use crate::tools::FileSystemTool;
use crate::workers::WorkerPool;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub const MAIN_ASSISTANT_NAME: &str = "MainAssistant";
pub const REFINER_ASSISTANT_NAME: &str = "RefinerAssistant";

/// Placeholder replaced by the objective in custom prompt templates.
pub const OBJECTIVE_PLACEHOLDER: &str = "{objective}";

/// Phases of one workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Started,
    Planned,
    Executing,
    Summarized,
    Logged,
    Done,
    Failed,
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowPhase::Started => "started",
            WorkflowPhase::Planned => "planned",
            WorkflowPhase::Executing => "executing",
            WorkflowPhase::Summarized => "summarized",
            WorkflowPhase::Logged => "logged",
            WorkflowPhase::Done => "done",
            WorkflowPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub run_id: Uuid,
    pub final_output: String,
    /// Every exchange and completed sub-task of the run.
    pub state: WorkflowState,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl WorkflowReport {
    /// `true` when the planner answered the objective without sub-tasks.
    pub fn answered_directly(&self) -> bool {
        self.state.tasks().is_empty()
    }
}

pub struct Orchestrator {
    config: OrchestratorConfig,
    main_assistant: Assistant,
    refiner_assistant: Assistant,
    workers: WorkerPool,
    planner: Planner,
    summarizer: Summarizer,
    plugins: Arc<PluginRegistry>,
    exchange_log: Arc<dyn ExchangeLogSink>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl Orchestrator {
    /// Build every assistant from `config`.
    ///
    /// Fails with [`SaaError::Configuration`] on invalid settings or missing credentials,
    /// and with [`SaaError::UnsupportedModel`] for model names no client family claims.
    pub fn new(config: OrchestratorConfig) -> SaaResult<Self> {
        config.validate()?;
        let retry = RetryPolicy::new(config.max_retries, config.retry_delay);
        let keys = &config.credentials;

        let main = Assistant::from_model(MAIN_ASSISTANT_NAME, &config.main_assistant_model, keys)?
            .with_retry_policy(retry);
        let refiner =
            Assistant::from_model(REFINER_ASSISTANT_NAME, &config.refiner_assistant_model, keys)?
                .with_retry_policy(retry);
        let workers = (0..config.num_workers)
            .map(|i| {
                Assistant::from_model(format!("Worker{}", i), &config.sub_assistant_model, keys)
                    .map(|worker| worker.with_retry_policy(retry))
            })
            .collect::<SaaResult<Vec<_>>>()?;

        log::info!(
            "Orchestrator ready: main={}, workers={}x{}, refiner={}",
            config.main_assistant_model,
            config.num_workers,
            config.sub_assistant_model,
            config.refiner_assistant_model
        );
        Ok(Orchestrator::from_parts(config, main, workers, refiner).with_workspace_tools())
    }

    /// Assemble an orchestrator from ready-made assistants.
    ///
    /// Model names in `config` are ignored; `num_workers` still sets the number of
    /// sub-tasks the planner is asked for. Useful with custom or mock clients. No file
    /// tools are attached; see [`Orchestrator::with_workspace_tools`].
    pub fn from_parts(
        config: OrchestratorConfig,
        main_assistant: Assistant,
        workers: Vec<Assistant>,
        refiner_assistant: Assistant,
    ) -> Self {
        let exchange_log: Arc<dyn ExchangeLogSink> =
            Arc::new(MarkdownFileSink::in_dir(&config.output_dir));
        Orchestrator {
            planner: Planner::new(config.num_workers),
            summarizer: Summarizer::new(),
            workers: WorkerPool::new(workers),
            plugins: Arc::new(PluginRegistry::with_builtin_plugins()),
            exchange_log,
            event_handler: None,
            main_assistant,
            refiner_assistant,
            config,
        }
    }

    /// Give the workers and the refiner file tools rooted at `config.output_dir`.
    pub fn with_workspace_tools(mut self) -> Self {
        let root = self.config.output_dir.clone();
        let tools = Arc::new(
            FileSystemTool::new()
                .with_root_path(root.clone())
                .into_registry(),
        );
        log::debug!("Workspace tools rooted at {}", root.display());

        self.workers = self.workers.with_workspace(root.clone(), Arc::clone(&tools));
        self.refiner_assistant = self.refiner_assistant.with_tools(tools);
        self.summarizer = self.summarizer.with_workspace(root);
        self
    }

    pub fn with_plugins(mut self, plugins: Arc<PluginRegistry>) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn with_exchange_log_sink(mut self, sink: Arc<dyn ExchangeLogSink>) -> Self {
        self.exchange_log = sink;
        self
    }

    /// Register a handler for workflow events; the worker pool reports to it as well.
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.workers.set_event_handler(Some(Arc::clone(&handler)));
        self.event_handler = Some(handler);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn worker_pool(&self) -> &WorkerPool {
        &self.workers
    }

    async fn emit(&self, event: WorkflowEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_workflow_event(&event).await;
        }
    }

    /// The prompt handed to the planner for `objective`.
    pub fn select_prompt(&self, objective: &str, use_case: Option<&str>) -> SaaResult<String> {
        if let Some(name) = use_case {
            log::info!("Using plugin: {}", name);
            return self.plugins.prompt_for(name, objective);
        }
        if let Some(template) = &self.config.custom_prompt_template {
            log::info!("Using custom prompt template");
            return Ok(template.replace(OBJECTIVE_PLACEHOLDER, objective));
        }
        Ok(format!(
            "Objective: {}\n\nBreak this objective down into {} specific sub-tasks, or answer it directly if no breakdown is needed.",
            objective, self.config.num_workers
        ))
    }

    /// Run the workflow and return only the final output.
    pub async fn run_workflow(&self, objective: &str, use_case: Option<&str>) -> SaaResult<String> {
        self.run(objective, use_case)
            .await
            .map(|report| report.final_output)
    }

    /// Run the workflow for `objective`, optionally through the plugin named `use_case`.
    pub async fn run(&self, objective: &str, use_case: Option<&str>) -> SaaResult<WorkflowReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        log::info!("Starting workflow {} with objective: {}", run_id, objective);
        self.emit(WorkflowEvent::RunStarted {
            run_id,
            objective: objective.to_string(),
            use_case: use_case.map(str::to_string),
        })
        .await;

        match self.drive(run_id, objective, use_case).await {
            Ok((final_output, state)) => {
                log::info!("Workflow {} phase: {}", run_id, WorkflowPhase::Done);
                self.emit(WorkflowEvent::RunCompleted {
                    run_id,
                    exchange_count: state.exchanges().len(),
                    output_length: final_output.len(),
                })
                .await;
                Ok(WorkflowReport {
                    run_id,
                    final_output,
                    state,
                    started_at,
                    finished_at: Utc::now(),
                })
            }
            Err(cause) => {
                let err = SaaError::workflow(cause);
                log::error!(
                    "Workflow {} phase: {}: {}",
                    run_id,
                    WorkflowPhase::Failed,
                    err
                );
                self.emit(WorkflowEvent::RunFailed {
                    run_id,
                    error: err.cause().to_string(),
                })
                .await;
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        run_id: Uuid,
        objective: &str,
        use_case: Option<&str>,
    ) -> SaaResult<(String, WorkflowState)> {
        let mut state = WorkflowState::new();

        // Started
        state.push_exchange(ExchangeRole::User, objective);
        log::info!("Workflow {} phase: {}", run_id, WorkflowPhase::Started);
        let prompt = self.select_prompt(objective, use_case)?;
        log::debug!("Planning prompt: {}", prompt);

        // Planned
        let plan = self.planner.plan(&prompt, &self.main_assistant).await?;
        state.push_exchange(ExchangeRole::MainAssistant, plan.announcement());
        log::info!("Workflow {} phase: {}", run_id, WorkflowPhase::Planned);
        self.emit(WorkflowEvent::PlanReady {
            run_id,
            objective_completion: plan.objective_completion,
            task_count: plan.tasks.len(),
        })
        .await;

        let final_output = if plan.objective_completion {
            log::info!("Objective completed without sub-tasks");
            plan.explanation
        } else {
            // Executing
            log::info!("Workflow {} phase: {}", run_id, WorkflowPhase::Executing);
            let completed = self.workers.execute_batch(plan.tasks).await?;
            for task in completed {
                state.record_task(task);
            }

            // Summarized
            let summary = self
                .summarizer
                .summarize(objective, state.tasks(), &self.refiner_assistant)
                .await?;
            state.push_exchange(ExchangeRole::RefinerAssistant, summary.as_str());
            self.emit(WorkflowEvent::SummaryReady {
                run_id,
                length: summary.len(),
            })
            .await;
            summary
        };
        log::info!("Workflow {} phase: {}", run_id, WorkflowPhase::Summarized);

        // Logged
        let record = ExchangeRecord {
            objective: objective.to_string(),
            exchanges: state.exchanges().to_vec(),
            final_output: final_output.clone(),
        };
        self.exchange_log.persist(&record).await?;
        log::info!("Workflow {} phase: {}", run_id, WorkflowPhase::Logged);
        self.emit(WorkflowEvent::ExchangeLogSaved {
            run_id,
            location: self.exchange_log.location(),
        })
        .await;

        Ok((final_output, state))
    }
}
