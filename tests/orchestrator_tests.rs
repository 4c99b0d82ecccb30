use async_trait::async_trait;
use saa_orchestrator::client_wrapper::{ClientError, ClientWrapper, Message, Role};
use saa_orchestrator::event::{EventHandler, WorkflowEvent};
use saa_orchestrator::exchange_log::{ExchangeRole, InMemorySink, MarkdownFileSink};
use saa_orchestrator::plugins::{Plugin, PluginRegistry};
use saa_orchestrator::{Assistant, Orchestrator, OrchestratorConfig, RetryPolicy, SaaError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Returns a fixed response (or error) and remembers every prompt it saw.
struct ScriptedClient {
    name: String,
    response: Result<String, String>,
    call_count: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn ok(name: &str, response: &str) -> Arc<Self> {
        Arc::new(ScriptedClient {
            name: name.to_string(),
            response: Ok(response.to_string()),
            call_count: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(name: &str, error: &str) -> Arc<Self> {
        Arc::new(ScriptedClient {
            name: name.to_string(),
            response: Err(error.to_string()),
            call_count: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientWrapper for ScriptedClient {
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ClientError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(last) = messages.last() {
            self.prompts.lock().await.push(last.content.clone());
        }
        match &self.response {
            Ok(text) => Ok(Message {
                role: Role::Assistant,
                content: text.clone(),
            }),
            Err(err) => Err(err.clone().into()),
        }
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// Answers prompts containing "FAIL" with an error, anything else with "R-<prompt>".
struct WorkerClient {
    call_count: AtomicUsize,
}

#[async_trait]
impl ClientWrapper for WorkerClient {
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ClientError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let prompt = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        if prompt.contains("FAIL") {
            return Err("worker exploded".into());
        }
        // Keyed on the prompt so results stay deterministic under concurrency.
        Ok(Message {
            role: Role::Assistant,
            content: format!("R-{}", prompt),
        })
    }

    fn model_name(&self) -> &str {
        "worker-model"
    }
}

struct Harness {
    main: Arc<ScriptedClient>,
    worker: Arc<WorkerClient>,
    refiner: Arc<ScriptedClient>,
    sink: Arc<InMemorySink>,
    orchestrator: Orchestrator,
}

fn no_retry() -> RetryPolicy {
    RetryPolicy::new(1, Duration::ZERO)
}

fn harness_with(
    config: OrchestratorConfig,
    main: Arc<ScriptedClient>,
    refiner: Arc<ScriptedClient>,
) -> Harness {
    let worker = Arc::new(WorkerClient {
        call_count: AtomicUsize::new(0),
    });
    let workers = (0..config.num_workers)
        .map(|i| Assistant::new(format!("Worker{}", i), worker.clone()).with_retry_policy(no_retry()))
        .collect();
    let sink = Arc::new(InMemorySink::new());
    let orchestrator = Orchestrator::from_parts(
        config,
        Assistant::new("MainAssistant", main.clone()).with_retry_policy(no_retry()),
        workers,
        Assistant::new("RefinerAssistant", refiner.clone()).with_retry_policy(no_retry()),
    )
    .with_exchange_log_sink(sink.clone());

    Harness {
        main,
        worker,
        refiner,
        sink,
        orchestrator,
    }
}

fn harness(plan_json: &str) -> Harness {
    harness_with(
        OrchestratorConfig::default().with_num_workers(2),
        ScriptedClient::ok("main-model", plan_json),
        ScriptedClient::ok("refiner-model", "Final"),
    )
}

const HAIKU_PLAN: &str =
    r#"{"objective_completion": true, "explanation": "Haiku text", "tasks": []}"#;

const BUILD_APP_PLAN: &str = r#"{
    "objective_completion": false,
    "explanation": "Two parts.",
    "tasks": [
        {"task": "Backend", "prompt": "build the backend"},
        {"task": "Frontend", "prompt": "build the frontend"}
    ]
}"#;

#[tokio::test]
async fn test_direct_answer_skips_workers_and_refiner() {
    let h = harness(HAIKU_PLAN);

    let report = h
        .orchestrator
        .run("Write a haiku about Rust", None)
        .await
        .unwrap();

    assert_eq!(report.final_output, "Haiku text");
    assert!(report.answered_directly());
    assert_eq!(
        report.state.roles(),
        vec![ExchangeRole::User, ExchangeRole::MainAssistant]
    );
    assert_eq!(report.state.exchanges()[1].content, "Haiku text");
    assert_eq!(h.main.calls(), 1);
    assert_eq!(h.worker.call_count.load(Ordering::SeqCst), 0);
    assert_eq!(h.refiner.calls(), 0);

    let record = h.sink.last_record().await.unwrap();
    assert_eq!(record.final_output, "Haiku text");
    assert_eq!(record.exchanges.len(), 2);
}

#[tokio::test]
async fn test_decomposed_run_records_every_exchange_in_order() {
    let h = harness(BUILD_APP_PLAN);

    let report = h.orchestrator.run("Build app", None).await.unwrap();

    assert_eq!(report.final_output, "Final");
    assert_eq!(
        report.state.roles(),
        vec![
            ExchangeRole::User,
            ExchangeRole::MainAssistant,
            ExchangeRole::SubAssistant,
            ExchangeRole::SubAssistant,
            ExchangeRole::RefinerAssistant,
        ]
    );
    let exchanges = report.state.exchanges();
    assert_eq!(exchanges[0].content, "Build app");
    assert_eq!(
        exchanges[1].content,
        "Two parts.\n\nSub-tasks:\n1. Backend\n2. Frontend"
    );
    assert_eq!(exchanges[2].content, "R-build the backend");
    assert_eq!(exchanges[3].content, "R-build the frontend");
    assert_eq!(exchanges[4].content, "Final");

    assert_eq!(report.state.tasks().len(), 2);
    assert_eq!(report.state.count_role(ExchangeRole::SubAssistant), 2);
    assert_eq!(h.refiner.calls(), 1);
    assert_eq!(h.worker.call_count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_refiner_sees_objective_and_every_result() {
    let h = harness(BUILD_APP_PLAN);

    h.orchestrator.run_workflow("Build app", None).await.unwrap();

    let prompts = h.refiner.prompts.lock().await;
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with("Objective: Build app\n\nTask results:\n"));
    assert!(prompts[0].contains("Task: Backend\nResult: R-build the backend"));
    assert!(prompts[0].contains("Task: Frontend\nResult: R-build the frontend"));
}

#[tokio::test]
async fn test_failed_sub_task_reaches_the_summary() {
    let plan = r#"{
        "objective_completion": false,
        "explanation": "Three parts.",
        "tasks": [
            {"task": "A", "prompt": "a"},
            {"task": "B", "prompt": "please FAIL"},
            {"task": "C", "prompt": "c"}
        ]
    }"#;
    let h = harness(plan);

    let report = h.orchestrator.run("Do things", None).await.unwrap();

    let tasks = report.state.tasks();
    assert_eq!(tasks.len(), 3);
    assert!(tasks[1].result_text().starts_with("Error:"));
    assert!(!tasks[0].is_failed() && !tasks[2].is_failed());
    assert_eq!(report.state.count_role(ExchangeRole::SubAssistant), 3);
    assert_eq!(h.refiner.calls(), 1);
    assert!(h.refiner.prompts.lock().await[0].contains("Task: B\nResult: Error:"));
}

#[tokio::test]
async fn test_unknown_plugin_fails_before_any_call() {
    let h = harness(HAIKU_PLAN);

    let err = h
        .orchestrator
        .run_workflow("Anything", Some("NonExistentPlugin"))
        .await
        .unwrap_err();

    assert!(matches!(err, SaaError::WorkflowFailure { .. }));
    assert!(matches!(err.cause(), SaaError::PluginNotFound(name) if name == "NonExistentPlugin"));
    assert!(err.to_string().contains("Plugin 'NonExistentPlugin' not found"));
    assert_eq!(h.main.calls(), 0);
    assert_eq!(h.refiner.calls(), 0);
    assert!(h.sink.last_record().await.is_none());
}

#[tokio::test]
async fn test_plugin_prompt_is_forwarded_to_the_planner() {
    let mut registry = PluginRegistry::new();
    registry.register(Plugin::new("test_plugin", "test", |objective| {
        format!("Test prompt for {}", objective)
    }));
    let h = harness(HAIKU_PLAN);
    let orchestrator = h.orchestrator.with_plugins(Arc::new(registry));

    orchestrator
        .run_workflow("Test objective", Some("test_plugin"))
        .await
        .unwrap();

    let prompts = h.main.prompts.lock().await;
    assert!(prompts[0].contains("Objective: Test prompt for Test objective"));
}

#[tokio::test]
async fn test_custom_template_is_used_without_plugin() {
    let h = harness_with(
        OrchestratorConfig::default()
            .with_num_workers(2)
            .with_custom_prompt_template("Custom: {objective}"),
        ScriptedClient::ok("main-model", HAIKU_PLAN),
        ScriptedClient::ok("refiner-model", "Final"),
    );

    h.orchestrator.run_workflow("Bake bread", None).await.unwrap();

    let prompts = h.main.prompts.lock().await;
    assert!(prompts[0].contains("Objective: Custom: Bake bread"));
    assert!(prompts[0].contains("into 2 subtasks"));
}

#[tokio::test]
async fn test_malformed_plan_fails_and_writes_no_log() {
    let h = harness("I think you should just do it.");

    let err = h.orchestrator.run_workflow("Build app", None).await.unwrap_err();

    assert!(matches!(err.cause(), SaaError::PlanningFailure(_)));
    assert!(err.to_string().starts_with("Workflow failed: Planning failed:"));
    assert!(h.sink.last_record().await.is_none());
}

#[tokio::test]
async fn test_refiner_failure_is_wrapped() {
    let h = harness_with(
        OrchestratorConfig::default().with_num_workers(2),
        ScriptedClient::ok("main-model", BUILD_APP_PLAN),
        ScriptedClient::failing("refiner-model", "503 Service Unavailable"),
    );

    let err = h.orchestrator.run_workflow("Build app", None).await.unwrap_err();

    match err.cause() {
        SaaError::AssistantFailure {
            assistant, cause, ..
        } => {
            assert_eq!(assistant, "RefinerAssistant");
            assert_eq!(cause, "503 Service Unavailable");
        }
        other => panic!("unexpected cause: {:?}", other),
    }
    assert!(h.sink.last_record().await.is_none());
}

#[tokio::test]
async fn test_markdown_log_is_written_to_the_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let main = ScriptedClient::ok("main-model", BUILD_APP_PLAN);
    let refiner = ScriptedClient::ok("refiner-model", "Final");
    let worker = Arc::new(WorkerClient {
        call_count: AtomicUsize::new(0),
    });
    let config = OrchestratorConfig::default()
        .with_num_workers(2)
        .with_output_dir(dir.path().join("output"));
    let log_path = config.exchange_log_path();
    let orchestrator = Orchestrator::from_parts(
        config,
        Assistant::new("MainAssistant", main).with_retry_policy(no_retry()),
        vec![Assistant::new("Worker0", worker).with_retry_policy(no_retry())],
        Assistant::new("RefinerAssistant", refiner).with_retry_policy(no_retry()),
    );

    orchestrator.run_workflow("Build app", None).await.unwrap();

    let content = std::fs::read_to_string(&log_path).unwrap();
    assert!(content.starts_with("# SAA Orchestrator Exchange Log\n\n## Objective\nBuild app\n\n"));
    assert!(content.contains("## Task Breakdown and Execution"));
    assert!(content.contains("### User\nBuild app"));
    assert!(content.contains("### Main_assistant\nTwo parts."));
    assert_eq!(content.matches("### Sub_assistant").count(), 2);
    assert!(content.contains("### Refiner_assistant\nFinal"));
    assert!(content.ends_with("## Final Output\nFinal\n"));
}

#[tokio::test]
async fn test_markdown_sink_overwrites_previous_log() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(MarkdownFileSink::in_dir(dir.path()));
    let h = harness(HAIKU_PLAN);
    let orchestrator = h.orchestrator.with_exchange_log_sink(sink.clone());

    orchestrator.run_workflow("First", None).await.unwrap();
    orchestrator.run_workflow("Second", None).await.unwrap();

    let content = std::fs::read_to_string(sink.path()).unwrap();
    assert!(content.contains("## Objective\nSecond"));
    assert!(!content.contains("## Objective\nFirst"));
}

#[derive(Default)]
struct RecordingHandler {
    events: Mutex<Vec<WorkflowEvent>>,
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn on_workflow_event(&self, event: &WorkflowEvent) {
        self.events.lock().await.push(event.clone());
    }
}

#[tokio::test]
async fn test_events_cover_the_whole_run() {
    let handler = Arc::new(RecordingHandler::default());
    let h = harness(BUILD_APP_PLAN);
    let orchestrator = h.orchestrator.with_event_handler(handler.clone());

    let report = orchestrator.run("Build app", None).await.unwrap();

    let events = handler.events.lock().await;
    assert!(matches!(events.first(), Some(WorkflowEvent::RunStarted { run_id, .. }) if *run_id == report.run_id));
    assert!(events.iter().any(|e| matches!(
        e,
        WorkflowEvent::PlanReady { objective_completion: false, task_count: 2, .. }
    )));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, WorkflowEvent::TaskCompleted { .. }))
            .count(),
        2
    );
    assert!(events.iter().any(|e| matches!(e, WorkflowEvent::SummaryReady { .. })));
    assert!(events.iter().any(|e| matches!(e, WorkflowEvent::ExchangeLogSaved { .. })));
    assert!(matches!(
        events.last(),
        Some(WorkflowEvent::RunCompleted { exchange_count: 5, .. })
    ));
}

#[tokio::test]
async fn test_failed_run_emits_run_failed() {
    let handler = Arc::new(RecordingHandler::default());
    let h = harness("not json");
    let orchestrator = h.orchestrator.with_event_handler(handler.clone());

    assert!(orchestrator.run("Build app", None).await.is_err());

    let events = handler.events.lock().await;
    match events.last() {
        Some(WorkflowEvent::RunFailed { error, .. }) => {
            assert!(error.starts_with("Planning failed:"))
        }
        other => panic!("unexpected last event: {:?}", other),
    }
}

#[tokio::test]
async fn test_concurrent_runs_keep_separate_state() {
    let h = harness(BUILD_APP_PLAN);

    let (first, second) = tokio::join!(
        h.orchestrator.run("First objective", None),
        h.orchestrator.run("Second objective", None)
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.state.exchanges().len(), 5);
    assert_eq!(second.state.exchanges().len(), 5);
    assert_eq!(first.state.exchanges()[0].content, "First objective");
    assert_eq!(second.state.exchanges()[0].content, "Second objective");
    assert_eq!(h.refiner.calls(), 2);
}

/// Saves its work through the `create_file` tool, then reports where it went.
struct FileWritingWorker;

#[async_trait]
impl ClientWrapper for FileWritingWorker {
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ClientError> {
        let content = if messages.len() == 2 {
            // "build the backend ..." becomes backend.md
            let prompt = &messages[1].content;
            let part = prompt.split_whitespace().nth(2).unwrap_or("part");
            format!(
                r#"{{"tool_call": {{"name": "create_file", "parameters": {{"path": "parts/{}.md", "content": "{} done"}}}}}}"#,
                part, part
            )
        } else {
            "saved".to_string()
        };
        Ok(Message {
            role: Role::Assistant,
            content,
        })
    }

    fn model_name(&self) -> &str {
        "file-worker"
    }
}

#[tokio::test]
async fn test_workspace_tools_write_into_the_output_dir() {
    let out = tempfile::tempdir().unwrap();
    let config = OrchestratorConfig::default()
        .with_num_workers(2)
        .with_output_dir(out.path());
    let main = ScriptedClient::ok("main-model", BUILD_APP_PLAN);
    let refiner = ScriptedClient::ok("refiner-model", "Final");
    let workers = (0..2)
        .map(|i| {
            Assistant::new(format!("Worker{}", i), Arc::new(FileWritingWorker))
                .with_retry_policy(no_retry())
        })
        .collect();
    let sink = Arc::new(InMemorySink::new());
    let orchestrator = Orchestrator::from_parts(
        config,
        Assistant::new("MainAssistant", main.clone()).with_retry_policy(no_retry()),
        workers,
        Assistant::new("RefinerAssistant", refiner.clone()).with_retry_policy(no_retry()),
    )
    .with_exchange_log_sink(sink.clone())
    .with_workspace_tools();

    let report = orchestrator.run("Build app", None).await.unwrap();

    assert_eq!(report.final_output, "Final");
    assert_eq!(
        std::fs::read_to_string(out.path().join("parts/backend.md")).unwrap(),
        "backend done"
    );
    assert_eq!(
        std::fs::read_to_string(out.path().join("parts/frontend.md")).unwrap(),
        "frontend done"
    );
    assert!(report.state.tasks().iter().all(|t| t.result.as_deref() == Some("saved")));

    // The planner stays tool-free; the refiner is told about the directory and the tools.
    let plan_prompt = main.prompts.lock().await[0].clone();
    assert!(!plan_prompt.contains("You have access to the following tools"));
    let refine_prompt = refiner.prompts.lock().await[0].clone();
    assert!(refine_prompt.contains(&format!(
        "All files are in the '{}' directory.",
        out.path().display()
    )));
    assert!(refine_prompt.contains("- read_file: "));
}
