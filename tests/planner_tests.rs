use async_trait::async_trait;
use saa_orchestrator::client_wrapper::{ClientError, ClientWrapper, Message, Role, TokenUsage};
use saa_orchestrator::planner::{Planner, PLANNER_DESCRIPTION};
use saa_orchestrator::summarizer::Summarizer;
use saa_orchestrator::{Assistant, RetryPolicy, SaaError, SubTask};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

struct SequentialMockClient {
    responses: Vec<String>,
    call_count: AtomicUsize,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl SequentialMockClient {
    fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: responses.into_iter().map(String::from).collect(),
            call_count: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ClientWrapper for SequentialMockClient {
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ClientError> {
        self.seen.lock().await.push(messages.to_vec());
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        let content = self
            .responses
            .get(idx)
            .cloned()
            .unwrap_or_else(|| "no more responses".to_string());
        Ok(Message {
            role: Role::Assistant,
            content,
        })
    }

    fn model_name(&self) -> &str {
        "sequential-mock"
    }

    async fn get_last_usage(&self) -> Option<TokenUsage> {
        None
    }
}

fn main_assistant(client: Arc<SequentialMockClient>) -> Assistant {
    Assistant::new("MainAssistant", client).with_retry_policy(RetryPolicy::new(1, Duration::ZERO))
}

#[tokio::test]
async fn test_planner_uses_the_main_client_with_planner_description() {
    let client = Arc::new(SequentialMockClient::new(vec![
        r#"{"objective_completion": true, "explanation": "Done.", "tasks": []}"#,
    ]));
    let main = main_assistant(client.clone());

    let plan = Planner::new(3).plan("Say hi", &main).await.unwrap();

    assert!(plan.objective_completion);
    assert_eq!(plan.explanation, "Done.");
    let seen = client.seen.lock().await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0][0].role, Role::System);
    assert_eq!(seen[0][0].content, PLANNER_DESCRIPTION);
    assert!(seen[0][1].content.contains("Objective: Say hi"));
    assert!(seen[0][1].content.contains("into 3 subtasks"));
}

#[tokio::test]
async fn test_planner_returns_sub_tasks_in_order() {
    let client = Arc::new(SequentialMockClient::new(vec![
        "```json\n{\"objective_completion\": false, \"explanation\": \"Split.\", \"tasks\": [{\"task\": \"A\", \"prompt\": \"pa\"}, {\"task\": \"B\", \"prompt\": \"pb\"}]}\n```",
    ]));

    let plan = Planner::new(2)
        .plan("Build app", &main_assistant(client))
        .await
        .unwrap();

    assert!(!plan.objective_completion);
    assert_eq!(plan.task_titles(), vec!["A", "B"]);
    assert!(plan.tasks.iter().all(|t| t.result.is_none()));
}

#[tokio::test]
async fn test_planner_does_not_retry_on_bad_format() {
    let client = Arc::new(SequentialMockClient::new(vec![
        "not json at all",
        r#"{"objective_completion": true, "explanation": "late", "tasks": []}"#,
    ]));

    let err = Planner::new(3)
        .plan("Anything", &main_assistant(client.clone()))
        .await
        .unwrap_err();

    assert!(matches!(err, SaaError::PlanningFailure(_)));
    assert_eq!(client.call_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_summarizer_returns_the_refiner_reply_unmodified() {
    let client = Arc::new(SequentialMockClient::new(vec!["  Final answer\n"]));
    let refiner = Assistant::new("RefinerAssistant", client.clone())
        .with_retry_policy(RetryPolicy::new(1, Duration::ZERO));
    let mut task = SubTask::new("Research", "r");
    task.result = Some("Found it".into());

    let summary = Summarizer::new()
        .summarize("Find it", &[task], &refiner)
        .await
        .unwrap();

    assert_eq!(summary, "  Final answer\n");
    let seen = client.seen.lock().await;
    assert!(seen[0][1].content.contains("Task: Research\nResult: Found it"));
}
