//! Assistant handles and the retrying invoker.
//!
//! An [`Assistant`] pairs a [`ClientWrapper`] with a display name, a system description,
//! and a [`RetryPolicy`]. It is the only capability the planner, the worker pool, and the
//! summarizer use to reach an LLM: `invoke(prompt) -> text`.
//!
//! Handles are cheap to clone (the client sits behind an `Arc`) and are never mutated
//! while a workflow runs, so the same handle can serve several concurrent calls.
//!
//! An assistant given a [`ToolRegistry`] lists its tools in the prompt. When a reply
//! contains a `{"tool_call": ...}` fragment the tool runs, its outcome is sent back as the
//! next user message, and the conversation continues until a reply without a tool call
//! (or [`MAX_TOOL_ITERATIONS`] calls) is reached.
//!
//! ```rust,no_run
//! use saa_orchestrator::{ApiKeys, Assistant, RetryPolicy};
//!
//! # async fn demo() -> saa_orchestrator::SaaResult<()> {
//! let worker = Assistant::from_model("Worker0", "claude-3-haiku-20240307", &ApiKeys::from_env())?
//!     .with_retry_policy(RetryPolicy::default());
//! let answer = worker.invoke("Name three prime numbers.").await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

use crate::client_wrapper::{ClientWrapper, Message};
use crate::clients::create_client;
use crate::config::{ApiKeys, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
use crate::error::{SaaError, SaaResult};
use crate::tool_protocol::{parse_tool_call, ToolRegistry, ToolResult};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_DESCRIPTION: &str = "You are a helpful assistant.";

/// Tool calls honoured per `invoke`.
pub const MAX_TOOL_ITERATIONS: usize = 5;

/// How many times a call is attempted and how long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. Values below 1 are treated as 1.
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            delay,
        }
    }

    /// A single attempt, no waiting.
    pub fn no_retry() -> Self {
        RetryPolicy::new(1, Duration::ZERO)
    }
}

/// A named, retrying handle on one LLM client.
#[derive(Clone)]
pub struct Assistant {
    name: String,
    description: String,
    client: Arc<dyn ClientWrapper>,
    retry: RetryPolicy,
    tools: Option<Arc<ToolRegistry>>,
}

impl fmt::Debug for Assistant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assistant")
            .field("name", &self.name)
            .field("model", &self.client.model_name())
            .field("retry", &self.retry)
            .field("tools", &self.tools.as_ref().map_or(0, |t| t.len()))
            .finish()
    }
}

impl Assistant {
    pub fn new(name: impl Into<String>, client: Arc<dyn ClientWrapper>) -> Self {
        Assistant {
            name: name.into(),
            description: DEFAULT_DESCRIPTION.to_string(),
            client,
            retry: RetryPolicy::default(),
            tools: None,
        }
    }

    /// Build an assistant for `model`, choosing the vendor client from the model name.
    pub fn from_model(name: impl Into<String>, model: &str, keys: &ApiKeys) -> SaaResult<Self> {
        Ok(Assistant::new(name, create_client(model, keys)?))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Let the assistant call the tools in `registry` while answering.
    pub fn with_tools(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tools = Some(registry);
        self
    }

    /// A differently named and described assistant on the same client and retry policy.
    /// Tools are not carried over.
    pub fn derive(&self, name: impl Into<String>, description: impl Into<String>) -> Self {
        Assistant {
            name: name.into(),
            description: description.into(),
            client: Arc::clone(&self.client),
            retry: self.retry,
            tools: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn client(&self) -> &Arc<dyn ClientWrapper> {
        &self.client
    }

    pub fn tools(&self) -> Option<&Arc<ToolRegistry>> {
        self.tools.as_ref()
    }

    /// Send `prompt` and return the response text.
    ///
    /// Failed attempts are logged and retried after the policy's fixed delay. Once the
    /// attempts are used up the last error is returned as
    /// [`SaaError::AssistantFailure`]. With tools attached, every model call of the tool
    /// loop gets its own attempts; a failing tool is reported to the model, not to the
    /// caller.
    pub async fn invoke(&self, prompt: &str) -> SaaResult<String> {
        let Some(tools) = self.tools.as_ref().filter(|t| !t.is_empty()) else {
            let messages = [
                Message::system(self.description.as_str()),
                Message::user(prompt),
            ];
            return self.send_with_retry(&messages).await;
        };

        let mut messages = vec![
            Message::system(self.description.as_str()),
            Message::user(format!("{}{}", prompt, tool_instructions(tools))),
        ];
        let mut response = self.send_with_retry(&messages).await?;

        let mut iteration = 0;
        while let Some(call) = parse_tool_call(&response) {
            if iteration >= MAX_TOOL_ITERATIONS {
                log::warn!(
                    "{}: maximum of {} tool calls reached",
                    self.name,
                    MAX_TOOL_ITERATIONS
                );
                response = format!(
                    "{}\n\n[Warning: Maximum tool iterations reached]",
                    response
                );
                break;
            }
            iteration += 1;
            log::info!(
                "{}: tool call {} ({}/{})",
                self.name,
                call.name,
                iteration,
                MAX_TOOL_ITERATIONS
            );

            let outcome = tools.execute_tool(&call.name, call.parameters).await;
            messages.push(Message::assistant(response));
            messages.push(Message::user(tool_feedback(&call.name, outcome)));
            response = self.send_with_retry(&messages).await?;
        }

        Ok(response)
    }

    async fn send_with_retry(&self, messages: &[Message]) -> SaaResult<String> {
        let attempts = self.retry.max_attempts.max(1);

        let mut last_error = String::new();
        for attempt in 1..=attempts {
            log::debug!(
                "{} ({}): attempt {}/{}",
                self.name,
                self.client.model_name(),
                attempt,
                attempts
            );
            match self.client.send_message(messages).await {
                Ok(response) => {
                    if let Some(usage) = self.client.get_last_usage().await {
                        log::debug!(
                            "{}: {} input / {} output tokens",
                            self.name,
                            usage.input_tokens,
                            usage.output_tokens
                        );
                    }
                    return Ok(response.content);
                }
                Err(err) => {
                    log::error!("{}: attempt {} failed: {}", self.name, attempt, err);
                    last_error = err.to_string();
                    if attempt < attempts && !self.retry.delay.is_zero() {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }

        Err(SaaError::AssistantFailure {
            assistant: self.name.clone(),
            attempts,
            cause: last_error,
        })
    }
}

/// Prompt suffix describing the tools and the call format.
fn tool_instructions(tools: &ToolRegistry) -> String {
    let mut text = String::from("\n\nYou have access to the following tools:\n");
    for tool in tools.list_tools() {
        text.push_str(&format!("- {}: {}\n", tool.name, tool.description));
        if !tool.parameters.is_empty() {
            text.push_str("  Parameters:\n");
            for param in &tool.parameters {
                text.push_str(&format!(
                    "    - {} ({:?}{}): {}\n",
                    param.name,
                    param.param_type,
                    if param.required { ", required" } else { "" },
                    param.description.as_deref().unwrap_or("No description")
                ));
            }
        }
    }
    text.push_str(
        "\nTo use a tool, respond with a JSON object in the following format:\n\
         {\"tool_call\": {\"name\": \"tool_name\", \"parameters\": {...}}}\n\
         After tool execution, I'll provide the result and you can continue.\n",
    );
    text
}

/// The user message reporting a tool outcome back to the model.
fn tool_feedback(name: &str, outcome: Result<ToolResult, Box<dyn Error + Send + Sync>>) -> String {
    match outcome {
        Ok(result) if result.success => format!(
            "Tool '{}' executed successfully. Result: {}",
            name,
            serde_json::to_string_pretty(&result.output)
                .unwrap_or_else(|_| result.output.to_string())
        ),
        Ok(result) => format!(
            "Tool '{}' failed. Error: {}",
            name,
            result.error.unwrap_or_else(|| "Unknown error".to_string())
        ),
        Err(err) => format!("Tool execution error: {}", err),
    }
}
