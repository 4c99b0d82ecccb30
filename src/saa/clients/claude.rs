//! Anthropic Claude client wrapper built on the OpenAI-compatible transport.
//!
//! The wrapper delegates HTTP concerns to [`OpenAIClient`], so swapping from OpenAI to
//! Claude only requires a different constructor.

use crate::client_wrapper::{ClientError, ClientWrapper, Message, TokenUsage};
use crate::clients::openai::OpenAIClient;
use async_trait::async_trait;
use tokio::sync::Mutex;

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Client wrapper for Anthropic's Claude API routed through the OpenAI compatible surface.
pub struct ClaudeClient {
    /// Delegated client that handles the HTTP interactions.
    delegate_client: OpenAIClient,
}

/// Claude models known to the orchestrator.
#[derive(Debug, Clone, Copy)]
pub enum Model {
    /// `claude-3-sonnet-20240229` – default planner model.
    Claude3Sonnet,
    /// `claude-3-haiku-20240307` – default worker model.
    Claude3Haiku,
    /// `claude-3-opus-20240229`
    Claude3Opus,
    /// `claude-3-5-sonnet-latest`
    Claude35Sonnet,
    /// `claude-sonnet-4-0`
    ClaudeSonnet4,
}

fn model_to_string(model: Model) -> String {
    match model {
        Model::Claude3Sonnet => "claude-3-sonnet-20240229".to_string(),
        Model::Claude3Haiku => "claude-3-haiku-20240307".to_string(),
        Model::Claude3Opus => "claude-3-opus-20240229".to_string(),
        Model::Claude35Sonnet => "claude-3-5-sonnet-latest".to_string(),
        Model::ClaudeSonnet4 => "claude-sonnet-4-0".to_string(),
    }
}

impl ClaudeClient {
    /// Create a client from an API key and strongly typed model variant.
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_str(secret_key, &model_to_string(model))
    }

    /// Create a client from an API key and explicit model string.
    pub fn new_with_model_str(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, ANTHROPIC_BASE_URL)
    }

    /// Create a client pointing at a custom Claude-compatible base URL.
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        ClaudeClient {
            // we reuse the OpenAIClient for Claude and delegate the calls to it
            delegate_client: OpenAIClient::new_with_base_url(secret_key, model_name, base_url),
        }
    }
}

#[async_trait]
impl ClientWrapper for ClaudeClient {
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ClientError> {
        self.delegate_client.send_message(messages).await
    }

    fn model_name(&self) -> &str {
        self.delegate_client.model_name()
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        self.delegate_client.usage_slot()
    }
}
