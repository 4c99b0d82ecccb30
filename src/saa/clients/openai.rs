//! The `OpenAIClient` struct implements `ClientWrapper` for OpenAI's Chat API,
//! capturing both the assistant response and token usage for the last call.
//!
//! It is also the transport the Claude and Grok wrappers delegate to, since both vendors
//! expose an OpenAI-compatible surface.
//!
//! # Example
//!
//! ```rust,no_run
//! use saa_orchestrator::clients::openai::{Model, OpenAIClient};
//! use saa_orchestrator::client_wrapper::{ClientWrapper, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let secret_key = std::env::var("OPENAI_API_KEY")?;
//!     let client = OpenAIClient::new_with_model_enum(&secret_key, Model::GPT4oMini);
//!
//!     let resp = client
//!         .send_message(&[Message::system("You are an assistant."), Message::user("Hello!")])
//!         .await?;
//!     println!("Assistant: {}", resp.content);
//!
//!     if let Some(usage) = client.get_last_usage().await {
//!         println!("Tokens: {} in / {} out", usage.input_tokens, usage.output_tokens);
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use openai_rust2 as openai_rust;
use tokio::sync::Mutex;

use crate::client_wrapper::{ClientError, ClientWrapper, Message, Role, TokenUsage};
use crate::clients::common::{format_messages, get_shared_http_client, send_and_track};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Model identifiers supported by OpenAI's Chat Completions API.
#[derive(Debug, Clone, Copy)]
pub enum Model {
    /// `gpt-4o` – Omni model with text + image inputs.
    GPT4o,
    /// `gpt-4o-mini` – cost effective GPT-4o derivative.
    GPT4oMini,
    /// `gpt-4.1` – general availability GPT-4.1.
    GPT41,
    /// `gpt-4.1-mini` – reduced cost GPT-4.1 tier.
    GPT41Mini,
    /// `gpt-4-turbo`
    GPT4Turbo,
    /// `gpt-3.5-turbo` – the fallback model of earlier releases.
    GPT35Turbo,
    /// `o3-mini` – compact reasoning model.
    O3Mini,
}

/// Convert a [`Model`] variant into the string identifier expected by the REST API.
pub fn model_to_string(model: Model) -> String {
    match model {
        Model::GPT4o => "gpt-4o".to_string(),
        Model::GPT4oMini => "gpt-4o-mini".to_string(),
        Model::GPT41 => "gpt-4.1".to_string(),
        Model::GPT41Mini => "gpt-4.1-mini".to_string(),
        Model::GPT4Turbo => "gpt-4-turbo".to_string(),
        Model::GPT35Turbo => "gpt-3.5-turbo".to_string(),
        Model::O3Mini => "o3-mini".to_string(),
    }
}

/// Client wrapper for OpenAI's Chat Completions API (or any compatible endpoint).
pub struct OpenAIClient {
    /// Underlying HTTP client used to issue requests.
    client: openai_rust::Client,
    base_url: String,
    /// Model name that will be injected into each request.
    model: String,
    /// Storage for the token usage returned by the most recent request.
    token_usage: Mutex<Option<TokenUsage>>,
}

impl OpenAIClient {
    /// Construct a new client using the provided API key and [`Model`] variant.
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_string(secret_key, &model_to_string(model))
    }

    /// Construct a new client using the provided API key and explicit model name.
    pub fn new_with_model_string(secret_key: &str, model_name: &str) -> Self {
        OpenAIClient {
            client: openai_rust::Client::new_with_client(
                secret_key,
                get_shared_http_client().clone(),
            ),
            base_url: OPENAI_BASE_URL.to_string(),
            model: model_name.to_string(),
            token_usage: Mutex::new(None),
        }
    }

    /// Construct a client targeting a custom OpenAI compatible base URL.
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        OpenAIClient {
            client: openai_rust::Client::new_with_client_and_base_url(
                secret_key,
                get_shared_http_client().clone(),
                base_url,
            ),
            base_url: base_url.to_string(),
            model: model_name.to_string(),
            token_usage: Mutex::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ClientWrapper for OpenAIClient {
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ClientError> {
        let content = send_and_track(
            &self.client,
            &self.model,
            format_messages(messages),
            Some(CHAT_COMPLETIONS_PATH.to_string()),
            &self.token_usage,
        )
        .await
        .map_err(|err| {
            log::error!("OpenAIClient::send_message(...) [{}]: {}", self.model, err);
            err
        })?;

        Ok(Message {
            role: Role::Assistant,
            content,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_client_has_no_usage_yet() {
        let client = OpenAIClient::new_with_model_enum("dummy", Model::GPT35Turbo);
        assert_eq!(client.model_name(), "gpt-3.5-turbo");
        assert_eq!(client.base_url(), OPENAI_BASE_URL);
        assert!(client.get_last_usage().await.is_none());
    }
}
