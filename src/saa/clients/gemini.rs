use crate::client_wrapper::{ClientError, ClientWrapper, Message, Role, TokenUsage};
use crate::clients::common::{format_messages, get_shared_http_client, send_and_track};
use async_trait::async_trait;
use log::error;
use openai_rust2 as openai_rust;
use tokio::sync::Mutex;

/// Google's Generative Language API root.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
/// OpenAI-compatible chat completions route under [`GEMINI_BASE_URL`].
const CHAT_COMPLETIONS_PATH: &str = "/v1beta/openai/chat/completions";

pub struct GeminiClient {
    client: openai_rust::Client,
    pub model: String,
    token_usage: Mutex<Option<TokenUsage>>,
}

#[derive(Debug, Clone, Copy)]
pub enum Model {
    Gemini15Pro,
    Gemini15ProPreview0409,
    Gemini15Flash,
    Gemini20Flash,
    Gemini25Flash,
    Gemini25Pro,
}

pub fn model_to_string(model: Model) -> String {
    match model {
        Model::Gemini15Pro => "gemini-1.5-pro".to_string(),
        Model::Gemini15ProPreview0409 => "gemini-1.5-pro-preview-0409".to_string(),
        Model::Gemini15Flash => "gemini-1.5-flash".to_string(),
        Model::Gemini20Flash => "gemini-2.0-flash".to_string(),
        Model::Gemini25Flash => "gemini-2.5-flash".to_string(),
        Model::Gemini25Pro => "gemini-2.5-pro".to_string(),
    }
}

impl GeminiClient {
    pub fn new_with_model_string(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, GEMINI_BASE_URL)
    }

    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_string(secret_key, &model_to_string(model))
    }

    /// This function is used to create a GeminiClient with a custom base URL
    /// The default base URL is "<https://generativelanguage.googleapis.com/v1beta/>"
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        GeminiClient {
            client: openai_rust::Client::new_with_client_and_base_url(
                secret_key,
                get_shared_http_client().clone(),
                base_url,
            ),
            model: model_name.to_string(),
            token_usage: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ClientWrapper for GeminiClient {
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ClientError> {
        // Use the shared helper to send & track usage
        let result = send_and_track(
            &self.client,
            &self.model,
            format_messages(messages),
            Some(CHAT_COMPLETIONS_PATH.to_string()),
            &self.token_usage,
        )
        .await;

        match result {
            Ok(content) => Ok(Message {
                role: Role::Assistant,
                content,
            }),
            Err(err) => {
                if log::log_enabled!(log::Level::Error) {
                    error!("GeminiClient::send_message error: {}", err);
                }
                Err(err)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    /// This function is used to get the token usage for the last request, otherwise there will be no tracking for token usage available
    /// because default trait implementation of `usage_slot()` returns `None`
    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}
