//! Transport shared by every provider client.
//!
//! All supported vendors expose an OpenAI-compatible chat completions endpoint, so every
//! wrapper drives an [`openai_rust::Client`] built on one pooled [`reqwest::Client`].

use crate::client_wrapper::{ClientError, Message, TokenUsage};
use lazy_static::lazy_static;
use openai_rust::chat;
use openai_rust2 as openai_rust;
use std::time::Duration;
use tokio::sync::Mutex;

lazy_static! {
    /// Process-wide HTTP client. reqwest clients are `Arc` internally, so every provider
    /// client clones this one and shares its connection pool.
    static ref SHARED_HTTP_CLIENT: reqwest::Client = build_http_client();
}

fn build_http_client() -> reqwest::Client {
    reqwest::ClientBuilder::new()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(300))
        .build()
        .unwrap_or_else(|err| {
            log::warn!(
                "saa::clients::common: pooled HTTP client could not be built ({}), using defaults",
                err
            );
            reqwest::Client::new()
        })
}

/// Get the shared, connection-pooled HTTP client.
pub fn get_shared_http_client() -> &'static reqwest::Client {
    &SHARED_HTTP_CLIENT
}

/// Convert conversation messages into the wire format expected by `openai_rust`.
pub fn format_messages(messages: &[Message]) -> Vec<chat::Message> {
    messages
        .iter()
        .map(|msg| chat::Message {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        })
        .collect()
}

/// Send a chat request, record its usage, and return the assistant's content.
pub async fn send_and_track(
    api: &openai_rust::Client,
    model: &str,
    formatted_msgs: Vec<chat::Message>,
    url_path: Option<String>,
    usage_slot: &Mutex<Option<TokenUsage>>,
) -> Result<String, ClientError> {
    let chat_arguments = chat::ChatArguments::new(model, formatted_msgs);
    let response = api.create_chat(chat_arguments, url_path).await;

    match response {
        Ok(response) => {
            let usage = TokenUsage {
                input_tokens: response.usage.prompt_tokens as usize,
                output_tokens: response.usage.completion_tokens as usize,
                total_tokens: response.usage.total_tokens as usize,
            };

            // Store it for get_last_usage()
            *usage_slot.lock().await = Some(usage);

            let choice = response
                .choices
                .first()
                .ok_or("chat completion response contained no choices")?;
            Ok(choice.message.content.clone())
        }
        Err(err) => {
            log::error!(
                "saa::clients::common::send_and_track(...): API Error [{}]: {}",
                model,
                err
            );
            Err(err.into())
        }
    }
}
