//! Provider specific [`ClientWrapper`] implementations and the factory that picks one
//! from a model identifier.
//!
//! Each submodule offers a concrete client that speaks a particular vendor's API while
//! conforming to the uniform [`ClientWrapper`] contract. [`create_client`] is the only
//! place that maps model names to vendors.

pub mod common;

pub mod claude;
pub mod gemini;
pub mod grok;
pub mod openai;

use crate::client_wrapper::ClientWrapper;
use crate::config::ApiKeys;
use crate::error::{SaaError, SaaResult};
use std::fmt;
use std::sync::Arc;

/// Vendor families the orchestrator can talk to.
///
/// ```
/// use saa_orchestrator::clients::ModelFamily;
///
/// assert_eq!(ModelFamily::from_model_name("claude-3-haiku-20240307").unwrap(), ModelFamily::Claude);
/// assert_eq!(ModelFamily::from_model_name("gpt-4o").unwrap(), ModelFamily::OpenAI);
/// assert!(ModelFamily::from_model_name("llama-3-70b").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    Claude,
    Gemini,
    OpenAI,
    Grok,
}

impl ModelFamily {
    /// Resolve the family from a model identifier prefix.
    pub fn from_model_name(model: &str) -> SaaResult<Self> {
        let normalized = model.trim().to_ascii_lowercase();
        if normalized.starts_with("claude") {
            Ok(ModelFamily::Claude)
        } else if normalized.starts_with("gemini") {
            Ok(ModelFamily::Gemini)
        } else if normalized.starts_with("gpt")
            || normalized.starts_with("o1")
            || normalized.starts_with("o3")
            || normalized.starts_with("o4")
        {
            Ok(ModelFamily::OpenAI)
        } else if normalized.starts_with("grok") {
            Ok(ModelFamily::Grok)
        } else {
            Err(SaaError::UnsupportedModel(model.to_string()))
        }
    }

    /// Environment variable holding this family's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            ModelFamily::Claude => "ANTHROPIC_API_KEY",
            ModelFamily::Gemini => "GEMINI_API_KEY",
            ModelFamily::OpenAI => "OPENAI_API_KEY",
            ModelFamily::Grok => "XAI_API_KEY",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelFamily::Claude => "claude",
            ModelFamily::Gemini => "gemini",
            ModelFamily::OpenAI => "openai",
            ModelFamily::Grok => "grok",
        };
        f.write_str(name)
    }
}

/// Build the client for `model`, picking the vendor from the model name and the key
/// from `keys`.
pub fn create_client(model: &str, keys: &ApiKeys) -> SaaResult<Arc<dyn ClientWrapper>> {
    let family = ModelFamily::from_model_name(model)?;
    let key = keys.for_family(family)?;
    log::debug!("saa::clients::create_client: {} -> {}", model, family);

    let client: Arc<dyn ClientWrapper> = match family {
        ModelFamily::Claude => Arc::new(claude::ClaudeClient::new_with_model_str(key, model)),
        ModelFamily::Gemini => Arc::new(gemini::GeminiClient::new_with_model_string(key, model)),
        ModelFamily::OpenAI => Arc::new(openai::OpenAIClient::new_with_model_string(key, model)),
        ModelFamily::Grok => Arc::new(grok::GrokClient::new_with_model_str(key, model)),
    };
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_keys() -> ApiKeys {
        ApiKeys {
            anthropic: Some("a".into()),
            openai: Some("o".into()),
            gemini: Some("g".into()),
            xai: Some("x".into()),
        }
    }

    #[test]
    fn families_resolve_by_prefix() {
        assert_eq!(
            ModelFamily::from_model_name("gemini-1.5-pro-preview-0409").unwrap(),
            ModelFamily::Gemini
        );
        assert_eq!(ModelFamily::from_model_name("o3-mini").unwrap(), ModelFamily::OpenAI);
        assert_eq!(ModelFamily::from_model_name("Grok-2").unwrap(), ModelFamily::Grok);
    }

    #[test]
    fn unknown_prefix_is_unsupported() {
        match ModelFamily::from_model_name("mistral-large") {
            Err(SaaError::UnsupportedModel(name)) => assert_eq!(name, "mistral-large"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn factory_keeps_the_requested_model_name() {
        let keys = all_keys();
        for model in ["claude-3-haiku-20240307", "gemini-2.0-flash", "gpt-4o", "grok-2"] {
            let client = create_client(model, &keys).unwrap();
            assert_eq!(client.model_name(), model);
        }
    }

    #[test]
    fn factory_requires_the_family_key() {
        let keys = ApiKeys {
            openai: Some("o".into()),
            ..ApiKeys::default()
        };
        let err = create_client("claude-3-sonnet-20240229", &keys).err().unwrap();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }
}
