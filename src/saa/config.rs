//! Configuration for the orchestrator.
//!
//! [`OrchestratorConfig`] is an immutable value handed to the
//! [`Orchestrator`](crate::Orchestrator) at construction; nothing reads process-wide
//! settings after that point, so two orchestrators with different configs can run side
//! by side. Users construct it manually or from environment variables; no config-file
//! parsing is involved.
//!
//! # Example
//!
//! ```rust
//! use saa_orchestrator::OrchestratorConfig;
//! use std::time::Duration;
//!
//! let config = OrchestratorConfig::default()
//!     .with_num_workers(5)
//!     .with_retry_policy(2, Duration::from_millis(500))
//!     .with_custom_prompt_template("Plan a launch for: {objective}");
//!
//! assert_eq!(config.num_workers, 5);
//! assert_eq!(config.main_assistant_model, "claude-3-sonnet-20240229");
//! assert!(config.validate().is_ok());
//! ```

use crate::clients::ModelFamily;
use crate::error::{SaaError, SaaResult};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MAIN_ASSISTANT: &str = "claude-3-sonnet-20240229";
pub const DEFAULT_SUB_ASSISTANT: &str = "claude-3-haiku-20240307";
pub const DEFAULT_REFINER_ASSISTANT: &str = "gemini-1.5-pro-preview-0409";
pub const DEFAULT_NUM_WORKERS: usize = 3;
pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// API keys per vendor. Only the keys of the families actually configured are required.
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub anthropic: Option<String>,
    pub openai: Option<String>,
    pub gemini: Option<String>,
    pub xai: Option<String>,
}

impl ApiKeys {
    /// Read every key from its environment variable; unset or blank variables stay `None`.
    pub fn from_env() -> Self {
        ApiKeys {
            anthropic: non_empty_var(ModelFamily::Claude.api_key_var()),
            openai: non_empty_var(ModelFamily::OpenAI.api_key_var()),
            gemini: non_empty_var(ModelFamily::Gemini.api_key_var()),
            xai: non_empty_var(ModelFamily::Grok.api_key_var()),
        }
    }

    /// The key for `family`, or a configuration error naming the missing variable.
    pub fn for_family(&self, family: ModelFamily) -> SaaResult<&str> {
        let key = match family {
            ModelFamily::Claude => &self.anthropic,
            ModelFamily::OpenAI => &self.openai,
            ModelFamily::Gemini => &self.gemini,
            ModelFamily::Grok => &self.xai,
        };
        key.as_deref().ok_or_else(|| {
            SaaError::Configuration(format!(
                "{} is not set in the environment",
                family.api_key_var()
            ))
        })
    }
}

// Keys never show up in logs or panics.
impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |key: &Option<String>| if key.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ApiKeys")
            .field("anthropic", &mask(&self.anthropic))
            .field("openai", &mask(&self.openai))
            .field("gemini", &mask(&self.gemini))
            .field("xai", &mask(&self.xai))
            .finish()
    }
}

/// Settings for one orchestrator instance.
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Model that plans the objective.
    pub main_assistant_model: String,
    /// Model every worker in the pool runs.
    pub sub_assistant_model: String,
    /// Model that folds worker results into the final answer.
    pub refiner_assistant_model: String,
    /// Pool size, and the number of sub-tasks the planner is asked for.
    pub num_workers: usize,
    /// Planning prompt used instead of the default one; `{objective}` is substituted.
    pub custom_prompt_template: Option<String>,
    /// Directory receiving `exchange_log.md`.
    pub output_dir: PathBuf,
    /// Attempts per assistant call, the first one included.
    pub max_retries: usize,
    /// Fixed pause between two attempts.
    pub retry_delay: Duration,
    pub credentials: ApiKeys,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            main_assistant_model: DEFAULT_MAIN_ASSISTANT.to_string(),
            sub_assistant_model: DEFAULT_SUB_ASSISTANT.to_string(),
            refiner_assistant_model: DEFAULT_REFINER_ASSISTANT.to_string(),
            num_workers: DEFAULT_NUM_WORKERS,
            custom_prompt_template: None,
            output_dir: PathBuf::from("output"),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            credentials: ApiKeys::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Defaults overridden by `SAA_*` variables, with credentials read from the vendor
    /// key variables.
    pub fn from_env() -> SaaResult<Self> {
        let mut config = OrchestratorConfig {
            credentials: ApiKeys::from_env(),
            ..OrchestratorConfig::default()
        };
        if let Some(model) = non_empty_var("SAA_MAIN_MODEL") {
            config.main_assistant_model = model;
        }
        if let Some(model) = non_empty_var("SAA_SUB_MODEL") {
            config.sub_assistant_model = model;
        }
        if let Some(model) = non_empty_var("SAA_REFINER_MODEL") {
            config.refiner_assistant_model = model;
        }
        if let Some(workers) = non_empty_var("SAA_NUM_WORKERS") {
            config.num_workers = workers.parse().map_err(|_| {
                SaaError::Configuration(format!(
                    "SAA_NUM_WORKERS must be a positive integer, got '{}'",
                    workers
                ))
            })?;
        }
        if let Some(dir) = non_empty_var("SAA_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn with_main_assistant_model(mut self, model: impl Into<String>) -> Self {
        self.main_assistant_model = model.into();
        self
    }

    pub fn with_sub_assistant_model(mut self, model: impl Into<String>) -> Self {
        self.sub_assistant_model = model.into();
        self
    }

    pub fn with_refiner_assistant_model(mut self, model: impl Into<String>) -> Self {
        self.refiner_assistant_model = model.into();
        self
    }

    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_custom_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.custom_prompt_template = Some(template.into());
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_retry_policy(mut self, max_retries: usize, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_credentials(mut self, credentials: ApiKeys) -> Self {
        self.credentials = credentials;
        self
    }

    /// Reject settings no workflow could run with.
    pub fn validate(&self) -> SaaResult<()> {
        if self.num_workers == 0 {
            return Err(SaaError::Configuration(
                "num_workers must be at least 1".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(SaaError::Configuration(
                "max_retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Location of the exchange log written after a successful run.
    pub fn exchange_log_path(&self) -> PathBuf {
        self.output_dir.join(crate::exchange_log::EXCHANGE_LOG_FILE)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
