use crate::client_wrapper::{ClientError, ClientWrapper, Message, TokenUsage};
use crate::clients::openai::OpenAIClient;
use async_trait::async_trait;
use tokio::sync::Mutex;

pub const XAI_BASE_URL: &str = "https://api.x.ai/v1";

pub struct GrokClient {
    client: OpenAIClient,
}

// Models returned by the xAI API
#[derive(Debug, Clone, Copy)]
pub enum Model {
    Grok2,
    Grok2Latest,
    Grok3MiniFastBeta, // $0.60/MMT input $4.00/MMT output
    Grok3MiniBeta,     // $0.30/MMT input $0.50/MMT output
    Grok3Beta,         // $3/MMT input $15/MMT output
}

fn model_to_string(model: Model) -> String {
    match model {
        Model::Grok2 => "grok-2".to_string(),
        Model::Grok2Latest => "grok-2-latest".to_string(),
        Model::Grok3MiniFastBeta => "grok-3-mini-fast-beta".to_string(),
        Model::Grok3MiniBeta => "grok-3-mini-beta".to_string(),
        Model::Grok3Beta => "grok-3-beta".to_string(),
    }
}

impl GrokClient {
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_str(secret_key, &model_to_string(model))
    }

    pub fn new_with_model_str(secret_key: &str, model_name: &str) -> Self {
        GrokClient {
            client: OpenAIClient::new_with_base_url(secret_key, model_name, XAI_BASE_URL),
        }
    }
}

#[async_trait]
impl ClientWrapper for GrokClient {
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ClientError> {
        self.client.send_message(messages).await
    }

    fn model_name(&self) -> &str {
        self.client.model_name()
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        self.client.usage_slot()
    }
}
