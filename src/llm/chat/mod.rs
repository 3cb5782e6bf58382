pub mod anthropic;

use async_trait::async_trait;
use serde::{ Deserialize, Serialize };
use std::sync::Arc;

use super::{ LlmConfig, LlmError };
use self::anthropic::AnthropicChatClient;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub media_type: String,
    pub data: String,
}

impl ImageSource {
    pub fn base64(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            source_type: "base64".to_string(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        source: ImageSource,
    },
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: MessageContent,
}

impl Message {
    pub fn text(role: MessageRole, text: impl Into<String>) -> Self {
        Self { role, content: MessageContent::Text(text.into()) }
    }
}

/// One call to the provider: model, system text, ordered messages and the
/// output token budget.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub messages: Vec<Message>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageResponse {
    pub content: Vec<ResponseBlock>,
    pub usage: Usage,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn create_message(&self, request: MessageRequest) -> Result<MessageResponse, LlmError>;

    fn get_base_url(&self) -> String;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client = AnthropicChatClient::from_config(config)?;
    Ok(Arc::new(client))
}
