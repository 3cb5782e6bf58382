use crate::config::prompt::PromptConfig;
use crate::llm::LlmError;
use crate::llm::chat::{
    ChatClient,
    ContentBlock,
    ImageSource,
    Message,
    MessageContent,
    MessageRequest,
    MessageRole,
    ResponseBlock,
};
use crate::models::chat::{ ChatRequest, ChatResponse, ConversationTurn, TurnRole };

use log::{ info, error };
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_TEXT_MODEL: &str = "claude-haiku-4-5-20251001";
pub const DEFAULT_VISION_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const TEXT_MAX_TOKENS: u32 = 500;
pub const VISION_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_IMAGE_PROMPT: &str = "Analiza este dashboard";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Upstream(#[from] LlmError),
    #[error("provider reply has no content blocks")]
    EmptyContent,
    #[error("first content block of the provider reply is not text")]
    NonTextContent,
}

impl RelayError {
    pub fn kind(&self) -> &str {
        match self {
            RelayError::Upstream(e) => e.kind(),
            RelayError::EmptyContent => "EmptyContent",
            RelayError::NonTextContent => "NonTextContent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    pub default_model: String,
    pub vision_model: String,
    pub text_max_tokens: u32,
    pub vision_max_tokens: u32,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_TEXT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            text_max_tokens: TEXT_MAX_TOKENS,
            vision_max_tokens: VISION_MAX_TOKENS,
        }
    }
}

fn to_message_role(role: &TurnRole) -> Option<MessageRole> {
    match role {
        TurnRole::User => Some(MessageRole::User),
        TurnRole::Assistant => Some(MessageRole::Assistant),
        TurnRole::Other => None,
    }
}

/// Keeps `user`/`assistant` turns in their original order; everything else is
/// dropped without telling the caller.
pub fn filter_turns(turns: &[ConversationTurn]) -> Vec<Message> {
    turns
        .iter()
        .filter_map(|turn| to_message_role(&turn.role).map(|role| Message::text(role, &turn.content)))
        .collect()
}

/// Turns one dashboard request into one provider call and back.
///
/// Holds no per-call state: the provider client and settings are fixed at
/// startup and shared read-only between concurrent requests.
#[derive(Clone)]
pub struct ChatRelay {
    chat_client: Arc<dyn ChatClient>,
    prompt_config: Arc<PromptConfig>,
    settings: RelaySettings,
}

impl ChatRelay {
    pub fn new(
        chat_client: Arc<dyn ChatClient>,
        prompt_config: Arc<PromptConfig>,
        settings: RelaySettings
    ) -> Self {
        Self { chat_client, prompt_config, settings }
    }

    /// Builds the provider request.
    ///
    /// Without an image every kept turn is forwarded as-is with the caller's
    /// model (or the default). With an image, the last kept turn is replaced
    /// by a user message of `[image, text]`, where text is that turn's content
    /// or `DEFAULT_IMAGE_PROMPT` when there are no turns; the model is forced
    /// to the vision model and the output budget is raised.
    pub fn build_request(&self, request: &ChatRequest) -> MessageRequest {
        let with_image = request.image.is_some();
        let system = self.prompt_config.system_prompt_for(&request.dashboard_context, with_image);
        let mut messages = filter_turns(&request.messages);

        match &request.image {
            None => {
                let model = request.model
                    .clone()
                    .unwrap_or_else(|| self.settings.default_model.clone());
                MessageRequest {
                    model,
                    max_tokens: self.settings.text_max_tokens,
                    system,
                    messages,
                }
            }
            Some(image) => {
                let prompt = match messages.pop() {
                    Some(Message { content: MessageContent::Text(text), .. }) => text,
                    Some(Message { content: MessageContent::Blocks(_), .. }) | None =>
                        DEFAULT_IMAGE_PROMPT.to_string(),
                };
                messages.push(Message {
                    role: MessageRole::User,
                    content: MessageContent::Blocks(
                        vec![
                            ContentBlock::Image {
                                source: ImageSource::base64(&image.media_type, &image.data),
                            },
                            ContentBlock::Text { text: prompt }
                        ]
                    ),
                });
                MessageRequest {
                    model: self.settings.vision_model.clone(),
                    max_tokens: self.settings.vision_max_tokens,
                    system,
                    messages,
                }
            }
        }
    }

    async fn relay(&self, request: &ChatRequest) -> Result<ChatResponse, RelayError> {
        let upstream = self.build_request(request);
        info!(
            "Relaying chat: model={} turns={} image={} max_tokens={}",
            upstream.model,
            upstream.messages.len(),
            request.image.is_some(),
            upstream.max_tokens
        );

        let reply = self.chat_client.create_message(upstream).await?;

        let text = match reply.content.into_iter().next() {
            Some(ResponseBlock::Text { text }) => text,
            Some(ResponseBlock::Other) => {
                return Err(RelayError::NonTextContent);
            }
            None => {
                return Err(RelayError::EmptyContent);
            }
        };

        Ok(ChatResponse {
            response: text,
            tokens_used: u128::from(reply.usage.input_tokens) + u128::from(reply.usage.output_tokens),
        })
    }

    /// Runs one relay call. Exactly one provider call is made, with no retry.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, RelayError> {
        let result = self.relay(request).await;
        if let Err(e) = &result {
            error!("{}: {}", e.kind(), e);
        }
        result
    }
}
