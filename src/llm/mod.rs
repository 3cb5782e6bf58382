pub mod chat;

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout: Some(Duration::from_secs(60)),
        }
    }
}

/// Failures raised while talking to the model provider.
///
/// The `Display` text is what ends up in the `detail` field of a failed
/// `/chat` response, so it carries the provider's own wording.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Invalid API key format: {0}")]
    InvalidApiKey(String),
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned status {status}: {body}")]
    Api {
        status: u16,
        error_type: Option<String>,
        body: String,
    },
    #[error("Failed to decode provider reply: {0}")]
    Decode(#[from] serde_json::Error),
}

impl LlmError {
    /// Short category name used in diagnostic log lines.
    pub fn kind(&self) -> &str {
        match self {
            LlmError::InvalidApiKey(_) => "InvalidApiKey",
            LlmError::Http(e) if e.is_timeout() => "Timeout",
            LlmError::Http(e) if e.is_connect() => "Connection",
            LlmError::Http(_) => "HttpError",
            LlmError::Api { error_type: Some(t), .. } => t.as_str(),
            LlmError::Api { .. } => "ApiStatus",
            LlmError::Decode(_) => "DecodeError",
        }
    }
}
