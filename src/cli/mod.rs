use clap::Parser;
use std::time::Duration;

use crate::llm::{ LlmConfig, DEFAULT_ANTHROPIC_BASE_URL };
use crate::relay::{
    RelaySettings,
    DEFAULT_TEXT_MODEL,
    DEFAULT_VISION_MODEL,
    TEXT_MAX_TOKENS,
    VISION_MAX_TOKENS,
};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Provider Args ---
    /// API key for the Anthropic Messages API. Not validated at startup.
    #[arg(long, env = "ANTHROPIC_API_KEY", default_value = "", hide_env_values = true)]
    pub anthropic_api_key: String,

    /// Base URL for the Anthropic API (e.g., https://api.anthropic.com)
    #[arg(long, env = "ANTHROPIC_BASE_URL", default_value = DEFAULT_ANTHROPIC_BASE_URL)]
    pub anthropic_base_url: String,

    /// Timeout in seconds for one provider call. 0 disables the timeout.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    pub request_timeout_secs: u64,

    // --- Relay Args ---
    /// Model used for text-only requests that do not name one.
    #[arg(long, env = "DEFAULT_MODEL", default_value = DEFAULT_TEXT_MODEL)]
    pub default_model: String,

    /// Model forced on every request that carries an image.
    #[arg(long, env = "VISION_MODEL", default_value = DEFAULT_VISION_MODEL)]
    pub vision_model: String,

    /// Output token budget for text-only requests.
    #[arg(long, env = "TEXT_MAX_TOKENS", default_value_t = TEXT_MAX_TOKENS)]
    pub text_max_tokens: u32,

    /// Output token budget for image requests.
    #[arg(long, env = "VISION_MAX_TOKENS", default_value_t = VISION_MAX_TOKENS)]
    pub vision_max_tokens: u32,

    /// Optional JSON file overriding the system prompt texts
    /// (system_prompt, vision_instructions, context_label).
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    // --- Server Args ---
    /// Host address for the HTTP server to listen on.
    #[arg(long, env = "HTTP_HOST", default_value = "0.0.0.0")]
    pub http_host: String,

    /// Port for the HTTP server to listen on.
    #[arg(long, env = "PORT", default_value = "8000")]
    pub http_port: u16,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl Args {
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    pub fn llm_config(&self) -> LlmConfig {
        let api_key = if !self.anthropic_api_key.is_empty() {
            Some(self.anthropic_api_key.clone())
        } else {
            None
        };
        let timeout = if self.request_timeout_secs > 0 {
            Some(Duration::from_secs(self.request_timeout_secs))
        } else {
            None
        };
        LlmConfig {
            api_key,
            base_url: Some(self.anthropic_base_url.clone()),
            timeout,
        }
    }

    pub fn relay_settings(&self) -> RelaySettings {
        RelaySettings {
            default_model: self.default_model.clone(),
            vision_model: self.vision_model.clone(),
            text_max_tokens: self.text_max_tokens,
            vision_max_tokens: self.vision_max_tokens,
        }
    }
}
