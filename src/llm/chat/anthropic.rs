use async_trait::async_trait;
use log::debug;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE } };
use serde::Deserialize;
use std::time::Duration;

use super::{ ChatClient, MessageRequest, MessageResponse };
use crate::llm::{ LlmConfig, LlmError, ANTHROPIC_VERSION, DEFAULT_ANTHROPIC_BASE_URL };

pub struct AnthropicChatClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

#[derive(Deserialize)]
struct AnthropicErrorEnvelope {
    error: AnthropicErrorDetail,
}

#[derive(Deserialize)]
struct AnthropicErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
}

/// Pulls the provider's error category (`authentication_error`, ...) out of
/// a non-2xx body, if the body is the usual JSON envelope.
fn parse_error_type(body: &str) -> Option<String> {
    serde_json
        ::from_str::<AnthropicErrorEnvelope>(body)
        .ok()
        .map(|env| env.error.error_type)
}

impl AnthropicChatClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        timeout: Option<Duration>
    ) -> Result<Self, LlmError> {
        let api_url = base_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_static(ANTHROPIC_VERSION)
        );
        let mut builder = HttpClient::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            api_key,
            base_url: api_url,
        })
    }

    /// The key is not checked here. An absent key is sent as an empty header
    /// and the provider answers with an authentication error; a key that is
    /// not a valid header value fails each call with `InvalidApiKey`.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().unwrap_or_default();
        Self::new(api_key, config.base_url.clone(), config.timeout)
    }

    fn api_key_header(&self) -> Result<HeaderValue, LlmError> {
        let mut value = HeaderValue::from_str(&self.api_key).map_err(|e|
            LlmError::InvalidApiKey(e.to_string())
        )?;
        value.set_sensitive(true);
        Ok(value)
    }

    fn messages_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/v1/messages") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/messages", base)
        } else {
            format!("{}/v1/messages", base)
        }
    }
}

#[async_trait]
impl ChatClient for AnthropicChatClient {
    async fn create_message(&self, request: MessageRequest) -> Result<MessageResponse, LlmError> {
        let url = self.messages_url();
        let api_key = self.api_key_header()?;
        debug!(
            "AnthropicChatClient::create_message() → model={} messages={} max_tokens={}",
            request.model,
            request.messages.len(),
            request.max_tokens
        );

        let resp = self.http
            .post(&url)
            .header(HeaderName::from_static("x-api-key"), api_key)
            .json(&request)
            .send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                error_type: parse_error_type(&body),
                body,
            });
        }

        Ok(serde_json::from_str::<MessageResponse>(&body)?)
    }

    fn get_base_url(&self) -> String {
        self.base_url.clone()
    }
}
