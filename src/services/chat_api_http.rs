use std::time::Duration;

use async_trait::async_trait;
use bon::Builder;
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::errors::{ChatError, ConfigError};
use crate::models::chat::{ApiErrorBody, ChatRequest, ChatResponse, ModelList};
use crate::services::settings::ProviderConfig;
use crate::services::probe_runner::DEFAULT_CALL_TIMEOUT;
use crate::services::text::truncate_chars;
use crate::traits::chat_api::ChatApi;

const LOG_PREVIEW_CHARS: usize = 200;

/// Chat client for any OpenAI-compatible endpoint (Groq, OpenRouter, ...).
#[derive(Builder)]
pub struct HttpChatApi {
    client: Client,
    base_url: Url,
    api_key: String,
    /// Deadline the client was built with; reported when reqwest gives up.
    #[builder(default = DEFAULT_CALL_TIMEOUT)]
    timeout: Duration,
}

impl HttpChatApi {
    pub fn from_config(provider: &ProviderConfig, api_key: String) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(&provider.base_url())?;
        let client = Client::builder()
            .timeout(provider.request_timeout())
            .build()
            .map_err(ConfigError::HttpClient)?;
        info!(
            provider = %provider.kind,
            base_url = %base_url,
            timeout_secs = provider.request_timeout().as_secs(),
            "chat client configured"
        );
        Ok(Self::builder()
            .client(client)
            .base_url(base_url)
            .api_key(api_key)
            .timeout(provider.request_timeout())
            .build())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ChatError> {
        self.base_url
            .join(path)
            .map_err(|e| ChatError::Malformed(format!("cannot build {} url: {}", path, e)))
    }

    fn transport_error(&self, err: reqwest::Error) -> ChatError {
        if err.is_timeout() {
            ChatError::Timeout(self.timeout)
        } else {
            ChatError::Http(err)
        }
    }

    /// Lists model ids exposed by the provider, in catalog order.
    pub async fn list_models(&self) -> Result<Vec<String>, ChatError> {
        let url = self.endpoint("models")?;
        debug!(%url, "listing models");
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }
        let list: ModelList = serde_json::from_str(&body).map_err(|e| ChatError::Malformed(e.to_string()))?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}

/// Normalizes `base` so relative joins append to its last path segment.
pub fn parse_base_url(base: &str) -> Result<Url, ConfigError> {
    let normalized = format!("{}/", base.trim().trim_end_matches('/'));
    Url::parse(&normalized).map_err(|source| ConfigError::BaseUrl {
        url: base.to_string(),
        source,
    })
}

/// Prefers the provider's `error.message`, falling back to the raw body.
fn api_error(status: u16, body: &str) -> ChatError {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
        Err(_) => body.trim().to_string(),
    };
    ChatError::Api { status, message }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn chat_completion(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let url = self.endpoint("chat/completions")?;
        let prompt_len: usize = request.messages.iter().map(|m| m.content.len()).sum();
        info!(model = %request.model, prompt_len, "chat request");

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let err = api_error(status.as_u16(), &body);
            warn!(model = %request.model, status = status.as_u16(), error = %err, "chat request rejected");
            return Err(err);
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            ChatError::Malformed(format!("{}; body: {}", e, truncate_chars(&body, LOG_PREVIEW_CHARS)))
        })?;
        let text = parsed
            .primary_text()
            .ok_or_else(|| ChatError::EmptyResponse(format!("model {} returned no content", request.model)))?
            .to_string();

        let response_preview = truncate_chars(&text, LOG_PREVIEW_CHARS);
        info!(
            model = %request.model,
            response_len = text.len(),
            response_preview = %response_preview,
            "chat response"
        );
        Ok(text)
    }
}
