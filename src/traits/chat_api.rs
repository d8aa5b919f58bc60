use async_trait::async_trait;

use crate::errors::ChatError;
use crate::models::chat::ChatRequest;

/// Defines the interface for an OpenAI-compatible chat-completion service.
///
/// This trait allows the probe runner to abstract over different backend
/// implementations (e.g., the real HTTP client, scripted stubs for testing).
///
/// Any implementation must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Sends one completion request and returns the primary completion text.
    async fn chat_completion(&self, request: &ChatRequest) -> Result<String, ChatError>;
}
