//! Chat-completion endpoint boundary.
//!
//! Any endpoint accepting a chat-style request (role/content messages) and
//! returning a text completion is substitutable behind [`ChatEndpoint`];
//! [`HttpChatEndpoint`] is the production implementation for
//! OpenAI-compatible `/v1/chat/completions` servers.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::ClassifierError;

/// One message in a chat-style request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Message role (`system` or `user`).
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A chat-completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Ordered messages (system prompt first).
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature. Low for near-deterministic classification.
    pub temperature: f32,
    /// Completion length cap. A category name needs very few tokens.
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Builds a classification request from a system and a user prompt.
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: 0.1,
            max_tokens: 50,
        }
    }
}

/// Interface to the language-model collaborator.
pub trait ChatEndpoint {
    /// Sends a request and returns the completion text.
    ///
    /// # Errors
    ///
    /// Returns a [`ClassifierError`] when the endpoint is unreachable, times
    /// out, answers with an error status, or returns an unusable body.
    fn complete(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<String, ClassifierError>> + Send;
}

/// Chat-completion endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChatEndpoint {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl HttpChatEndpoint {
    /// Creates an endpoint client with a per-call timeout.
    ///
    /// A timeout surfaces as [`ClassifierError::Unavailable`], never a hang.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClassifierError::from)?;
        Ok(Self {
            client,
            url: url.into(),
            model: model.into(),
        })
    }
}

impl ChatEndpoint for HttpChatEndpoint {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ClassifierError> {
        debug!(url = %self.url, "sending chat-completion request");

        let payload = serde_json::json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let response = self.client.post(&self.url).json(&payload).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status { status, body });
        }

        let raw = response
            .json::<Value>()
            .await
            .map_err(|e| ClassifierError::Malformed(e.to_string()))?;

        let content = raw["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                ClassifierError::Malformed("no message content in response".to_string())
            })?;

        Ok(content.trim().to_string())
    }
}
