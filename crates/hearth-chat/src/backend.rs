//! Remote chat service client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_core::{EmotionTag, Message, Persona, Role};
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::http;

/// One prior turn sent as conversation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextTurn {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for ContextTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// A chat request as sent to the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(rename = "relation_type")]
    pub persona: Persona,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Messages that preceded `message`, oldest first.
    #[serde(rename = "conversation_history")]
    pub prior_context: Vec<ContextTurn>,
}

/// The service's answer to a [`ChatRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response: String,
    pub emotion: Option<EmotionTag>,
    /// When the service produced the reply, if it said.
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatReply {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            emotion: None,
            timestamp: None,
        }
    }

    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = Some(EmotionTag::new(emotion));
        self
    }
}

/// Produces persona replies.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError>;
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    response: String,
    #[serde(default)]
    emotion_detected: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl From<ChatResponseBody> for ChatReply {
    fn from(body: ChatResponseBody) -> Self {
        Self {
            response: body.response,
            emotion: body
                .emotion_detected
                .filter(|e| !e.trim().is_empty())
                .map(EmotionTag::new),
            timestamp: body.timestamp.as_deref().and_then(http::parse_timestamp),
        }
    }
}

/// [`ChatBackend`] over the service's JSON API (`POST {base}/chat`).
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpChatBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ChatError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url: base_url.into(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        let url = http::endpoint(&self.base_url, "chat");
        tracing::debug!(
            url = %url,
            persona = %request.persona,
            context_len = request.prior_context.len(),
            "Sending chat request"
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| http::transport_error(e, self.timeout))?;
        let response = http::check_status(response).await?;
        let body: ChatResponseBody = response
            .json()
            .await
            .map_err(|e| http::transport_error(e, self.timeout))?;

        Ok(body.into())
    }
}
