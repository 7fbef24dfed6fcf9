//! Past conversations and user registration on the chat service.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_core::{EmotionTag, Persona};
use serde::Deserialize;

use crate::error::ChatError;
use crate::http;

/// Filter and page for a history lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub persona: Option<Persona>,
    pub user_id: Option<i64>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            persona: None,
            user_id: None,
            limit: 50,
            offset: 0,
        }
    }
}

impl HistoryQuery {
    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];
        if let Some(persona) = self.persona {
            params.push(("relation_type", persona.as_str().to_string()));
        }
        if let Some(user_id) = self.user_id {
            params.push(("user_id", user_id.to_string()));
        }
        params
    }
}

/// One stored exchange: what the user said and how the persona answered.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConversationRecord {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub relation_type: String,
    pub message: String,
    pub response: String,
    #[serde(default)]
    pub emotion: Option<EmotionTag>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ConversationRecord {
    /// The persona that answered, if the service named a known one.
    pub fn persona(&self) -> Option<Persona> {
        self.relation_type.parse().ok()
    }

    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(http::parse_timestamp)
    }
}

/// A page of history, newest first as the service orders it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryPage {
    #[serde(rename = "conversations")]
    pub items: Vec<ConversationRecord>,
    pub total: u64,
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Read access to stored conversations.
#[async_trait]
pub trait HistoryService: Send + Sync {
    async fn fetch(&self, query: &HistoryQuery) -> Result<HistoryPage, ChatError>;

    async fn create_user(&self, name: &str) -> Result<UserProfile, ChatError>;
}

/// [`HistoryService`] over the service's JSON API.
#[derive(Debug, Clone)]
pub struct HttpHistoryClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpHistoryClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ChatError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url: base_url.into(),
            timeout,
        })
    }
}

#[async_trait]
impl HistoryService for HttpHistoryClient {
    async fn fetch(&self, query: &HistoryQuery) -> Result<HistoryPage, ChatError> {
        let url = http::endpoint(&self.base_url, "history");
        tracing::debug!(url = %url, ?query, "Fetching history");

        let response = self
            .client
            .get(&url)
            .query(&query.to_params())
            .send()
            .await
            .map_err(|e| http::transport_error(e, self.timeout))?;
        let page: HistoryPage = http::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| http::transport_error(e, self.timeout))?;

        tracing::info!(items = page.items.len(), total = page.total, "History fetched");
        Ok(page)
    }

    async fn create_user(&self, name: &str) -> Result<UserProfile, ChatError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let url = http::endpoint(&self.base_url, "create-user");
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .map_err(|e| http::transport_error(e, self.timeout))?;
        let user: UserProfile = http::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| http::transport_error(e, self.timeout))?;

        tracing::info!(user_id = user.id, "User created");
        Ok(user)
    }
}
