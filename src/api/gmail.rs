//! Gmail API v1: message search plus per-message metadata.
//!
//! Listing returns only ids; header metadata (From, To, Subject, Date) comes
//! from one detail request per message.

use async_trait::async_trait;
use serde::Deserialize;

use super::{build_http_client, check_status, endpoint, path_segment};
use crate::cache::{cache_key, token_fingerprint};
use crate::error::ServiceError;

// ============================================================================
// API response types
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageListResponse {
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub result_size_estimate: Option<u64>,
}

/// One page of search hits plus the number of matches overall.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageList {
    pub refs: Vec<MessageRef>,
    pub total: usize,
}

impl From<MessageListResponse> for MessageList {
    fn from(resp: MessageListResponse) -> Self {
        let estimate = resp.result_size_estimate.unwrap_or(0) as usize;
        Self {
            total: estimate.max(resp.messages.len()),
            refs: resp.messages,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub label_ids: Vec<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    /// Epoch milliseconds, as a string
    #[serde(default)]
    pub internal_date: Option<String>,
    #[serde(default)]
    pub size_estimate: Option<u64>,
    #[serde(default)]
    pub payload: Option<RawPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPayload {
    #[serde(default)]
    pub headers: Vec<RawHeader>,
    #[serde(default)]
    pub parts: Vec<RawPart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHeader {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub parts: Vec<RawPart>,
}

impl RawMessage {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .as_ref()?
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

// ============================================================================
// Query + source trait
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
    /// Gmail search syntax, e.g. `is:unread`
    pub q: String,
    pub label_ids: Vec<String>,
    pub max_results: u32,
}

impl MessageQuery {
    pub fn new(q: impl Into<String>, max_results: u32) -> Self {
        Self {
            q: q.into(),
            label_ids: vec!["INBOX".to_string()],
            max_results,
        }
    }

    pub fn cache_key(&self, token: &str) -> String {
        let fingerprint = token_fingerprint(token);
        let labels = self.label_ids.join(",");
        let max_results = self.max_results.to_string();
        cache_key(&[
            ("token", fingerprint.as_str()),
            ("q", self.q.as_str()),
            ("labelIds", labels.as_str()),
            ("maxResults", max_results.as_str()),
        ])
    }
}

#[async_trait]
pub trait MailSource: Send + Sync {
    async fn list_messages(
        &self,
        access_token: &str,
        query: &MessageQuery,
    ) -> Result<MessageList, ServiceError>;

    async fn get_message(
        &self,
        access_token: &str,
        message_id: &str,
    ) -> Result<RawMessage, ServiceError>;

    async fn validate_token(&self, access_token: &str) -> Result<(), ServiceError>;
}

// ============================================================================
// Gmail API
// ============================================================================

#[derive(Debug, Clone)]
pub struct GmailClient {
    client: reqwest::Client,
    base_url: String,
}

impl GmailClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_http_client()?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl MailSource for GmailClient {
    async fn list_messages(
        &self,
        access_token: &str,
        query: &MessageQuery,
    ) -> Result<MessageList, ServiceError> {
        let url = endpoint(&self.base_url, "users/me/messages");
        let mut params: Vec<(&str, String)> = vec![
            ("q", query.q.clone()),
            ("maxResults", query.max_results.to_string()),
        ];
        for label in &query.label_ids {
            params.push(("labelIds", label.clone()));
        }

        log::debug!("gmail list_messages q='{}' max={}", query.q, query.max_results);

        let resp = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&params)
            .send()
            .await?;

        let list: MessageListResponse = check_status(resp).await?.json().await?;
        Ok(list.into())
    }

    async fn get_message(
        &self,
        access_token: &str,
        message_id: &str,
    ) -> Result<RawMessage, ServiceError> {
        let url = endpoint(
            &self.base_url,
            &format!("users/me/messages/{}", path_segment(message_id)),
        );

        let resp = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("format", "metadata"),
                ("metadataHeaders", "From"),
                ("metadataHeaders", "To"),
                ("metadataHeaders", "Subject"),
                ("metadataHeaders", "Date"),
            ])
            .send()
            .await?;

        Ok(check_status(resp).await?.json().await?)
    }

    async fn validate_token(&self, access_token: &str) -> Result<(), ServiceError> {
        let url = endpoint(&self.base_url, "users/me/profile");
        let resp = self.client.get(&url).bearer_auth(access_token).send().await?;
        check_status(resp).await?;
        Ok(())
    }
}
