//! HTTP client for the voice-AI provider's conversation API.

use async_trait::async_trait;
use leadmachine_core::{Conversation, ConversationSource, ConversationSummary};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

const PAGE_SIZE: usize = 100;

#[derive(Error, Debug)]
pub enum VoiceAiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Client for the provider's conversational-AI endpoints.
pub struct VoiceAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    agent_id: String,
}

#[derive(Deserialize)]
struct ListPage {
    #[serde(default)]
    conversations: Vec<ListEntry>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct ListEntry {
    conversation_id: String,
    start_time_unix_secs: i64,
}

#[derive(Deserialize)]
struct Detail {
    conversation_id: String,
    #[serde(default)]
    analysis: Option<Analysis>,
    metadata: Metadata,
}

#[derive(Deserialize)]
struct Analysis {
    transcript_summary: Option<String>,
}

#[derive(Deserialize)]
struct Metadata {
    start_time_unix_secs: i64,
    #[serde(default)]
    phone_call: Option<PhoneCall>,
}

#[derive(Deserialize)]
struct PhoneCall {
    external_number: Option<String>,
}

impl From<Detail> for Conversation {
    fn from(d: Detail) -> Self {
        Conversation {
            conversation_id: d.conversation_id,
            transcript: d.analysis.and_then(|a| a.transcript_summary),
            started_at_unix_secs: d.metadata.start_time_unix_secs,
            caller_phone: d.metadata.phone_call.and_then(|p| p.external_number),
        }
    }
}

impl VoiceAiClient {
    /// Create a client for one agent.
    ///
    /// `base_url` should be like `https://api.example.com` (a trailing slash
    /// is stripped).
    pub fn new(base_url: String, api_key: String, agent_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            agent_id,
        }
    }

    fn list_request(&self, cursor: Option<&str>) -> Result<reqwest::Request, VoiceAiError> {
        let mut query = vec![
            ("agent_id", self.agent_id.clone()),
            ("page_size", PAGE_SIZE.to_string()),
        ];
        if let Some(c) = cursor {
            query.push(("cursor", c.to_string()));
        }
        let req = self
            .client
            .get(format!("{}/v1/convai/conversations", self.base_url))
            .header("xi-api-key", &self.api_key)
            .query(&query)
            .build()?;
        Ok(req)
    }

    fn detail_request(&self, conversation_id: &str) -> Result<reqwest::Request, VoiceAiError> {
        let req = self
            .client
            .get(format!("{}/v1/convai/conversations/{conversation_id}", self.base_url))
            .header("xi-api-key", &self.api_key)
            .build()?;
        Ok(req)
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        req: reqwest::Request,
    ) -> Result<T, VoiceAiError> {
        debug!(url = %req.url(), "voice-ai request");
        let resp = self.client.execute(req).await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VoiceAiError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let text = resp.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// The cursor for the next page, or `None` when paging is done.
///
/// Paging also ends when the server hands back the cursor it was just sent.
fn next_cursor(has_more: bool, next: Option<String>, current: Option<&str>) -> Option<String> {
    match next {
        Some(next) if has_more && current != Some(next.as_str()) => Some(next),
        _ => None,
    }
}

#[async_trait]
impl ConversationSource for VoiceAiClient {
    type Error = VoiceAiError;

    /// Page through the agent's conversations, keeping those started at or
    /// after `since`.
    async fn list_conversations(
        &self,
        since: Option<i64>,
    ) -> Result<Vec<ConversationSummary>, VoiceAiError> {
        let mut out = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let req = self.list_request(cursor.as_deref())?;
            let page: ListPage = self.execute_json(req).await?;
            out.extend(
                page.conversations
                    .into_iter()
                    .filter(|e| since.is_none_or(|s| e.start_time_unix_secs >= s))
                    .map(|e| ConversationSummary {
                        conversation_id: e.conversation_id,
                        started_at_unix_secs: e.start_time_unix_secs,
                    }),
            );
            match next_cursor(page.has_more, page.next_cursor, cursor.as_deref()) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(count = out.len(), agent_id = %self.agent_id, "listed conversations");
        Ok(out)
    }

    async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation, VoiceAiError> {
        let detail: Detail = self
            .execute_json(self.detail_request(conversation_id)?)
            .await?;
        Ok(detail.into())
    }
}
