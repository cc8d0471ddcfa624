//! Conversations delivered by the voice-AI provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One processed phone call.
///
/// Received from the provider API, a webhook delivery, or a JSON file.
/// The same `conversation_id` may be delivered more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: String,
    /// Natural-language call summary. May be missing for dropped calls.
    #[serde(default)]
    pub transcript: Option<String>,
    /// Call start, seconds since the Unix epoch.
    pub started_at_unix_secs: i64,
    #[serde(default)]
    pub caller_phone: Option<String>,
}

/// Listing entry; fetch the full record with
/// [`ConversationSource::get_conversation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub started_at_unix_secs: i64,
}

/// A provider of conversations.
#[async_trait]
pub trait ConversationSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// List conversations, optionally only those started at or after `since`
    /// (Unix seconds).
    async fn list_conversations(
        &self,
        since: Option<i64>,
    ) -> Result<Vec<ConversationSummary>, Self::Error>;

    /// Fetch one conversation with its summary and caller details.
    async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default_to_none() {
        let json = r#"{"conversation_id": "conv_9", "started_at_unix_secs": 1700000000}"#;
        let conv: Conversation = serde_json::from_str(json).unwrap();
        assert_eq!(conv.conversation_id, "conv_9");
        assert!(conv.transcript.is_none());
        assert!(conv.caller_phone.is_none());
    }

    #[test]
    fn conversation_array_parses() {
        let json = r#"[
            {
                "conversation_id": "conv_1",
                "transcript": "Robin Wright, an existing client, called.",
                "started_at_unix_secs": 1700000000,
                "caller_phone": "+15550100"
            },
            {
                "conversation_id": "conv_2",
                "transcript": null,
                "started_at_unix_secs": 1700000300,
                "caller_phone": null
            }
        ]"#;
        let convs: Vec<Conversation> = serde_json::from_str(json).unwrap();
        assert_eq!(convs.len(), 2);
        assert_eq!(convs[0].caller_phone.as_deref(), Some("+15550100"));
        assert!(convs[1].transcript.is_none());
    }
}
