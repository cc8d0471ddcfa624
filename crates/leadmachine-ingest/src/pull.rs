//! Pull pipeline: list conversations from a provider and ingest each one.

use std::time::Instant;

use leadmachine_core::ConversationSource;
use leadmachine_store::LeadStore;
use serde::Serialize;
use tracing::{info, warn};

use crate::reconciler::{IngestOutcome, Reconciler};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PullStats {
    pub listed: usize,
    pub created: usize,
    pub existing: usize,
    pub failed: usize,
    pub elapsed_secs: f64,
}

/// List conversations started at or after `since` and ingest each one.
///
/// Conversations that already have a lead are counted as existing without
/// fetching their details. A failed fetch or insert is logged and counted;
/// only a failed listing aborts the run.
pub async fn pull<C, S>(
    source: &C,
    reconciler: &Reconciler<S>,
    since: Option<i64>,
) -> Result<PullStats, C::Error>
where
    C: ConversationSource,
    S: LeadStore,
{
    let start = Instant::now();
    let summaries = source.list_conversations(since).await?;
    let mut stats = PullStats {
        listed: summaries.len(),
        ..PullStats::default()
    };
    info!(listed = stats.listed, "pulling conversations");

    for summary in &summaries {
        let id = summary.conversation_id.as_str();

        match reconciler.store().find_by_conversation_id(id) {
            Ok(Some(_)) => {
                stats.existing += 1;
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(conversation_id = id, error = %e, "dedup lookup failed");
                stats.failed += 1;
                continue;
            }
        }

        let conv = match source.get_conversation(id).await {
            Ok(conv) => conv,
            Err(e) => {
                warn!(conversation_id = id, error = %e, "failed to fetch conversation");
                stats.failed += 1;
                continue;
            }
        };

        match reconciler.ingest(&conv) {
            Ok(IngestOutcome::Created(_)) => stats.created += 1,
            Ok(IngestOutcome::Existing(_)) => stats.existing += 1,
            Err(e) => {
                warn!(conversation_id = id, error = %e, "failed to ingest conversation");
                stats.failed += 1;
            }
        }
    }

    stats.elapsed_secs = start.elapsed().as_secs_f64();
    info!(
        created = stats.created,
        existing = stats.existing,
        failed = stats.failed,
        "pull complete"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::FixedOffset;
    use leadmachine_core::{Conversation, ConversationSummary};
    use leadmachine_store::MemoryStore;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("fake source: {0}")]
    struct FakeError(String);

    struct FakeSource {
        conversations: Vec<Conversation>,
        broken: Vec<String>,
        fail_listing: bool,
        fetches: AtomicUsize,
    }

    impl FakeSource {
        fn new(conversations: Vec<Conversation>) -> Self {
            Self {
                conversations,
                broken: Vec::new(),
                fail_listing: false,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ConversationSource for FakeSource {
        type Error = FakeError;

        async fn list_conversations(
            &self,
            since: Option<i64>,
        ) -> Result<Vec<ConversationSummary>, FakeError> {
            if self.fail_listing {
                return Err(FakeError("listing down".into()));
            }
            Ok(self
                .conversations
                .iter()
                .filter(|c| since.is_none_or(|s| c.started_at_unix_secs >= s))
                .map(|c| ConversationSummary {
                    conversation_id: c.conversation_id.clone(),
                    started_at_unix_secs: c.started_at_unix_secs,
                })
                .collect())
        }

        async fn get_conversation(&self, id: &str) -> Result<Conversation, FakeError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.broken.iter().any(|b| b == id) {
                return Err(FakeError(format!("{id} unavailable")));
            }
            let by_id: HashMap<&str, &Conversation> = self
                .conversations
                .iter()
                .map(|c| (c.conversation_id.as_str(), c))
                .collect();
            by_id
                .get(id)
                .map(|c| (*c).clone())
                .ok_or_else(|| FakeError(format!("{id} missing")))
        }
    }

    fn conv(id: &str, at: i64, transcript: &str) -> Conversation {
        Conversation {
            conversation_id: id.into(),
            transcript: Some(transcript.into()),
            started_at_unix_secs: at,
            caller_phone: None,
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[tokio::test]
    async fn pull_creates_leads() {
        let source = FakeSource::new(vec![
            conv("c1", 100, "Jane Doe called."),
            conv("c2", 200, "A caller John asked about pricing."),
        ]);
        let store = MemoryStore::new();
        let rec = Reconciler::new(&store, utc());

        let stats = pull(&source, &rec, None).await.unwrap();
        assert_eq!((stats.listed, stats.created, stats.existing), (2, 2, 0));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn second_pull_skips_known_without_fetching() {
        let source = FakeSource::new(vec![conv("c1", 100, "Jane Doe called.")]);
        let store = MemoryStore::new();
        let rec = Reconciler::new(&store, utc());

        pull(&source, &rec, None).await.unwrap();
        let stats = pull(&source, &rec, None).await.unwrap();
        assert_eq!((stats.created, stats.existing), (0, 1));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn since_filters_old_conversations() {
        let source = FakeSource::new(vec![
            conv("old", 100, "Jane Doe called."),
            conv("new", 500, "Tom Baker phoned in."),
        ]);
        let store = MemoryStore::new();
        let rec = Reconciler::new(&store, utc());

        let stats = pull(&source, &rec, Some(300)).await.unwrap();
        assert_eq!(stats.listed, 1);
        assert!(store.find_by_conversation_id("new").unwrap().is_some());
        assert!(store.find_by_conversation_id("old").unwrap().is_none());
    }

    #[tokio::test]
    async fn fetch_failure_is_counted_and_skipped() {
        let mut source = FakeSource::new(vec![
            conv("c1", 100, "Jane Doe called."),
            conv("c2", 200, "Tom Baker phoned in."),
        ]);
        source.broken.push("c1".into());
        let store = MemoryStore::new();
        let rec = Reconciler::new(&store, utc());

        let stats = pull(&source, &rec, None).await.unwrap();
        assert_eq!((stats.created, stats.failed), (1, 1));
        assert!(store.find_by_conversation_id("c2").unwrap().is_some());
    }

    #[tokio::test]
    async fn listing_failure_aborts() {
        let mut source = FakeSource::new(vec![]);
        source.fail_listing = true;
        let store = MemoryStore::new();
        let rec = Reconciler::new(&store, utc());

        let err = pull(&source, &rec, None).await.unwrap_err();
        assert!(err.to_string().contains("listing down"));
    }
}
