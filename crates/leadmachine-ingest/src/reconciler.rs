//! Turning conversations into leads, and fixing placeholder names later.

use chrono::FixedOffset;
use leadmachine_core::{
    Conversation, LeadName, LeadSource, NewLead, names_for_call, names_from_resolution,
    resolve_with_rule,
};
use leadmachine_store::{LeadStore, StoreError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::report::{CorrectionMode, CorrectionReport, NameChange, SkipReason};

#[derive(Debug, Error)]
pub enum CorrectionError {
    /// The candidate query failed; nothing was examined.
    #[error("selecting placeholder leads failed: {0}")]
    Selection(#[source] StoreError),
}

/// Result of [`Reconciler::ingest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new lead was inserted.
    Created(i64),
    /// A lead already existed for the conversation; nothing was written.
    Existing(i64),
}

impl IngestOutcome {
    pub fn id(&self) -> i64 {
        match self {
            Self::Created(id) | Self::Existing(id) => *id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Creates one lead per conversation and repairs placeholder names.
///
/// `offset` is the zone used to render the call time in placeholder last
/// names (`"Call (03:43 PM)"`).
pub struct Reconciler<S> {
    store: S,
    offset: FixedOffset,
}

impl<S: LeadStore> Reconciler<S> {
    pub fn new(store: S, offset: FixedOffset) -> Self {
        Self { store, offset }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Ingest one conversation.
    ///
    /// Repeat deliveries of the same `conversation_id` return the existing
    /// lead's id without writing.
    pub fn ingest(&self, conv: &Conversation) -> Result<IngestOutcome, StoreError> {
        if let Some(existing) = self.store.find_by_conversation_id(&conv.conversation_id)? {
            debug!(
                conversation_id = %conv.conversation_id,
                lead_id = existing.id,
                "conversation already ingested"
            );
            return Ok(IngestOutcome::Existing(existing.id));
        }

        let resolution = resolve_with_rule(conv.transcript.as_deref());
        let name = names_for_call(&resolution.result, conv.started_at_unix_secs, &self.offset);

        let lead = NewLead {
            first_name: name.first_name,
            last_name: name.last_name,
            phone: conv.caller_phone.clone(),
            source: LeadSource::IncomingCall,
            source_conversation_id: Some(conv.conversation_id.clone()),
            issue_description: conv.transcript.clone(),
        };

        match self.store.insert_lead(&lead) {
            Ok(id) => {
                info!(
                    lead_id = id,
                    conversation_id = %conv.conversation_id,
                    name = %format!("{} {}", lead.first_name, lead.last_name),
                    rule = resolution.rule.map(|r| r.as_str()).unwrap_or("none"),
                    "created lead from call"
                );
                Ok(IngestOutcome::Created(id))
            }
            // Lost a race with a concurrent delivery of the same conversation.
            Err(err) => match self.store.find_by_conversation_id(&conv.conversation_id) {
                Ok(Some(existing)) => {
                    warn!(
                        conversation_id = %conv.conversation_id,
                        lead_id = existing.id,
                        error = %err,
                        "insert rejected, conversation ingested concurrently"
                    );
                    Ok(IngestOutcome::Existing(existing.id))
                }
                _ => Err(err),
            },
        }
    }

    /// Re-run the resolver over leads still carrying the placeholder name.
    ///
    /// Safe to repeat: a corrected lead no longer has first name `"Unknown"`
    /// and drops out of the candidate set. A failed update is logged and
    /// counted; the pass moves on to the next lead.
    pub fn correct_names(&self, mode: CorrectionMode) -> Result<CorrectionReport, CorrectionError> {
        let candidates = self
            .store
            .placeholder_candidates()
            .map_err(CorrectionError::Selection)?;

        info!(candidates = candidates.len(), %mode, "starting name correction pass");
        let mut report = CorrectionReport::new(mode, candidates.len());

        for lead in &candidates {
            let Some(description) = lead.issue_description.as_deref().filter(|d| !d.is_empty())
            else {
                report.record_skip(lead, SkipReason::EmptyDescription);
                continue;
            };

            let resolution = resolve_with_rule(description);
            let Some(after) = names_from_resolution(&resolution.result) else {
                debug!(lead_id = lead.id, "no name found in description");
                report.record_skip(lead, SkipReason::NoNameFound);
                continue;
            };

            if mode.writes()
                && let Err(e) = self
                    .store
                    .update_name(lead.id, &after.first_name, &after.last_name)
            {
                warn!(lead_id = lead.id, error = %e, "failed to update lead name");
                report.record_failure(lead.id, e.to_string());
                continue;
            }

            info!(
                lead_id = lead.id,
                before = %lead.full_name(),
                after = %format!("{} {}", after.first_name, after.last_name),
                phone = lead.phone.as_deref().unwrap_or("-"),
                "corrected lead name"
            );
            report.record_change(NameChange {
                lead_id: lead.id,
                phone: lead.phone.clone(),
                before: LeadName::new(lead.first_name.as_str(), lead.last_name.as_str()),
                after,
                rule: resolution.rule,
            });
        }

        info!(
            examined = report.examined,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            "name correction pass complete"
        );
        Ok(report)
    }
}
