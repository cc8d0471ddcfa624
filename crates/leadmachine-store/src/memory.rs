//! Ephemeral lead store backed by a `Vec` behind a mutex.

use std::sync::{Mutex, MutexGuard};

use leadmachine_core::{LeadRecord, LeadSource, NewLead, is_placeholder};

use crate::{LeadStore, StoreError};

#[derive(Default)]
struct Inner {
    leads: Vec<LeadRecord>,
    next_id: i64,
}

/// In-memory [`LeadStore`]. Ids start at 1.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored leads.
    pub fn len(&self) -> usize {
        self.lock().map(|g| g.leads.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored lead, in insertion order.
    pub fn all(&self) -> Result<Vec<LeadRecord>, StoreError> {
        Ok(self.lock()?.leads.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Other(format!("mutex poisoned: {e}")))
    }
}

impl LeadStore for MemoryStore {
    fn find_by_conversation_id(
        &self,
        conversation_id: &str,
    ) -> Result<Option<LeadRecord>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .leads
            .iter()
            .find(|l| l.source_conversation_id.as_deref() == Some(conversation_id))
            .cloned())
    }

    fn get_lead(&self, id: i64) -> Result<Option<LeadRecord>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.leads.iter().find(|l| l.id == id).cloned())
    }

    fn insert_lead(&self, lead: &NewLead) -> Result<i64, StoreError> {
        let mut inner = self.lock()?;
        if let Some(conv) = lead.source_conversation_id.as_deref()
            && inner
                .leads
                .iter()
                .any(|l| l.source_conversation_id.as_deref() == Some(conv))
        {
            return Err(StoreError::DuplicateConversation(conv.to_string()));
        }
        inner.next_id += 1;
        let id = inner.next_id;
        inner.leads.push(lead.clone().into_record(id));
        Ok(id)
    }

    fn update_name(&self, id: i64, first_name: &str, last_name: &str) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let lead = inner
            .leads
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(StoreError::NotFound(id))?;
        lead.first_name = first_name.to_string();
        lead.last_name = last_name.to_string();
        Ok(())
    }

    fn placeholder_candidates(&self) -> Result<Vec<LeadRecord>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .leads
            .iter()
            .filter(|l| {
                l.source == LeadSource::IncomingCall && is_placeholder(&l.first_name, &l.last_name)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_lead(conv: &str, first: &str, last: &str) -> NewLead {
        NewLead {
            first_name: first.into(),
            last_name: last.into(),
            phone: Some("+15550100".into()),
            source: LeadSource::IncomingCall,
            source_conversation_id: Some(conv.into()),
            issue_description: Some("summary".into()),
        }
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let a = store.insert_lead(&call_lead("c1", "A", "B")).unwrap();
        let b = store.insert_lead(&call_lead("c2", "C", "D")).unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn duplicate_conversation_rejected() {
        let store = MemoryStore::new();
        store.insert_lead(&call_lead("c1", "A", "B")).unwrap();
        let err = store.insert_lead(&call_lead("c1", "A", "B")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateConversation(c) if c == "c1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn leads_without_conversation_id_do_not_collide() {
        let store = MemoryStore::new();
        let mut lead = call_lead("x", "A", "B");
        lead.source_conversation_id = None;
        store.insert_lead(&lead).unwrap();
        store.insert_lead(&lead).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn find_and_get() {
        let store = MemoryStore::new();
        let id = store.insert_lead(&call_lead("c1", "A", "B")).unwrap();
        assert_eq!(store.find_by_conversation_id("c1").unwrap().unwrap().id, id);
        assert!(store.find_by_conversation_id("nope").unwrap().is_none());
        assert_eq!(store.get_lead(id).unwrap().unwrap().first_name, "A");
        assert!(store.get_lead(99).unwrap().is_none());
    }

    #[test]
    fn update_name_only_changes_names() {
        let store = MemoryStore::new();
        let id = store.insert_lead(&call_lead("c1", "Unknown", "Call (01:00 PM)")).unwrap();
        store.update_name(id, "Robin", "Wright").unwrap();
        let lead = store.get_lead(id).unwrap().unwrap();
        assert_eq!(lead.full_name(), "Robin Wright");
        assert_eq!(lead.phone.as_deref(), Some("+15550100"));
        assert_eq!(lead.issue_description.as_deref(), Some("summary"));
    }

    #[test]
    fn update_missing_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.update_name(5, "A", "B"),
            Err(StoreError::NotFound(5))
        ));
    }

    #[test]
    fn placeholder_candidates_filter() {
        let store = MemoryStore::new();
        store.insert_lead(&call_lead("c1", "Unknown", "Call (01:00 PM)")).unwrap();
        store.insert_lead(&call_lead("c2", "Robin", "Wright")).unwrap();
        let mut form = call_lead("c3", "Unknown", "Call (02:00 PM)");
        form.source = LeadSource::WebsiteForm;
        store.insert_lead(&form).unwrap();

        let candidates = store.placeholder_candidates().unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].source_conversation_id.as_deref(), Some("c1"));
    }
}
