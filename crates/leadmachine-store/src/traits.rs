use leadmachine_core::{LeadRecord, NewLead};

use crate::StoreError;

/// The record-store contract the reconciler is written against.
///
/// ## Uniqueness
///
/// At most one lead may carry a given `source_conversation_id`. Backends
/// that can enforce this (a UNIQUE column, a map lookup) should reject the
/// second insert with an error; callers still check
/// [`find_by_conversation_id`](Self::find_by_conversation_id) first.
///
/// ## Mutation
///
/// Leads are never deleted through this trait. The only in-place change is
/// [`update_name`](Self::update_name), which touches `first_name` and
/// `last_name` and nothing else.
pub trait LeadStore {
    /// Look up the lead created for a conversation, if any.
    fn find_by_conversation_id(
        &self,
        conversation_id: &str,
    ) -> Result<Option<LeadRecord>, StoreError>;

    /// Fetch a lead by id.
    fn get_lead(&self, id: i64) -> Result<Option<LeadRecord>, StoreError>;

    /// Insert a lead and return its store-assigned id.
    fn insert_lead(&self, lead: &NewLead) -> Result<i64, StoreError>;

    /// Overwrite a lead's first and last name.
    ///
    /// Returns `Err(StoreError::NotFound)` when no lead has this id.
    fn update_name(&self, id: i64, first_name: &str, last_name: &str) -> Result<(), StoreError>;

    /// Leads still carrying the fallback name: first name `"Unknown"`, a
    /// last name containing `"Call"`, and source `Incoming Call`.
    ///
    /// Ordered by id.
    fn placeholder_candidates(&self) -> Result<Vec<LeadRecord>, StoreError>;
}

impl<S: LeadStore + ?Sized> LeadStore for &S {
    fn find_by_conversation_id(
        &self,
        conversation_id: &str,
    ) -> Result<Option<LeadRecord>, StoreError> {
        (**self).find_by_conversation_id(conversation_id)
    }

    fn get_lead(&self, id: i64) -> Result<Option<LeadRecord>, StoreError> {
        (**self).get_lead(id)
    }

    fn insert_lead(&self, lead: &NewLead) -> Result<i64, StoreError> {
        (**self).insert_lead(lead)
    }

    fn update_name(&self, id: i64, first_name: &str, last_name: &str) -> Result<(), StoreError> {
        (**self).update_name(id, first_name, last_name)
    }

    fn placeholder_candidates(&self) -> Result<Vec<LeadRecord>, StoreError> {
        (**self).placeholder_candidates()
    }
}
