//! Fallback naming for leads whose caller name could not be extracted.
//!
//! Unresolved calls are stored as `("Unknown", "Call (03:43 PM)")`. That
//! pair doubles as the selector for the correction pass, so the two sides
//! of this module must stay in agreement: [`placeholder_name`] produces it,
//! [`is_placeholder`] recognises it.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::names::ExtractionResult;

/// First name given to leads with no extracted name.
pub const UNKNOWN_FIRST_NAME: &str = "Unknown";

/// Last name given to leads where only a first name was extracted.
pub const PARTIAL_LAST_NAME: &str = "Caller";

/// Substring every placeholder last name contains.
pub const PLACEHOLDER_MARKER: &str = "Call";

/// A first/last name pair ready to be written to a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadName {
    pub first_name: String,
    pub last_name: String,
}

impl LeadName {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

/// Map a resolver result to lead names.
///
/// `Resolved` keeps both names, `PartiallyResolved` gets the `"Caller"`
/// last name, `Unresolved` yields `None`.
pub fn names_from_resolution(result: &ExtractionResult) -> Option<LeadName> {
    match result {
        ExtractionResult::Resolved {
            first_name,
            last_name,
        } => Some(LeadName::new(first_name.as_str(), last_name.as_str())),
        ExtractionResult::PartiallyResolved { first_name } => {
            Some(LeadName::new(first_name.as_str(), PARTIAL_LAST_NAME))
        }
        ExtractionResult::Unresolved => None,
    }
}

/// `"Call (hh:mm AM/PM)"` for a call started at `started_at_unix_secs`,
/// rendered in `offset`.
///
/// Timestamps outside chrono's range render as the epoch.
pub fn placeholder_last_name(started_at_unix_secs: i64, offset: &FixedOffset) -> String {
    let utc: DateTime<Utc> = DateTime::from_timestamp(started_at_unix_secs, 0).unwrap_or_default();
    let local = utc.with_timezone(offset);
    format!("{PLACEHOLDER_MARKER} ({})", local.format("%I:%M %p"))
}

/// The full `("Unknown", "Call (…)")` placeholder pair.
pub fn placeholder_name(started_at_unix_secs: i64, offset: &FixedOffset) -> LeadName {
    LeadName::new(
        UNKNOWN_FIRST_NAME,
        placeholder_last_name(started_at_unix_secs, offset),
    )
}

/// Names for a freshly ingested call: the resolver's names, or the
/// placeholder when nothing was extracted.
pub fn names_for_call(
    result: &ExtractionResult,
    started_at_unix_secs: i64,
    offset: &FixedOffset,
) -> LeadName {
    names_from_resolution(result)
        .unwrap_or_else(|| placeholder_name(started_at_unix_secs, offset))
}

/// True when a name pair looks like one produced by [`placeholder_name`].
pub fn is_placeholder(first_name: &str, last_name: &str) -> bool {
    first_name == UNKNOWN_FIRST_NAME && last_name.contains(PLACEHOLDER_MARKER)
}
