//! Core lead types, caller-name resolution, and placeholder naming.

pub mod conversation;
pub mod lead;
pub mod names;
pub mod placeholder;

pub use conversation::{Conversation, ConversationSource, ConversationSummary};
pub use lead::{LeadRecord, LeadSource, NewLead, UnknownLeadSource};
pub use names::{ExtractionResult, PatternId, Resolution, resolve, resolve_with_rule};
pub use placeholder::{LeadName, is_placeholder, names_for_call, names_from_resolution};
