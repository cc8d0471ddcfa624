//! Call-lead reconciliation: conversation ingestion, the placeholder name
//! correction pass, and the provider pull loop.

pub mod pull;
pub mod reconciler;
pub mod report;

pub use pull::{PullStats, pull};
pub use reconciler::{CorrectionError, IngestOutcome, Reconciler};
pub use report::{
    CorrectionMode, CorrectionReport, FailedUpdate, NameChange, SkipReason, SkippedLead,
};
