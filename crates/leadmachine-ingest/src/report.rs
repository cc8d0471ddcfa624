//! Audit report produced by the name correction pass.

use std::fmt;

use leadmachine_core::{LeadName, LeadRecord, PatternId};
use serde::{Deserialize, Serialize};

/// Whether the correction pass writes its changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionMode {
    /// Compute the report without touching the store.
    DryRun,
    /// Write every resolved name.
    Apply,
}

impl CorrectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DryRun => "dry_run",
            Self::Apply => "apply",
        }
    }

    pub fn writes(&self) -> bool {
        matches!(self, Self::Apply)
    }
}

impl fmt::Display for CorrectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lead whose placeholder name was (or would be) replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameChange {
    pub lead_id: i64,
    pub phone: Option<String>,
    pub before: LeadName,
    pub after: LeadName,
    pub rule: Option<PatternId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The lead has no stored call summary.
    EmptyDescription,
    /// The resolver found no name in the summary.
    NoNameFound,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EmptyDescription => "no issue description",
            Self::NoNameFound => "no name found",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLead {
    pub lead_id: i64,
    pub phone: Option<String>,
    pub reason: SkipReason,
}

/// A per-lead write failure. The pass continues past these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedUpdate {
    pub lead_id: i64,
    pub error: String,
}

/// Outcome of one correction pass.
///
/// `examined == updated + skipped + failed` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionReport {
    pub mode: CorrectionMode,
    pub examined: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub changes: Vec<NameChange>,
    pub skips: Vec<SkippedLead>,
    pub failures: Vec<FailedUpdate>,
}

impl CorrectionReport {
    pub fn new(mode: CorrectionMode, examined: usize) -> Self {
        Self {
            mode,
            examined,
            updated: 0,
            skipped: 0,
            failed: 0,
            changes: Vec::new(),
            skips: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub(crate) fn record_change(&mut self, change: NameChange) {
        self.updated += 1;
        self.changes.push(change);
    }

    pub(crate) fn record_skip(&mut self, lead: &LeadRecord, reason: SkipReason) {
        self.skipped += 1;
        self.skips.push(SkippedLead {
            lead_id: lead.id,
            phone: lead.phone.clone(),
            reason,
        });
    }

    pub(crate) fn record_failure(&mut self, lead_id: i64, error: String) {
        self.failed += 1;
        self.failures.push(FailedUpdate { lead_id, error });
    }

    /// One-line summary for logs and CLI output.
    pub fn summary(&self) -> String {
        let verb = if self.mode.writes() {
            "Updated"
        } else {
            "Would update"
        };
        format!(
            "{verb} {}/{} placeholder leads ({} skipped, {} failed)",
            self.updated, self.examined, self.skipped, self.failed
        )
    }
}
