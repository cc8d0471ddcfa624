//! Terminal output: lead cards, correction reports, resolver results.
//!
//! A lead card renders a single-row RecordBatch from the `leads` table,
//! grouped into sections, skipping sections with no non-null values.

use arrow::array::{Array, LargeStringArray, StringArray};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use leadmachine_core::{ExtractionResult, Resolution};
use leadmachine_ingest::CorrectionReport;

const SUMMARY_WIDTH: usize = 72;

// ── Column groupings ──

const IDENTITY: &[&str] = &["id", "first_name", "last_name"];
const CONTACT: &[&str] = &["phone"];
const ORIGIN: &[&str] = &["source", "source_conversation_id"];
const TIMESTAMPS: &[&str] = &["created_at", "updated_at"];

// ── Public API ──

/// Print a single lead as a vertical card.
pub fn print_lead_card(batch: &RecordBatch) -> anyhow::Result<()> {
    let first = get_utf8(batch, "first_name").unwrap_or_default();
    let last = get_utf8(batch, "last_name").unwrap_or_default();

    println!("=== {first} {last} ===");
    println!();

    print_section(batch, "Identity", IDENTITY)?;
    print_section(batch, "Contact", CONTACT)?;
    print_section(batch, "Origin", ORIGIN)?;

    if let Some(summary) = get_utf8(batch, "issue_description")
        && !summary.is_empty()
    {
        println!("Call Summary");
        for line in wrap(&summary, SUMMARY_WIDTH) {
            println!("  {line}");
        }
        println!();
    }

    print_section(batch, "Timestamps", TIMESTAMPS)?;
    Ok(())
}

/// Print a correction report: one line per change and skip, then the summary.
pub fn print_report(report: &CorrectionReport) {
    for change in &report.changes {
        let rule = change.rule.map(|r| r.as_str()).unwrap_or("-");
        println!(
            "  #{:<6} {:<16} {} {} -> {} {}  [{rule}]",
            change.lead_id,
            change.phone.as_deref().unwrap_or("-"),
            change.before.first_name,
            change.before.last_name,
            change.after.first_name,
            change.after.last_name,
        );
    }
    for skip in &report.skips {
        println!(
            "  #{:<6} {:<16} skipped: {}",
            skip.lead_id,
            skip.phone.as_deref().unwrap_or("-"),
            skip.reason
        );
    }
    for failure in &report.failures {
        println!("  #{:<6} FAILED: {}", failure.lead_id, failure.error);
    }
    if report.examined > 0 {
        println!();
    }
    println!("{}", report.summary());
}

/// Print a resolver result with the rule that produced it.
pub fn print_resolution(resolution: &Resolution) {
    let rule = resolution.rule.map(|r| r.as_str()).unwrap_or("-");
    match &resolution.result {
        ExtractionResult::Resolved {
            first_name,
            last_name,
        } => println!("resolved: {first_name} {last_name} [{rule}]"),
        ExtractionResult::PartiallyResolved { first_name } => {
            println!("partially resolved: {first_name} [{rule}]")
        }
        ExtractionResult::Unresolved => println!("unresolved"),
    }
}

// ── Section rendering ──

fn print_section(batch: &RecordBatch, header: &str, cols: &[&str]) -> anyhow::Result<()> {
    let mut rows = Vec::new();
    for &col in cols {
        if let Some(text) = cell_text(batch, col)? {
            rows.push((col, text));
        }
    }
    if rows.is_empty() {
        return Ok(());
    }

    println!("{header}");
    for (col, text) in rows {
        println!("  {col:<24} {text}");
    }
    println!();
    Ok(())
}

// ── Helpers ──

/// Display text of row 0 of a column, or `None` when the column is missing
/// or null.
fn cell_text(
    batch: &RecordBatch,
    col_name: &str,
) -> Result<Option<String>, arrow::error::ArrowError> {
    let Ok(idx) = batch.schema().index_of(col_name) else {
        return Ok(None);
    };
    let col = batch.column(idx);
    if col.is_null(0) {
        return Ok(None);
    }
    let fmt = ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())?;
    Ok(Some(fmt.value(0).to_string()))
}

fn get_utf8(batch: &RecordBatch, col_name: &str) -> Option<String> {
    let idx = batch.schema().index_of(col_name).ok()?;
    let col = batch.column(idx);
    if col.is_null(0) {
        return None;
    }
    if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        return Some(arr.value(0).to_string());
    }
    if let Some(arr) = col.as_any().downcast_ref::<LargeStringArray>() {
        return Some(arr.value(0).to_string());
    }
    None
}

/// Greedy word wrap.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
