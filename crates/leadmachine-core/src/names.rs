//! Caller-name extraction from call summaries.
//!
//! The voice-AI provider produces a free-text summary per call, e.g.
//! "Robin Wright, an existing client, called Sword and Shield Attorneys to
//! request a callback". [`resolve`] pulls the caller's name out of that text
//! with an ordered list of patterns.
//!
//! # Rules
//!
//! Patterns are tried in a fixed priority order and the first match wins.
//! Full-name rules (two capitalised words) come first:
//!
//! - `P1`: `^First Last[, an existing client,] called` (start of text only)
//! - `P2`: `First Last provided|stated|mentioned|gave`
//! - `P3`: `spoke with|speaking with First Last`
//! - `P4`: `name is|named First Last`
//! - `P5`: `First Last called|contacted|phoned` at start of text or after `. `
//!
//! Then single-name rules:
//!
//! - `S1`: `^First called`
//! - `S2`: `caller|client First`
//! - `S3`: `name [is] First`
//!
//! Context words match case-insensitively. Name tokens always have the shape
//! `[A-Z][a-z]+`.
//!
//! # Limitations
//!
//! - No semantic check: a company or agent name in the right position is
//!   accepted as the caller's name.
//! - Exactly two tokens for full names; "Anna Van Der Berg" yields
//!   `Anna Van` at best.
//! - No case or whitespace normalisation of the captured words.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Outcome of running the resolver over one summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionResult {
    /// Both first and last name were captured.
    Resolved {
        first_name: String,
        last_name: String,
    },
    /// Only a first name was captured; no last name is claimed.
    PartiallyResolved { first_name: String },
    /// No rule matched.
    Unresolved,
}

impl ExtractionResult {
    pub fn first_name(&self) -> Option<&str> {
        match self {
            Self::Resolved { first_name, .. } | Self::PartiallyResolved { first_name } => {
                Some(first_name)
            }
            Self::Unresolved => None,
        }
    }
}

/// Identifier of the rule that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternId {
    P1,
    P2,
    P3,
    P4,
    P5,
    S1,
    S2,
    S3,
}

impl PatternId {
    /// True for the rules that capture first and last name.
    pub fn is_full_name(&self) -> bool {
        matches!(self, Self::P1 | Self::P2 | Self::P3 | Self::P4 | Self::P5)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
            Self::P4 => "P4",
            Self::P5 => "P5",
            Self::S1 => "S1",
            Self::S2 => "S2",
            Self::S3 => "S3",
        }
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`resolve_with_rule`]: the extraction plus the rule that fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub result: ExtractionResult,
    pub rule: Option<PatternId>,
}

// ── Rule table ──

/// Priority order. Earlier entries win.
const RULES: &[(PatternId, &str)] = &[
    (
        PatternId::P1,
        r"^([A-Z][a-z]+)\s+([A-Z][a-z]+)(?:,[^,]*,)?\s+(?i:called)",
    ),
    (
        PatternId::P2,
        r"([A-Z][a-z]+)\s+([A-Z][a-z]+)\s+(?i:provided|stated|mentioned|gave)",
    ),
    (
        PatternId::P3,
        r"(?i:spoke|speaking)\s+(?i:with)\s+([A-Z][a-z]+)\s+([A-Z][a-z]+)",
    ),
    (
        PatternId::P4,
        r"(?i:name\s+is|named)\s+([A-Z][a-z]+)\s+([A-Z][a-z]+)",
    ),
    (
        PatternId::P5,
        r"(?:^|\.\s+)([A-Z][a-z]+)\s+([A-Z][a-z]+)\s+(?i:called|contacted|phoned)",
    ),
    (PatternId::S1, r"^([A-Z][a-z]+)\s+(?i:called)"),
    (PatternId::S2, r"(?i:caller|client)\s+([A-Z][a-z]+)"),
    (PatternId::S3, r"(?i:name)\s+(?:(?i:is)\s+)?([A-Z][a-z]+)"),
];

static COMPILED: LazyLock<Vec<(PatternId, Regex)>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|&(id, src)| {
            let re = Regex::new(src).unwrap_or_else(|e| panic!("rule {id} is invalid: {e}"));
            (id, re)
        })
        .collect()
});

// ── Public API ──

/// Extract the caller's name from a call summary.
///
/// Accepts `&str` or `Option<&str>`; absent and empty input are
/// [`ExtractionResult::Unresolved`]. Pure and deterministic.
pub fn resolve<'a>(transcript: impl Into<Option<&'a str>>) -> ExtractionResult {
    resolve_with_rule(transcript).result
}

/// Like [`resolve`], also reporting which rule matched.
pub fn resolve_with_rule<'a>(transcript: impl Into<Option<&'a str>>) -> Resolution {
    let Some(text) = transcript.into().filter(|t| !t.is_empty()) else {
        return Resolution {
            result: ExtractionResult::Unresolved,
            rule: None,
        };
    };

    for (id, re) in COMPILED.iter() {
        let Some(caps) = re.captures(text) else {
            continue;
        };
        let result = if id.is_full_name() {
            ExtractionResult::Resolved {
                first_name: caps[1].to_string(),
                last_name: caps[2].to_string(),
            }
        } else {
            ExtractionResult::PartiallyResolved {
                first_name: caps[1].to_string(),
            }
        };
        return Resolution {
            result,
            rule: Some(*id),
        };
    }

    Resolution {
        result: ExtractionResult::Unresolved,
        rule: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(first: &str, last: &str) -> ExtractionResult {
        ExtractionResult::Resolved {
            first_name: first.into(),
            last_name: last.into(),
        }
    }

    fn partial(first: &str) -> ExtractionResult {
        ExtractionResult::PartiallyResolved {
            first_name: first.into(),
        }
    }

    fn rule_of(text: &str) -> Option<PatternId> {
        resolve_with_rule(text).rule
    }

    #[test]
    fn all_rules_compile() {
        assert_eq!(COMPILED.len(), RULES.len());
    }

    #[test]
    fn empty_and_absent_are_unresolved() {
        assert_eq!(resolve(""), ExtractionResult::Unresolved);
        assert_eq!(resolve(None::<&str>), ExtractionResult::Unresolved);
        assert_eq!(resolve_with_rule("").rule, None);
    }

    #[test]
    fn existing_client_called() {
        let text = "Robin Wright, an existing client, called Sword and Shield Attorneys \
                    to request a callback regarding her case.";
        assert_eq!(resolve(text), full("Robin", "Wright"));
        assert_eq!(rule_of(text), Some(PatternId::P1));
    }

    #[test]
    fn plain_called_at_start() {
        let text = "Maria Lopez called about a leaking water heater.";
        assert_eq!(resolve(text), full("Maria", "Lopez"));
        assert_eq!(rule_of(text), Some(PatternId::P1));
    }

    #[test]
    fn called_mid_sentence_is_not_p1() {
        // P1 is anchored; the mid-text occurrence falls through to P5.
        let text = "Follow up needed. Maria Lopez called about a leaking water heater.";
        assert_eq!(resolve(text), full("Maria", "Lopez"));
        assert_eq!(rule_of(text), Some(PatternId::P5));
    }

    #[test]
    fn name_before_reporting_verb() {
        let text = "The caller said that Peter Novak provided his phone number.";
        assert_eq!(resolve(text), full("Peter", "Novak"));
        assert_eq!(rule_of(text), Some(PatternId::P2));
    }

    #[test]
    fn every_reporting_verb_resolves() {
        for text in [
            "During the call Maria Lopez stated she was injured at work.",
            "Later Maria Lopez mentioned a prior claim.",
            "At the end Maria Lopez gave a callback number.",
        ] {
            assert_eq!(resolve(text), full("Maria", "Lopez"), "{text}");
            assert_eq!(rule_of(text), Some(PatternId::P2), "{text}");
        }
    }

    #[test]
    fn spoke_with() {
        let text = "The agent spoke with John Smith about his account.";
        assert_eq!(resolve(text), full("John", "Smith"));
        assert_eq!(rule_of(text), Some(PatternId::P3));
    }

    #[test]
    fn speaking_with_is_case_insensitive() {
        let text = "Agent was SPEAKING WITH Dana Scully regarding an invoice.";
        assert_eq!(resolve(text), full("Dana", "Scully"));
        assert_eq!(rule_of(text), Some(PatternId::P3));
    }

    #[test]
    fn name_is() {
        let text = "The customer said her name is Grace Hopper and asked for a quote.";
        assert_eq!(resolve(text), full("Grace", "Hopper"));
        assert_eq!(rule_of(text), Some(PatternId::P4));
    }

    #[test]
    fn named() {
        let text = "A woman named Ada Byron wants a consultation.";
        assert_eq!(resolve(text), full("Ada", "Byron"));
        assert_eq!(rule_of(text), Some(PatternId::P4));
    }

    #[test]
    fn contacted_after_sentence_boundary() {
        let text = "New lead. Tom Baker contacted the office about roof repairs.";
        assert_eq!(resolve(text), full("Tom", "Baker"));
        assert_eq!(rule_of(text), Some(PatternId::P5));
    }

    #[test]
    fn phoned_at_start() {
        let text = "Tom Baker phoned in about roof repairs.";
        assert_eq!(resolve(text), full("Tom", "Baker"));
        assert_eq!(rule_of(text), Some(PatternId::P5));
    }

    #[test]
    fn single_name_called_at_start() {
        let text = "Kevin called to ask about opening hours.";
        assert_eq!(resolve(text), partial("Kevin"));
        assert_eq!(rule_of(text), Some(PatternId::S1));
    }

    #[test]
    fn caller_followed_by_name() {
        let text = "A caller John asked about pricing.";
        assert_eq!(resolve(text), partial("John"));
        assert_eq!(rule_of(text), Some(PatternId::S2));
    }

    #[test]
    fn client_followed_by_name() {
        let text = "Returning client Priya wants to reschedule.";
        assert_eq!(resolve(text), partial("Priya"));
        assert_eq!(rule_of(text), Some(PatternId::S2));
    }

    #[test]
    fn name_followed_by_single_word() {
        assert_eq!(resolve("Her name is Olga."), partial("Olga"));
        assert_eq!(rule_of("Her name is Olga."), Some(PatternId::S3));
        assert_eq!(resolve("Left a name: nothing. name Boris"), partial("Boris"));
    }

    #[test]
    fn no_name_is_unresolved() {
        let text = "Thank you for calling, how can I help?";
        assert_eq!(resolve(text), ExtractionResult::Unresolved);
        assert_eq!(rule_of(text), None);
    }

    #[test]
    fn lowercase_words_are_not_names() {
        let text = "the agent spoke with the customer about billing.";
        assert_eq!(resolve(text), ExtractionResult::Unresolved);
    }

    #[test]
    fn first_rule_in_order_wins() {
        let text = "Jane Doe called the office. Jane Doe provided her number. \
                    The agent spoke with Mark Twain.";
        assert_eq!(resolve(text), full("Jane", "Doe"));
        assert_eq!(rule_of(text), Some(PatternId::P1));
    }

    #[test]
    fn full_name_rules_beat_single_name_rules() {
        // S2 would match "client Robin" but P3 is tried first.
        let text = "The client Robin asked to be transferred; we spoke with Robin Wright.";
        assert_eq!(resolve(text), full("Robin", "Wright"));
        assert_eq!(rule_of(text), Some(PatternId::P3));
    }

    #[test]
    fn deterministic() {
        let texts = [
            "Robin Wright, an existing client, called.",
            "A caller John asked about pricing.",
            "Thank you for calling, how can I help?",
            "",
        ];
        for t in texts {
            assert_eq!(resolve_with_rule(t), resolve_with_rule(t));
        }
    }

    #[test]
    fn non_person_names_are_not_filtered() {
        let text = "The agent spoke with Acme Plumbing about a contract.";
        assert_eq!(resolve(text), full("Acme", "Plumbing"));
    }

    #[test]
    fn multi_word_last_name_takes_two_tokens() {
        let text = "The caller said her name is Anna Van Der Berg.";
        assert_eq!(resolve(text), full("Anna", "Van"));
    }

    #[test]
    fn resolved_names_have_capitalised_shape() {
        let text = "Jane Doe called the office.";
        match resolve(text) {
            ExtractionResult::Resolved {
                first_name,
                last_name,
            } => {
                for w in [first_name, last_name] {
                    let mut chars = w.chars();
                    assert!(chars.next().is_some_and(|c| c.is_ascii_uppercase()));
                    assert!(chars.all(|c| c.is_ascii_lowercase()));
                }
            }
            other => panic!("expected Resolved, got {other:?}"),
        }
    }

    #[test]
    fn first_name_accessor() {
        assert_eq!(full("A", "B").first_name(), Some("A"));
        assert_eq!(partial("C").first_name(), Some("C"));
        assert_eq!(ExtractionResult::Unresolved.first_name(), None);
    }

    #[test]
    fn extraction_result_json_shape() {
        let json = serde_json::to_value(full("Robin", "Wright")).unwrap();
        assert_eq!(json["status"], "resolved");
        assert_eq!(json["first_name"], "Robin");
        let json = serde_json::to_value(ExtractionResult::Unresolved).unwrap();
        assert_eq!(json["status"], "unresolved");
    }
}
