//! Resilient decision parsing
//!
//! The reasoning service usually answers with a single JSON object, but the
//! format drifts: prose around the object, markdown code fences, or a
//! double-encoded object full of backslash escapes. Recovery runs through an
//! explicit ordered strategy chain with first-success semantics, so the
//! fallback order is visible and each strategy is testable on its own.
//!
//! A record that parses structurally but fails validation is rejected
//! outright. Defaulting a malformed decision to Hold would disguise a parser
//! bug as a legitimate trading signal.

use crate::logger::{self, LogTag};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// DECISION RECORD
// ============================================================================

/// Trading action recommended by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
            TradeAction::Hold => write!(f, "hold"),
        }
    }
}

/// Model-reported risk of acting on the recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Validated trading recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionRecord {
    pub decision: TradeAction,
    pub reason: String,
    pub risk_level: RiskLevel,
    pub confidence_score: u8,
}

/// Terminal parse failure. Carries the original response text for
/// diagnostics; the cycle aborts without dispatching.
#[derive(Debug, Clone, Error)]
#[error("no valid decision recovered from response: {raw}")]
pub struct DecisionParseError {
    pub raw: String,
}

// ============================================================================
// PARSE STRATEGIES
// ============================================================================

/// Shape of the object as the model writes it, before validation.
/// `confidence` is accepted as an alias since older prompt revisions used it.
#[derive(Debug, Deserialize)]
struct RawDecision {
    decision: String,
    reason: String,
    risk_level: String,
    #[serde(alias = "confidence")]
    confidence_score: i64,
}

/// One recovery strategy, attempted in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseStrategy {
    /// The whole trimmed text is the object
    DirectParse,
    /// First `{` through last `}`: strips prose and code fences
    PatternExtract,
    /// PatternExtract substring with backslash escapes decoded first
    UnicodeRecover,
}

const STRATEGY_CHAIN: [ParseStrategy; 3] = [
    ParseStrategy::DirectParse,
    ParseStrategy::PatternExtract,
    ParseStrategy::UnicodeRecover,
];

impl ParseStrategy {
    fn try_parse(&self, raw: &str) -> Option<RawDecision> {
        match self {
            ParseStrategy::DirectParse => serde_json::from_str(raw.trim()).ok(),
            ParseStrategy::PatternExtract => {
                let span = braced_span(raw)?;
                serde_json::from_str(span).ok()
            }
            ParseStrategy::UnicodeRecover => {
                let span = braced_span(raw)?;
                serde_json::from_str(&decode_backslash_escapes(span)).ok()
            }
        }
    }
}

/// Greedy substring from the first `{` to the last `}`
fn braced_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Decode backslash escape sequences left over from double-encoding.
///
/// Handles the JSON escapes (\n, \t, \r, \b, \f, \", \\, \/) and \uXXXX with
/// surrogate pairs. Unknown or truncated sequences are kept verbatim.
fn decode_backslash_escapes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('u') => match decode_unicode_escape(&mut chars) {
                Some(decoded) => out.push(decoded),
                None => out.push_str("\\u"),
            },
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Decode the 4 hex digits after `\u`, consuming a trailing low surrogate
/// when the first unit is a high surrogate.
fn decode_unicode_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Option<char> {
    let high = take_hex4(chars)?;
    if (0xD800..0xDC00).contains(&high) {
        // Expect "\uDCxx" immediately after
        if chars.peek() == Some(&'\\') {
            let mut lookahead = chars.clone();
            lookahead.next();
            if lookahead.next() == Some('u') {
                if let Some(low) = take_hex4(&mut lookahead) {
                    if (0xDC00..0xE000).contains(&low) {
                        *chars = lookahead;
                        let combined =
                            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                        return char::from_u32(combined);
                    }
                }
            }
        }
        return None;
    }
    char::from_u32(high)
}

fn take_hex4(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..4 {
        let digit = chars.next()?.to_digit(16)?;
        value = value * 16 + digit;
    }
    Some(value)
}

// ============================================================================
// VALIDATION
// ============================================================================

fn validate(raw: RawDecision) -> Option<DecisionRecord> {
    let decision = match raw.decision.to_lowercase().as_str() {
        "buy" => TradeAction::Buy,
        "sell" => TradeAction::Sell,
        "hold" => TradeAction::Hold,
        _ => return None,
    };
    let risk_level = match raw.risk_level.to_lowercase().as_str() {
        "low" => RiskLevel::Low,
        "medium" => RiskLevel::Medium,
        "high" => RiskLevel::High,
        _ => return None,
    };
    if !(0..=100).contains(&raw.confidence_score) {
        return None;
    }
    if raw.reason.trim().is_empty() {
        return None;
    }

    Some(DecisionRecord {
        decision,
        reason: raw.reason,
        risk_level,
        confidence_score: raw.confidence_score as u8,
    })
}

// ============================================================================
// ENTRY POINT
// ============================================================================

/// Parse a validated DecisionRecord out of raw model output.
///
/// Strategies run in order; the first structural success terminates the
/// chain. A structurally-parsed record that fails validation is terminal,
/// never defaulted.
pub fn parse_decision(raw: &str) -> Result<DecisionRecord, DecisionParseError> {
    for strategy in STRATEGY_CHAIN {
        let Some(candidate) = strategy.try_parse(raw) else {
            continue;
        };

        logger::debug(
            LogTag::Decision,
            &format!("structural parse via {:?}", strategy),
        );

        return validate(candidate).ok_or_else(|| DecisionParseError {
            raw: raw.to_string(),
        });
    }

    Err(DecisionParseError {
        raw: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_is_idempotent() {
        let record = DecisionRecord {
            decision: TradeAction::Sell,
            reason: "overbought on the daily".to_string(),
            risk_level: RiskLevel::Medium,
            confidence_score: 64,
        };

        let json = serde_json::to_string(&record).unwrap();
        let reparsed = parse_decision(&json).unwrap();

        assert_eq!(reparsed, record);
    }

    #[test]
    fn test_code_fence_recovered_by_pattern_extract() {
        let text = "Here is my analysis:\n```json\n{\"decision\":\"buy\",\"reason\":\"momentum\",\"risk_level\":\"low\",\"confidence_score\":72}\n```\nThanks!";
        let record = parse_decision(text).unwrap();

        assert_eq!(record.decision, TradeAction::Buy);
        assert_eq!(record.reason, "momentum");
        assert_eq!(record.risk_level, RiskLevel::Low);
        assert_eq!(record.confidence_score, 72);
    }

    #[test]
    fn test_double_encoded_recovered_by_unicode_strategy() {
        let text = "Response: {\\\"decision\\\": \\\"hold\\\", \\\"reason\\\": \\\"sideways \\u2192 wait\\\", \\\"risk_level\\\": \\\"low\\\", \\\"confidence_score\\\": 55}";
        let record = parse_decision(text).unwrap();

        assert_eq!(record.decision, TradeAction::Hold);
        assert!(record.reason.contains('\u{2192}'));
    }

    #[test]
    fn test_no_braces_is_terminal() {
        let err = parse_decision("I cannot decide.").unwrap_err();
        assert_eq!(err.raw, "I cannot decide.");
    }

    #[test]
    fn test_out_of_range_confidence_rejected_not_clamped() {
        let text = "{\"decision\":\"buy\",\"reason\":\"x\",\"risk_level\":\"low\",\"confidence_score\":150}";
        assert!(parse_decision(text).is_err());
    }

    #[test]
    fn test_fractional_confidence_rejected() {
        let text = "{\"decision\":\"buy\",\"reason\":\"x\",\"risk_level\":\"low\",\"confidence_score\":72.5}";
        assert!(parse_decision(text).is_err());
    }

    #[test]
    fn test_unknown_decision_rejected() {
        let text = "{\"decision\":\"accumulate\",\"reason\":\"x\",\"risk_level\":\"low\",\"confidence_score\":50}";
        assert!(parse_decision(text).is_err());
    }

    #[test]
    fn test_empty_reason_rejected() {
        let text = "{\"decision\":\"hold\",\"reason\":\"  \",\"risk_level\":\"low\",\"confidence_score\":50}";
        assert!(parse_decision(text).is_err());
    }

    #[test]
    fn test_case_folding_of_enums() {
        let text = "{\"decision\":\"BUY\",\"reason\":\"breakout\",\"risk_level\":\"High\",\"confidence_score\":90}";
        let record = parse_decision(text).unwrap();

        assert_eq!(record.decision, TradeAction::Buy);
        assert_eq!(record.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_legacy_confidence_alias() {
        let text = "{\"decision\":\"sell\",\"reason\":\"distribution\",\"risk_level\":\"medium\",\"confidence\":61}";
        let record = parse_decision(text).unwrap();

        assert_eq!(record.confidence_score, 61);
    }

    #[test]
    fn test_braced_span_is_greedy() {
        assert_eq!(braced_span("ab {x} cd {y} ef"), Some("{x} cd {y}"));
        assert_eq!(braced_span("no braces"), None);
        assert_eq!(braced_span("} reversed {"), None);
    }

    #[test]
    fn test_escape_decoding() {
        assert_eq!(decode_backslash_escapes("a\\nb"), "a\nb");
        assert_eq!(decode_backslash_escapes("\\\"quoted\\\""), "\"quoted\"");
        assert_eq!(decode_backslash_escapes("\\u0041"), "A");
        // Surrogate pair for U+1F600
        assert_eq!(decode_backslash_escapes("\\uD83D\\uDE00"), "\u{1F600}");
        // Unknown escape preserved
        assert_eq!(decode_backslash_escapes("\\q"), "\\q");
    }
}
