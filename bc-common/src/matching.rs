//! Inscription text matching
//!
//! Decides whether text read off a physical marker agrees with the expected
//! inscription. Two policies exist:
//!
//! - **Strict**: punctuation stripped, whitespace collapsed, lowercased; the
//!   normalized edit similarity must reach the strict threshold (default 0.8).
//! - **Lenient**: common OCR confusions cleaned up on both sides; accepted when
//!   one string contains the other, or when the better of word-overlap and
//!   edit similarity reaches the lenient threshold (default 0.6).
//!
//! For both policies `matched` holds exactly when `score >= threshold`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::{Error, Result};

/// Default strict edit-similarity threshold
pub const DEFAULT_STRICT_THRESHOLD: f64 = 0.8;

/// Default lenient similarity threshold
pub const DEFAULT_LENIENT_THRESHOLD: f64 = 0.6;

/// Which matching rules to apply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    #[default]
    Strict,
    Lenient,
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::Strict => write!(f, "strict"),
            MatchPolicy::Lenient => write!(f, "lenient"),
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(MatchPolicy::Strict),
            "lenient" => Ok(MatchPolicy::Lenient),
            other => Err(Error::InvalidInput(format!(
                "unknown match policy '{}' (expected 'strict' or 'lenient')",
                other
            ))),
        }
    }
}

/// Outcome classification of a marker check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    PartialMatch,
    Invalid,
    NotScanned,
}

impl ValidationStatus {
    /// Valid above 0.8 confidence, partial above 0.5, otherwise invalid
    pub fn classify(is_valid: bool, confidence: f64) -> Self {
        if is_valid && confidence > 0.8 {
            ValidationStatus::Valid
        } else if is_valid && confidence > 0.5 {
            ValidationStatus::PartialMatch
        } else {
            ValidationStatus::Invalid
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValidationStatus::Valid => "Valid",
            ValidationStatus::PartialMatch => "Partial Match",
            ValidationStatus::Invalid => "Invalid",
            ValidationStatus::NotScanned => "Not Scanned",
        };
        f.write_str(label)
    }
}

/// Thresholds per policy, each in (0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchThresholds {
    pub strict: f64,
    pub lenient: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            strict: DEFAULT_STRICT_THRESHOLD,
            lenient: DEFAULT_LENIENT_THRESHOLD,
        }
    }
}

impl MatchThresholds {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("strict", self.strict), ("lenient", self.lenient)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(Error::Config(format!(
                    "{} threshold must be in (0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn for_policy(&self, policy: MatchPolicy) -> f64 {
        match policy {
            MatchPolicy::Strict => self.strict,
            MatchPolicy::Lenient => self.lenient,
        }
    }
}

/// Result of comparing one scanned text with one expected inscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub policy: MatchPolicy,
    /// Expected text after policy preparation
    pub expected: String,
    /// Scanned text after policy preparation
    pub scanned: String,
    pub edit_similarity: f64,
    pub word_similarity: f64,
    pub contains: bool,
    pub threshold: f64,
    pub score: f64,
    pub matched: bool,
    pub status: ValidationStatus,
}

/// Applies one policy with configured thresholds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextMatcher {
    policy: MatchPolicy,
    thresholds: MatchThresholds,
}

impl TextMatcher {
    pub fn new(policy: MatchPolicy, thresholds: MatchThresholds) -> Self {
        Self { policy, thresholds }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn thresholds(&self) -> MatchThresholds {
        self.thresholds
    }

    /// Same thresholds, different policy
    pub fn with_policy(&self, policy: MatchPolicy) -> Self {
        Self {
            policy,
            thresholds: self.thresholds,
        }
    }

    pub fn evaluate(&self, expected: &str, scanned: &str) -> MatchOutcome {
        let (expected, scanned) = match self.policy {
            MatchPolicy::Strict => (normalize(expected), normalize(scanned)),
            MatchPolicy::Lenient => (prepare_lenient(expected), prepare_lenient(scanned)),
        };

        let edit = edit_similarity(&expected, &scanned);
        let word = word_similarity(&expected, &scanned);
        let contains = contains_match(&expected, &scanned);
        let threshold = self.thresholds.for_policy(self.policy);

        let (score, matched, status) = if scanned.is_empty() {
            (0.0, false, ValidationStatus::NotScanned)
        } else {
            let (score, matched) = match self.policy {
                MatchPolicy::Strict => (edit, edit >= threshold),
                MatchPolicy::Lenient => {
                    let best = edit.max(word);
                    if best >= threshold {
                        (best, true)
                    } else if contains {
                        (threshold, true)
                    } else {
                        (best, false)
                    }
                }
            };
            (score, matched, ValidationStatus::classify(matched, score))
        };

        debug!(
            policy = %self.policy,
            expected = %expected,
            scanned = %scanned,
            edit = edit,
            word = word,
            contains = contains,
            score = score,
            matched = matched,
            "Evaluated inscription match"
        );

        MatchOutcome {
            policy: self.policy,
            expected,
            scanned,
            edit_similarity: edit,
            word_similarity: word,
            contains,
            threshold,
            score,
            matched,
            status,
        }
    }
}

/// Keep ASCII letters, digits and whitespace; collapse whitespace; lowercase
pub fn normalize(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    collapse_whitespace(&kept).to_lowercase()
}

/// Undo common OCR artifacts
///
/// Brackets and braces are dropped, `|` read as `I`, `0` as `O`, `5` as `S`.
pub fn clean_ocr_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '{' | '}'))
        .map(|c| match c {
            '|' => 'I',
            '0' => 'O',
            '5' => 'S',
            other => other,
        })
        .collect();
    collapse_whitespace(&cleaned)
}

fn prepare_lenient(text: &str) -> String {
    clean_ocr_text(text).to_lowercase()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Character edit distance
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// `1 - distance / max_len`; two empty strings are identical
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Jaccard index of the whitespace-separated word sets
pub fn word_similarity(a: &str, b: &str) -> f64 {
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();

    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    intersection as f64 / union as f64
}

/// Either string contains the other (empty strings never match)
pub fn contains_match(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

/// Search-box matching: substring, else in-order subsequence, case-insensitive
pub fn fuzzy_subsequence(query: &str, target: &str) -> bool {
    let query = query.trim().to_lowercase();
    let target = target.to_lowercase();

    if query.is_empty() || target.contains(&query) {
        return true;
    }

    let mut wanted = query.chars().peekable();
    for c in target.chars() {
        match wanted.peek() {
            Some(&q) if q == c => {
                wanted.next();
            }
            Some(_) => {}
            None => break,
        }
    }
    wanted.peek().is_none()
}
