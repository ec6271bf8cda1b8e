//! Category validators and contextual confidence adjustments
//!
//! A validator receives a raw regex hit and either rejects it (`None`) or
//! returns an adjusted, unclamped score.

use super::ContextSettings;
use crate::domain::PiiType;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Score assigned to SSNs in ranges the SSA never issues
pub const INVALID_SSN_CONFIDENCE: f64 = 0.01;

/// Labeled medical identifiers score at least this much
pub const LABELED_MEDICAL_ID_CONFIDENCE: f64 = 0.8;

/// Unlabeled identifiers are capped below the default medical_id floor
pub const UNLABELED_MEDICAL_ID_CAP: f64 = 0.45;

static CANONICAL_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\(\d{3}\) \d{3}-\d{4}|\d{3}-\d{3}-\d{4}|\d{10})$")
        .expect("canonical phone pattern is valid")
});

static PHONE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:phone|ph|tel|telephone|cell|mobile|fax|contact)\b\.?\s*(?:#|no\.?|number)?\s*[:\-]?\s*$",
    )
    .expect("phone label pattern is valid")
});

static SSN_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bssn|\bss\s?#|\bsocial\s+security(?:\s+(?:no\.?|number|#))?)\s*[:#]?\s*$")
        .expect("ssn label pattern is valid")
});

static MEDICAL_ID_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\bmrn\b|\bmr\s?#|\bmedical\s+record\b|\brecord\s+(?:no|number)\b|\bpatient\s+id\b|\bchart\b)",
    )
    .expect("medical id label pattern is valid")
});

static ADDRESS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:address|addr|lives\s+at|resides(?:\s+at)?|residence|home)\b")
        .expect("address label pattern is valid")
});

static MEDICAL_CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:patient|doctor|dr|physician|nurse|medical|hospital|clinic|chart|record|diagnosis|dob|age|mrn)\b",
    )
    .expect("medical context pattern is valid")
});

static DEMOGRAPHIC_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[,;(]?\s*(?:DOB|D\.O\.B\.?|Age|Born)\b").expect("demographic cue pattern is valid")
});

/// Capitalised words that look like names but are not
const NAME_STOP_WORDS: &[&str] = &[
    "street", "avenue", "road", "drive", "lane", "boulevard", "court", "hospital", "clinic",
    "medical", "center", "centre", "health", "patient", "name", "record", "number", "phone",
    "address", "date", "birth", "social", "security", "chart", "doctor", "insurance", "diagnosis",
    "prescription", "blood", "pressure", "heart", "rate", "signature", "dear", "the", "and",
    "north", "south", "east", "west", "city", "state", "county", "january", "february", "march",
    "april", "may", "june", "july", "august", "september", "october", "november", "december",
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

/// Raw regex hit plus the text around it
pub struct MatchContext<'a> {
    text: &'a str,
    start: usize,
    end: usize,
    caps: &'a Captures<'a>,
    settings: ContextSettings,
}

impl<'a> MatchContext<'a> {
    /// `start`/`end` are byte offsets of the reported span
    pub fn new(
        text: &'a str,
        start: usize,
        end: usize,
        caps: &'a Captures<'a>,
        settings: ContextSettings,
    ) -> Self {
        Self {
            text,
            start,
            end,
            caps,
            settings,
        }
    }

    pub fn span(&self) -> &'a str {
        &self.text[self.start..self.end]
    }

    /// Up to `context_window_chars` characters before the span
    pub fn before(&self) -> &'a str {
        tail_chars(&self.text[..self.start], self.settings.context_window_chars)
    }

    /// Up to `context_window_chars` characters after the span
    pub fn after(&self) -> &'a str {
        head_chars(&self.text[self.end..], self.settings.context_window_chars)
    }

    /// The last `label_window_tokens` whitespace-separated tokens before the span
    pub fn preceding_tokens(&self) -> String {
        let tokens: Vec<&str> = self.before().split_whitespace().collect();
        let skip = tokens.len().saturating_sub(self.settings.label_window_tokens);
        tokens[skip..].join(" ")
    }

    /// Whether the rule's named group participated in the match
    pub fn has_group(&self, name: &str) -> bool {
        self.caps.name(name).is_some()
    }

    /// Whether the span is glued to a neighbouring digit
    pub fn digit_adjacent(&self) -> bool {
        let before = self.text[..self.start].chars().next_back();
        let after = self.text[self.end..].chars().next();
        before.is_some_and(|c| c.is_ascii_digit()) || after.is_some_and(|c| c.is_ascii_digit())
    }

    /// Whether the span is glued to a letter or digit, as inside an invoice
    /// or accession code
    pub fn alphanumeric_adjacent(&self) -> bool {
        let before = self.text[..self.start].chars().next_back();
        let after = self.text[self.end..].chars().next();
        before.is_some_and(char::is_alphanumeric) || after.is_some_and(char::is_alphanumeric)
    }
}

fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((i, _)) => &s[i..],
        None => s,
    }
}

fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

fn digits_of(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Validate and score a raw hit of `category`
pub fn score(category: PiiType, base: f64, ctx: &MatchContext<'_>) -> Option<f64> {
    match category {
        PiiType::Phone => score_phone(base, ctx),
        PiiType::Ssn => score_ssn(base, ctx),
        PiiType::MedicalId => score_medical_id(base, ctx),
        PiiType::Address => score_address(base, ctx),
        PiiType::Name => score_name(base, ctx),
    }
}

fn score_phone(base: f64, ctx: &MatchContext<'_>) -> Option<f64> {
    if ctx.alphanumeric_adjacent() {
        return None;
    }

    let span = ctx.span().trim();
    let digits = digits_of(span);
    let national = match digits.len() {
        10 => Some(digits.as_str()),
        11 if digits.starts_with('1') => Some(&digits[1..]),
        7 => None,
        _ => return None,
    };

    let mut confidence = base;
    match national {
        Some(number) => {
            if CANONICAL_PHONE.is_match(span) {
                confidence += 0.1;
            }
            if number.starts_with('0') || number.starts_with('1') {
                confidence -= 0.2;
            }
        }
        // seven digits without an area code
        None => confidence *= 0.5,
    }

    if PHONE_LABEL.is_match(ctx.before()) {
        confidence += 0.1;
    }

    Some(confidence)
}

/// Whether nine SSN digits fall in an issuable range
pub fn is_valid_ssn(digits: &str) -> bool {
    if digits.len() != 9 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let area = &digits[0..3];
    let group = &digits[3..5];
    let serial = &digits[5..9];

    if area == "000" || area == "666" || area.starts_with('9') {
        return false;
    }
    if group == "00" || serial == "0000" {
        return false;
    }

    let first = digits.as_bytes()[0];
    !digits.bytes().all(|b| b == first)
}

fn score_ssn(base: f64, ctx: &MatchContext<'_>) -> Option<f64> {
    if ctx.digit_adjacent() {
        return None;
    }

    let digits = digits_of(ctx.span());
    if digits.len() != 9 {
        return None;
    }
    if !is_valid_ssn(&digits) {
        return Some(INVALID_SSN_CONFIDENCE);
    }

    let mut confidence = base;
    if SSN_LABEL.is_match(ctx.before()) {
        confidence += 0.1;
    }
    Some(confidence)
}

fn score_medical_id(base: f64, ctx: &MatchContext<'_>) -> Option<f64> {
    if !ctx.span().chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    if MEDICAL_ID_LABEL.is_match(&ctx.preceding_tokens()) {
        Some(base.max(LABELED_MEDICAL_ID_CONFIDENCE))
    } else {
        Some(base.min(UNLABELED_MEDICAL_ID_CAP))
    }
}

fn score_address(base: f64, ctx: &MatchContext<'_>) -> Option<f64> {
    let mut confidence = base;

    if ctx.has_group("number") {
        confidence += 0.1;
    }
    if ctx.has_group("zip") {
        confidence += 0.15;
    }
    if ctx.has_group("unit") {
        confidence += 0.05;
    }
    if ADDRESS_LABEL.is_match(ctx.before()) {
        confidence += 0.05;
    }

    Some(confidence)
}

fn is_name_stop_word(token: &str) -> bool {
    let word = token.trim_matches(|c: char| !c.is_alphabetic()).to_lowercase();
    NAME_STOP_WORDS.contains(&word.as_str())
}

fn score_name(base: f64, ctx: &MatchContext<'_>) -> Option<f64> {
    if ctx.span().split_whitespace().any(is_name_stop_word) {
        return None;
    }

    let mut confidence = base;
    if MEDICAL_CONTEXT.is_match(ctx.before()) || MEDICAL_CONTEXT.is_match(ctx.after()) {
        confidence += 0.1;
    }
    if DEMOGRAPHIC_CUE.is_match(ctx.after()) {
        confidence += 0.2;
    }

    Some(confidence)
}
