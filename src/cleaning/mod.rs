//! Post-OCR text cleaning
//!
//! Cleaning is a pure `raw text -> cleaned text` transform. PII offsets are
//! always relative to the cleaned text, so the cleaner runs exactly once per
//! document and its output is what detection and the result document see.
//!
//! Line structure is kept: horizontal whitespace collapses to single spaces
//! and blank lines disappear, but line breaks survive so that detection
//! patterns anchored to a single line do not join words across lines.

pub mod quality;

pub use quality::{assess_quality, QualityReport};

use fancy_regex::Regex as LookaroundRegex;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Cleaned text plus the steps applied and a quality estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedText {
    pub text: String,
    pub steps: Vec<String>,
    pub quality: QualityReport,
}

/// Transforms raw OCR output into detection-ready text
pub trait TextCleaner: Send + Sync {
    fn clean(&self, raw: &str) -> CleanedText;
}

/// Character confusions typical of OCR on printed forms
static OCR_CONFUSIONS: LazyLock<Vec<(LookaroundRegex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\b0(?=[A-Za-z])", "O"),
        (r"(?<=[A-Za-z])0\b", "o"),
        (r"\b1(?=[A-Za-z])", "I"),
        (r"(?<=[A-Za-z])1(?=[A-Za-z])", "l"),
        (r"\b5(?=[A-Za-z])", "S"),
        (r"(?<=[A-Za-z])5(?=[A-Za-z])", "s"),
        (r"\|", "I"),
        (r"(?<=[a-z])rn(?=[a-z])", "m"),
        (r"vv", "w"),
        (r"\bMG\b", "mg"),
        (r"\bML\b", "ml"),
        (r"\bTAB\b", "tab"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            LookaroundRegex::new(pattern).expect("OCR confusion pattern must compile"),
            replacement,
        )
    })
    .collect()
});

/// Dosage, quantity and clock-time spacing
static MEDICAL_FORMATS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\b(\d+)[ \t]*mg\b", "${1}mg"),
        (r"(?i)\b(\d+)[ \t]*ml\b", "${1}ml"),
        (r"(?i)\b(\d+)[ \t]*tab\b", "${1} tab"),
        (r"(?i)\b(\d+)[ \t]*x[ \t]*(\d+)\b", "${1}x${2}"),
        (r"(?i)\b(\d{1,2})[ \t]*:[ \t]*(\d{2})[ \t]*(am|pm)\b", "${1}:${2}${3}"),
        (r"\b(\d{1,2})[ \t]*:[ \t]*(\d{2})\b", "${1}:${2}"),
        (r"(?i)\b(\d{1,2})[ \t]+(am|pm)\b", "${1}${2}"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("medical format pattern must compile"),
            replacement,
        )
    })
    .collect()
});

/// Scanner noise: stray punctuation, letter-spaced fragments, rules
static ARTIFACTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"[ \t][^\w\s][ \t]",
        r"\b[A-Za-z][ \t]+[A-Za-z][ \t]+[A-Za-z]\b",
        r"_{2,}",
        r"-{3,}",
        r"\.{3,}",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("artifact pattern must compile"))
    .collect()
});

static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("whitespace pattern must compile"));

/// Default cleaner for OCR output of medical documents
#[derive(Debug, Clone, Default)]
pub struct OcrTextCleaner;

impl OcrTextCleaner {
    pub fn new() -> Self {
        Self
    }

    /// Collapse runs of spaces/tabs, trim each line and drop blank lines
    pub fn normalize_whitespace(&self, text: &str) -> String {
        text.lines()
            .map(|line| HORIZONTAL_SPACE.replace_all(line, " ").trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Fix character-level OCR confusions such as `0` read for `O`
    pub fn fix_ocr_confusions(&self, text: &str) -> String {
        let mut corrected = text.to_string();
        for (pattern, replacement) in OCR_CONFUSIONS.iter() {
            // a backtracking limit leaves the text as it was
            match pattern.try_replacen(&corrected, 0, *replacement) {
                Ok(Cow::Owned(replaced)) => corrected = replaced,
                Ok(Cow::Borrowed(_)) => {}
                Err(e) => tracing::debug!(error = %e, "Skipped OCR correction"),
            }
        }
        corrected
    }

    /// Normalize dosage units and clock times
    pub fn normalize_medical_formats(&self, text: &str) -> String {
        MEDICAL_FORMATS
            .iter()
            .fold(text.to_string(), |acc, (pattern, replacement)| {
                pattern.replace_all(&acc, *replacement).into_owned()
            })
    }

    /// Drop scanner noise, leaving single spaces where it was
    pub fn remove_artifacts(&self, text: &str) -> String {
        let stripped = ARTIFACTS.iter().fold(text.to_string(), |acc, pattern| {
            pattern.replace_all(&acc, " ").into_owned()
        });
        self.normalize_whitespace(&stripped)
    }
}

impl TextCleaner for OcrTextCleaner {
    fn clean(&self, raw: &str) -> CleanedText {
        if raw.trim().is_empty() {
            return CleanedText {
                text: String::new(),
                steps: Vec::new(),
                quality: QualityReport::default(),
            };
        }

        let text = self.normalize_whitespace(raw);
        let text = self.fix_ocr_confusions(&text);
        let text = self.normalize_medical_formats(&text);
        let text = self.remove_artifacts(&text);

        let quality = assess_quality(raw, &text);
        tracing::debug!(
            original_length = raw.chars().count(),
            cleaned_length = text.chars().count(),
            quality_score = quality.quality_score,
            "Text cleaned"
        );

        CleanedText {
            text,
            steps: [
                "whitespace_normalization",
                "ocr_error_correction",
                "medical_text_cleaning",
                "artifact_removal",
            ]
            .map(String::from)
            .to_vec(),
            quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_whitespace_keeps_line_breaks() {
        let cleaner = OcrTextCleaner::new();
        assert_eq!(
            cleaner.normalize_whitespace("  Patient:\tJane   Doe \n\n\n MRN  123456  "),
            "Patient: Jane Doe\nMRN 123456"
        );
    }

    #[test_case("0RDER", "ORDER" ; "zero at word start")]
    #[test_case("Hell0", "Hello" ; "zero at word end")]
    #[test_case("1buprofen", "Ibuprofen" ; "one at word start")]
    #[test_case("Ta1ble", "Talble" ; "one inside word")]
    #[test_case("5alt", "Salt" ; "five at word start")]
    #[test_case("|nsulin", "Insulin" ; "pipe")]
    #[test_case("barnacle", "bamacle" ; "rn inside word")]
    #[test_case("vvater", "water" ; "double v")]
    #[test_case("500 MG", "500 mg" ; "upper case unit")]
    fn test_ocr_confusions(input: &str, expected: &str) {
        assert_eq!(OcrTextCleaner::new().fix_ocr_confusions(input), expected);
    }

    #[test]
    fn test_numbers_are_not_rewritten() {
        let cleaner = OcrTextCleaner::new();
        assert_eq!(cleaner.fix_ocr_confusions("555-123-4567"), "555-123-4567");
        assert_eq!(cleaner.fix_ocr_confusions("123-45-6789"), "123-45-6789");
    }

    #[test_case("Take 500 mg daily", "Take 500mg daily")]
    #[test_case("5 ml syrup", "5ml syrup")]
    #[test_case("2tab", "2 tab")]
    #[test_case("2 x 3", "2x3")]
    #[test_case("at 8 : 30 am", "at 8:30am")]
    #[test_case("at 9 pm", "at 9pm")]
    fn test_medical_formats(input: &str, expected: &str) {
        assert_eq!(OcrTextCleaner::new().normalize_medical_formats(input), expected);
    }

    #[test]
    fn test_artifacts_removed() {
        let cleaner = OcrTextCleaner::new();
        assert_eq!(
            cleaner.remove_artifacts("Name ~ Jane ____ Doe ----- ok....."),
            "Name Jane Doe ok"
        );
    }

    #[test]
    fn test_clean_full_pipeline() {
        let cleaned = OcrTextCleaner::new().clean("Patient:  Jane Doe\n\nTake 20 mg  at 8 am\n");

        assert_eq!(cleaned.text, "Patient: Jane Doe\nTake 20mg at 8am");
        assert_eq!(cleaned.steps.len(), 4);
        assert!(cleaned.quality.quality_score > 0.0);
    }

    #[test]
    fn test_clean_blank_input() {
        let cleaned = OcrTextCleaner::new().clean(" \n\t ");
        assert!(cleaned.text.is_empty());
        assert!(cleaned.steps.is_empty());
        assert_eq!(cleaned.quality.quality_score, 0.0);
    }

    #[test]
    fn test_clean_is_idempotent_on_clean_text() {
        let cleaner = OcrTextCleaner::new();
        let once = cleaner.clean("Dr. Sarah Johnson\nPhone: (555) 123-4567").text;
        let twice = cleaner.clean(&once).text;
        assert_eq!(once, twice);
    }
}
