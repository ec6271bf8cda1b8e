//! Heuristic quality score for cleaned OCR text

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Vocabulary expected on prescriptions and clinical forms
const MEDICAL_TERMS: &[&str] = &[
    "paracetamol", "ibuprofen", "aspirin", "amoxicillin", "metformin",
    "atorvastatin", "omeprazole", "simvastatin", "ramipril", "amlodipine",
    "levothyroxine", "lansoprazole", "bendroflumethiazide", "salbutamol",
    "prednisolone", "warfarin", "furosemide", "bisoprolol", "clopidogrel",
    "dose", "dosage", "tablet", "capsule", "syrup", "injection", "cream",
    "ointment", "drops", "spray", "inhaler", "patch", "suppository",
    "morning", "evening", "night", "daily", "twice", "thrice", "weekly",
    "monthly", "before", "after", "meals", "food", "empty", "stomach",
    "patient", "doctor", "physician", "nurse", "clinic", "hospital",
    "prescription", "medication", "treatment", "therapy", "diagnosis",
];

/// Ten distinct terms saturate the medical score
const MEDICAL_TERM_SATURATION: f64 = 10.0;

static STRUCTURE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\d+mg",
        r"(?i)\d+ml",
        r"(?i)\d+ ?tab",
        r"\d{1,2}:\d{2}",
        r"\d{1,2}/\d{1,2}",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("structure pattern must compile"))
    .collect()
});

/// Quality metrics for one cleaning pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Weighted combination of the metrics below
    pub quality_score: f64,
    /// Cleaned word count over original word count
    pub word_retention: f64,
    /// Share of characters removed by cleaning
    pub char_reduction: f64,
    pub medical_score: f64,
    pub structure_score: f64,
    pub medical_terms_found: usize,
}

/// Score how much of the original survived cleaning and how document-like
/// the result is.
///
/// Either text being empty scores zero.
pub fn assess_quality(original: &str, cleaned: &str) -> QualityReport {
    if original.trim().is_empty() || cleaned.trim().is_empty() {
        return QualityReport::default();
    }

    let original_words = original.split_whitespace().count() as f64;
    let cleaned_words = cleaned.split_whitespace().count() as f64;
    let word_retention = cleaned_words / original_words;

    let original_chars = original.chars().count() as f64;
    let cleaned_chars = cleaned.chars().count() as f64;
    let char_reduction = 1.0 - cleaned_chars / original_chars;

    let lowered = cleaned.to_lowercase();
    let medical_terms_found = MEDICAL_TERMS
        .iter()
        .filter(|term| lowered.contains(*term))
        .count();
    let medical_score = (medical_terms_found as f64 / MEDICAL_TERM_SATURATION).min(1.0);

    let structure_matches = STRUCTURE_PATTERNS
        .iter()
        .filter(|pattern| pattern.is_match(cleaned))
        .count();
    let structure_score = structure_matches as f64 / STRUCTURE_PATTERNS.len() as f64;

    let quality_score = word_retention * 0.3
        + (1.0 - char_reduction) * 0.2
        + medical_score * 0.3
        + structure_score * 0.2;

    QualityReport {
        quality_score,
        word_retention,
        char_reduction,
        medical_score,
        structure_score,
        medical_terms_found,
    }
}
