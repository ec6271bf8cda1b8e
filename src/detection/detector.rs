//! Pattern-based PII detector

use super::config::DetectionConfig;
use super::patterns::{Candidate, PatternLibrary};
use super::resolve::resolve_overlaps;
use crate::domain::{PiiMatch, PiiType};
use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;

/// Finds classified, non-overlapping PII spans in cleaned OCR text.
///
/// The detector holds only immutable state and can be shared across threads.
/// Identical input always yields identical output.
#[derive(Debug, Clone)]
pub struct PiiDetector {
    library: Arc<PatternLibrary>,
    config: DetectionConfig,
}

impl PiiDetector {
    /// Create a detector from configuration, loading its pattern library
    pub fn new(config: DetectionConfig) -> Result<Self> {
        let library = PatternLibrary::from_config(&config)?;
        Ok(Self {
            library: Arc::new(library),
            config,
        })
    }

    /// Create a detector with default settings and the built-in patterns
    pub fn with_defaults() -> Result<Self> {
        Self::new(DetectionConfig::default())
    }

    /// Create a detector with a custom pattern library
    pub fn with_library(library: PatternLibrary, config: DetectionConfig) -> Self {
        Self {
            library: Arc::new(library),
            config,
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    /// Detect every enabled PII category in `text`.
    ///
    /// Returns matches sorted by `start_pos` with no two spans overlapping.
    /// Empty text or text without PII yields an empty vector.
    pub fn detect_all_pii(&self, text: &str) -> Vec<PiiMatch> {
        let categories: Vec<PiiType> = PiiType::ALL
            .into_iter()
            .filter(|t| self.config.is_enabled(*t))
            .collect();
        self.detect_in(text, &categories)
    }

    /// Detect a single category, applying the same floors and resolution
    pub fn detect_category(&self, text: &str, category: PiiType) -> Vec<PiiMatch> {
        self.detect_in(text, &[category])
    }

    fn detect_in(&self, text: &str, categories: &[PiiType]) -> Vec<PiiMatch> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let started = Instant::now();
        let mut candidates = Vec::new();
        let mut raw_count = 0usize;

        for &category in categories {
            let found = self.library.match_category(text, category);
            raw_count += found.len();
            candidates.extend(found.into_iter().filter(|c| self.passes_floor(c)));
        }

        let above_floor = candidates.len();
        let resolved = resolve_overlaps(candidates);

        tracing::debug!(
            text_length = text.chars().count(),
            raw_candidates = raw_count,
            above_floor = above_floor,
            accepted = resolved.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "PII detection complete"
        );

        resolved
            .into_iter()
            .map(|c| PiiMatch::new(c.text, c.pii_type, c.confidence, c.start, c.end))
            .collect()
    }

    fn passes_floor(&self, candidate: &Candidate) -> bool {
        let category_floor = self.config.min_confidence.for_type(candidate.pii_type);
        let floor = candidate
            .rule_floor
            .map_or(category_floor, |rule| rule.max(category_floor));
        candidate.confidence >= floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> PiiDetector {
        PiiDetector::with_defaults().unwrap()
    }

    #[test]
    fn test_empty_text() {
        assert!(detector().detect_all_pii("").is_empty());
        assert!(detector().detect_all_pii("   \n\t").is_empty());
    }

    #[test]
    fn test_no_pii() {
        let text = "take two tablets every morning with water";
        assert!(detector().detect_all_pii(text).is_empty());
    }

    #[test]
    fn test_detect_ssn() {
        let matches = detector().detect_all_pii("SSN: 123-45-6789");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].pii_type(), PiiType::Ssn);
        assert_eq!(matches[0].text(), "123-45-6789");
        assert!(matches[0].confidence() >= 0.9);
    }

    #[test]
    fn test_invalid_ssn_filtered() {
        let matches = detector().detect_all_pii("SSN: 000-12-3456");
        assert!(matches.iter().all(|m| m.pii_type() != PiiType::Ssn));
    }

    #[test]
    fn test_bare_capitalized_pair_needs_strong_context() {
        let d = detector();
        assert!(d
            .detect_category("Saw Jane Doe today", PiiType::Name)
            .is_empty());

        let with_cues = d.detect_category("Patient Jane Doe DOB 01/02/1980", PiiType::Name);
        assert_eq!(with_cues.len(), 1);
        assert_eq!(with_cues[0].text(), "Jane Doe");
    }

    #[test]
    fn test_disabled_category_skipped() {
        let config = DetectionConfig {
            enabled_types: vec![PiiType::Phone],
            ..Default::default()
        };
        let d = PiiDetector::new(config).unwrap();
        let matches = d.detect_all_pii("SSN: 123-45-6789, Phone: (555) 123-4567");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].pii_type(), PiiType::Phone);
    }

    #[test]
    fn test_raised_floor_suppresses_matches() {
        let mut config = DetectionConfig::default();
        config.min_confidence.set(PiiType::Address, 0.99);
        let d = PiiDetector::new(config).unwrap();
        assert!(d
            .detect_category("42 Elm St", PiiType::Address)
            .is_empty());
    }

    #[test]
    fn test_positions_index_the_text() {
        let text = "Ünïcode chart — MRN: A1234567, tel 555-867-5309";
        let matches = detector().detect_all_pii(text);
        let chars: Vec<char> = text.chars().collect();

        assert!(!matches.is_empty());
        for m in &matches {
            let slice: String = chars[m.start_pos()..m.end_pos()].iter().collect();
            assert_eq!(slice, m.text());
        }
    }
}
