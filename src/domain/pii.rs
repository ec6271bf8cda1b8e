//! PII match data model

use crate::domain::errors::InkguardError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of personally identifiable information recognised in OCR text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiType {
    /// Person names (titled, labelled or bare capitalised pairs)
    Name,
    /// Street addresses and city/state/ZIP lines
    Address,
    /// North American telephone numbers
    Phone,
    /// Medical record numbers and patient identifiers
    MedicalId,
    /// US Social Security Numbers
    Ssn,
}

impl PiiType {
    /// Every category, in declaration order
    pub const ALL: [PiiType; 5] = [
        PiiType::Name,
        PiiType::Address,
        PiiType::Phone,
        PiiType::MedicalId,
        PiiType::Ssn,
    ];

    /// Wire name of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Address => "address",
            Self::Phone => "phone",
            Self::MedicalId => "medical_id",
            Self::Ssn => "ssn",
        }
    }

    /// Specificity used to break exact confidence ties between overlapping spans.
    ///
    /// Higher wins: `ssn > medical_id > phone > address > name`.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Ssn => 5,
            Self::MedicalId => 4,
            Self::Phone => 3,
            Self::Address => 2,
            Self::Name => 1,
        }
    }
}

impl fmt::Display for PiiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PiiType {
    type Err = InkguardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "name" | "person" => Ok(Self::Name),
            "address" | "location" => Ok(Self::Address),
            "phone" | "telephone" => Ok(Self::Phone),
            "medical_id" | "mrn" | "medical_record_number" => Ok(Self::MedicalId),
            "ssn" | "social_security_number" => Ok(Self::Ssn),
            _ => Err(InkguardError::Validation(format!("Unknown PII type: {s}"))),
        }
    }
}

/// A classified PII span inside the cleaned OCR text.
///
/// Positions are half-open character offsets (`start_pos..end_pos`), so
/// `text` equals the characters of the source text in that range. Values are
/// built once by the detector and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiMatch {
    text: String,
    pii_type: PiiType,
    confidence: f64,
    start_pos: usize,
    end_pos: usize,
}

impl PiiMatch {
    /// Create a match; confidence is clamped to `[0, 1]`
    pub fn new(
        text: impl Into<String>,
        pii_type: PiiType,
        confidence: f64,
        start_pos: usize,
        end_pos: usize,
    ) -> Self {
        Self {
            text: text.into(),
            pii_type,
            confidence: clamp_confidence(confidence),
            start_pos,
            end_pos,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn pii_type(&self) -> PiiType {
        self.pii_type
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn start_pos(&self) -> usize {
        self.start_pos
    }

    pub fn end_pos(&self) -> usize {
        self.end_pos
    }

    /// Span length in characters
    pub fn len(&self) -> usize {
        self.end_pos.saturating_sub(self.start_pos)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two half-open spans share at least one character
    pub fn overlaps(&self, other: &PiiMatch) -> bool {
        self.start_pos < other.end_pos && other.start_pos < self.end_pos
    }
}

/// Clamp a score into `[0, 1]`, mapping NaN to zero
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
