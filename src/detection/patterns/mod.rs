//! Pattern library for PII detection
//!
//! Rules live in a TOML file (the built-in library is embedded at compile
//! time). Each rule contributes raw candidates for one category; the
//! category validators in [`validators`] then reject implausible candidates
//! and adjust their confidence from the surrounding text.

pub mod validators;

use crate::detection::config::DetectionConfig;
use crate::domain::{clamp_confidence, PiiType};
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use validators::MatchContext;

/// Pattern definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct PatternDefinition {
    /// Regex patterns for this rule
    pub patterns: Vec<String>,
    /// Base confidence score (0.0 - 1.0)
    pub confidence: f64,
    /// PII category label
    pub category: String,
    /// Optional floor stricter than the category floor
    #[serde(default)]
    pub min_confidence: Option<f64>,
}

/// Compiled pattern with metadata
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Rule name from the library
    pub name: String,
    /// Compiled regex
    pub regex: Regex,
    /// PII category
    pub category: PiiType,
    /// Base confidence score
    pub confidence: f64,
    /// Rule-level acceptance floor
    pub min_confidence: Option<f64>,
    /// Position in the library, used as the last overlap tie-breaker
    pub order: usize,
}

/// Pattern file container
#[derive(Debug, Deserialize)]
struct PatternFile {
    patterns: BTreeMap<String, PatternDefinition>,
}

/// Context windows used by the validators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextSettings {
    /// Characters inspected on each side of a span
    pub context_window_chars: usize,
    /// Tokens before a span searched for labels
    pub label_window_tokens: usize,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            context_window_chars: 50,
            label_window_tokens: 3,
        }
    }
}

impl From<&DetectionConfig> for ContextSettings {
    fn from(config: &DetectionConfig) -> Self {
        Self {
            context_window_chars: config.context_window_chars,
            label_window_tokens: config.label_window_tokens,
        }
    }
}

/// A scored span proposed by one rule, before floors and overlap resolution.
///
/// Offsets are character offsets into the scanned text.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub text: String,
    pub pii_type: PiiType,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
    pub rule_order: usize,
    pub rule_floor: Option<f64>,
}

impl Candidate {
    /// Span length in characters
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &Candidate) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Maps byte offsets produced by `regex` onto character offsets
pub(crate) struct CharIndex {
    byte_starts: Vec<usize>,
}

impl CharIndex {
    pub(crate) fn new(text: &str) -> Self {
        Self {
            byte_starts: text.char_indices().map(|(b, _)| b).collect(),
        }
    }

    /// Character offset of a byte offset lying on a char boundary
    pub(crate) fn char_offset(&self, byte: usize) -> usize {
        match self.byte_starts.binary_search(&byte) {
            Ok(i) | Err(i) => i,
        }
    }
}

fn next_char_boundary(text: &str, byte: usize) -> usize {
    text[byte..]
        .chars()
        .next()
        .map_or(byte + 1, |c| byte + c.len_utf8())
}

/// Classification rules for every PII category
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    patterns: Vec<CompiledPattern>,
    context: ContextSettings,
}

impl PatternLibrary {
    /// Create a pattern library from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read pattern library: {}",
                path.as_ref().display()
            )
        })?;

        Self::from_toml(&content)
    }

    /// Create a pattern library from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: PatternFile =
            toml::from_str(content).context("Failed to parse pattern library TOML")?;

        let mut patterns = Vec::new();

        for (name, def) in file.patterns {
            let category: PiiType = def.category.parse().with_context(|| {
                format!("Invalid category in pattern '{}': {}", name, def.category)
            })?;

            if !(0.0..=1.0).contains(&def.confidence) {
                anyhow::bail!(
                    "Confidence for pattern '{name}' must be between 0.0 and 1.0, got {}",
                    def.confidence
                );
            }
            if let Some(floor) = def.min_confidence {
                if !(0.0..=1.0).contains(&floor) {
                    anyhow::bail!(
                        "min_confidence for pattern '{name}' must be between 0.0 and 1.0, got {floor}"
                    );
                }
            }

            for pattern_str in &def.patterns {
                let regex = Regex::new(pattern_str)
                    .with_context(|| format!("Invalid regex in pattern '{name}': {pattern_str}"))?;

                patterns.push(CompiledPattern {
                    name: name.clone(),
                    regex,
                    category,
                    confidence: def.confidence,
                    min_confidence: def.min_confidence,
                    order: patterns.len(),
                });
            }
        }

        if patterns.is_empty() {
            anyhow::bail!("Pattern library defines no patterns");
        }

        Ok(Self {
            patterns,
            context: ContextSettings::default(),
        })
    }

    /// Create a pattern library with the built-in rules
    pub fn default_patterns() -> Result<Self> {
        let default_toml = include_str!("../../../patterns/pii_patterns.toml");
        Self::from_toml(default_toml)
    }

    /// Load the library named by the detection config, or the built-in one
    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        let library = match config.pattern_library {
            Some(ref path) => Self::from_file(path)?,
            None => Self::default_patterns()?,
        };
        Ok(library.with_context(ContextSettings::from(config)))
    }

    /// Replace the context windows used for scoring
    pub fn with_context(mut self, context: ContextSettings) -> Self {
        self.context = context;
        self
    }

    pub fn context(&self) -> ContextSettings {
        self.context
    }

    /// Get all patterns
    pub fn all_patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Get patterns for a specific category
    pub fn patterns_for_category(
        &self,
        category: PiiType,
    ) -> impl Iterator<Item = &CompiledPattern> + '_ {
        self.patterns.iter().filter(move |p| p.category == category)
    }

    /// Scored candidates of one category in `text`.
    ///
    /// Pure function of its inputs. Candidates may overlap each other;
    /// floors are not applied here.
    pub fn match_category(&self, text: &str, category: PiiType) -> Vec<Candidate> {
        let index = CharIndex::new(text);
        let mut candidates = Vec::new();

        for pattern in self.patterns_for_category(category) {
            // Restart one character after each hit so a rejected match
            // ("Patient Jane") cannot hide an overlapping one ("Jane Doe").
            let mut pos = 0;
            while pos <= text.len() {
                let Some(caps) = pattern.regex.captures_at(text, pos) else {
                    break;
                };
                let Some(whole) = caps.get(0) else {
                    break;
                };
                pos = next_char_boundary(text, whole.start());

                let Some(span) = caps.name("value").or_else(|| caps.get(0)) else {
                    continue;
                };
                if span.as_str().trim().is_empty() {
                    continue;
                }

                let ctx = MatchContext::new(text, span.start(), span.end(), &caps, self.context);
                let Some(score) = validators::score(category, pattern.confidence, &ctx) else {
                    tracing::trace!(
                        rule = %pattern.name,
                        category = %category,
                        "Candidate rejected by validator"
                    );
                    continue;
                };

                candidates.push(Candidate {
                    text: span.as_str().to_string(),
                    pii_type: category,
                    start: index.char_offset(span.start()),
                    end: index.char_offset(span.end()),
                    confidence: clamp_confidence(score),
                    rule_order: pattern.order,
                    rule_floor: pattern.min_confidence,
                });
            }
        }

        candidates
    }
}
