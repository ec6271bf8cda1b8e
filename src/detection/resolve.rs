//! Overlap resolution between candidates of different rules and categories

use super::patterns::Candidate;
use std::cmp::Ordering;

/// Ranking used when candidates compete for the same characters.
///
/// Higher confidence first, then the more specific category, then the longer
/// span, then the earlier start, then the rule that appears first in the
/// library. The order is total, so resolution never depends on input order.
pub fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| b.pii_type.priority().cmp(&a.pii_type.priority()))
        .then_with(|| b.len().cmp(&a.len()))
        .then_with(|| a.start.cmp(&b.start))
        .then_with(|| a.rule_order.cmp(&b.rule_order))
        .then_with(|| a.end.cmp(&b.end))
}

/// Keep a maximal set of non-overlapping candidates, best-ranked first.
///
/// Losing candidates are dropped whole; nothing is merged or re-scored.
/// Candidates that only share text (not positions) are all kept. The result
/// is sorted by start position.
pub fn resolve_overlaps(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.retain(|c| !c.is_empty());
    candidates.sort_by(rank);

    let mut accepted: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if accepted.iter().all(|kept| !kept.overlaps(&candidate)) {
            accepted.push(candidate);
        }
    }

    accepted.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.end.cmp(&b.end)));
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PiiType;

    fn candidate(
        pii_type: PiiType,
        start: usize,
        end: usize,
        confidence: f64,
        rule_order: usize,
    ) -> Candidate {
        Candidate {
            text: "x".repeat(end - start),
            pii_type,
            start,
            end,
            confidence,
            rule_order,
            rule_floor: None,
        }
    }

    #[test]
    fn test_higher_confidence_wins() {
        let resolved = resolve_overlaps(vec![
            candidate(PiiType::Ssn, 0, 11, 0.7, 0),
            candidate(PiiType::Phone, 0, 12, 0.9, 1),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].pii_type, PiiType::Phone);
    }

    #[test]
    fn test_exact_tie_prefers_specific_category() {
        let resolved = resolve_overlaps(vec![
            candidate(PiiType::Name, 0, 10, 0.8, 0),
            candidate(PiiType::Address, 2, 12, 0.8, 1),
            candidate(PiiType::MedicalId, 4, 9, 0.8, 2),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].pii_type, PiiType::MedicalId);
    }

    #[test]
    fn test_same_category_tie_prefers_longer_then_earlier() {
        let resolved = resolve_overlaps(vec![
            candidate(PiiType::Address, 5, 10, 0.8, 0),
            candidate(PiiType::Address, 3, 12, 0.8, 1),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!((resolved[0].start, resolved[0].end), (3, 12));

        let resolved = resolve_overlaps(vec![
            candidate(PiiType::Address, 4, 10, 0.8, 0),
            candidate(PiiType::Address, 2, 8, 0.8, 1),
        ]);
        assert_eq!((resolved[0].start, resolved[0].end), (2, 8));
    }

    #[test]
    fn test_loser_does_not_block_third_span() {
        // B loses to A, so C (which only overlaps B) survives
        let resolved = resolve_overlaps(vec![
            candidate(PiiType::Phone, 0, 5, 0.9, 0),
            candidate(PiiType::Phone, 4, 9, 0.8, 1),
            candidate(PiiType::Phone, 8, 12, 0.7, 2),
        ]);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].start, 0);
        assert_eq!(resolved[1].start, 8);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let items = vec![
            candidate(PiiType::Name, 0, 8, 0.75, 3),
            candidate(PiiType::Address, 6, 20, 0.75, 1),
            candidate(PiiType::Phone, 22, 34, 0.9, 2),
            candidate(PiiType::Ssn, 30, 41, 0.9, 0),
        ];
        let mut reversed = items.clone();
        reversed.reverse();

        assert_eq!(resolve_overlaps(items), resolve_overlaps(reversed));
    }

    #[test]
    fn test_output_sorted_and_disjoint() {
        let resolved = resolve_overlaps(vec![
            candidate(PiiType::Ssn, 40, 51, 0.95, 0),
            candidate(PiiType::Name, 0, 8, 0.9, 1),
            candidate(PiiType::Phone, 20, 34, 0.9, 2),
        ]);
        let starts: Vec<_> = resolved.iter().map(|c| c.start).collect();
        assert_eq!(starts, vec![0, 20, 40]);
        for pair in resolved.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(resolve_overlaps(Vec::new()).is_empty());
    }
}
