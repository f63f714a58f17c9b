//! Deterministic structural scan
//!
//! Violations are data, never errors: each finding names the exact spot and
//! expected value so it can be displayed to the user or handed to the
//! repair prompt verbatim.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::PlanDocument;

/// Canonical numeric tolerance for all age/duration comparisons
pub const EPSILON: f64 = 0.01;

/// Allowed duration range for segments of one tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationBand {
    pub min: f64,
    pub max: f64,
}

/// Validation tolerances and per-tier duration bands
///
/// One canonical epsilon and one canonical band set; earlier variants with
/// differing tolerances were deliberately not carried forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Tolerance for all numeric comparisons
    pub epsilon: f64,

    /// Duration bands indexed by tier (tier 1 widest, tier 3 narrowest)
    pub bands: Vec<DurationBand>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            epsilon: EPSILON,
            bands: vec![
                DurationBand { min: 4.0, max: 10.0 },
                DurationBand { min: 1.0, max: 4.0 },
                DurationBand { min: 0.25, max: 1.0 },
            ],
        }
    }
}

impl ValidatorConfig {
    /// Band for a 1-based tier id, clamped to the configured set
    ///
    /// An empty band list disables the band check entirely.
    fn band_for(&self, tier_id: u8) -> DurationBand {
        let idx = (tier_id.max(1) as usize - 1).min(self.bands.len().saturating_sub(1));
        self.bands.get(idx).copied().unwrap_or(DurationBand {
            min: f64::MIN,
            max: f64::MAX,
        })
    }
}

/// One structural violation found by the scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Declared tier count disagrees with the tiers present (or is not 2/3)
    TierCountMismatch { declared: u8, actual: usize },

    /// A tier does not span the document's full age range
    TierSpanMismatch {
        tier: u8,
        expected_start: f64,
        expected_end: f64,
        actual_start: f64,
        actual_end: f64,
    },

    /// A tier has no segments
    EmptyTier { tier: u8 },

    /// A segment does not start where the previous one ended
    /// (or, for the first segment, at the tier start)
    SegmentDiscontinuity {
        tier: u8,
        segment: usize,
        expected_start: f64,
        actual_start: f64,
    },

    /// Stated duration disagrees with end - start
    DurationRangeMismatch {
        tier: u8,
        segment: usize,
        duration: f64,
        span: f64,
    },

    /// Duration falls outside the tier's allowed band
    DurationBandViolation {
        tier: u8,
        segment: usize,
        duration: f64,
        min: f64,
        max: f64,
    },

    /// The last segment does not end at the tier end
    LastSegmentEndMismatch {
        tier: u8,
        expected_end: f64,
        actual_end: f64,
    },
}

impl Violation {
    /// User-actionable description of this violation
    pub fn describe(&self) -> String {
        match self {
            Violation::TierCountMismatch { declared, actual } => {
                format!("document declares {} tiers but contains {} (must be 2 or 3)", declared, actual)
            }
            Violation::TierSpanMismatch {
                tier,
                expected_start,
                expected_end,
                actual_start,
                actual_end,
            } => format!(
                "tier {} spans [{}, {}] but must span the document range [{}, {}]",
                tier, actual_start, actual_end, expected_start, expected_end
            ),
            Violation::EmptyTier { tier } => format!("tier {} has no segments", tier),
            Violation::SegmentDiscontinuity {
                tier,
                segment,
                expected_start,
                actual_start,
            } => format!(
                "tier {} segment {} starts at {} but must start at {}",
                tier, segment, actual_start, expected_start
            ),
            Violation::DurationRangeMismatch {
                tier,
                segment,
                duration,
                span,
            } => format!(
                "tier {} segment {} states duration {} but spans {}",
                tier, segment, duration, span
            ),
            Violation::DurationBandViolation {
                tier,
                segment,
                duration,
                min,
                max,
            } => format!(
                "tier {} segment {} duration {} is outside the allowed band [{}, {}]",
                tier, segment, duration, min, max
            ),
            Violation::LastSegmentEndMismatch {
                tier,
                expected_end,
                actual_end,
            } => format!(
                "tier {} last segment ends at {} but must end at {}",
                tier, actual_end, expected_end
            ),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Two values are equal within the tolerance
fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= epsilon
}

/// Scan a document for structural violations
///
/// Pure and deterministic: the same document always yields the same list in
/// the same order (tier order, then segment order within each tier).
pub fn scan(doc: &PlanDocument, config: &ValidatorConfig) -> Vec<Violation> {
    let eps = config.epsilon;
    let mut violations = Vec::new();

    if doc.tiers.len() != doc.tier_count as usize || !(2..=3).contains(&doc.tier_count) {
        violations.push(Violation::TierCountMismatch {
            declared: doc.tier_count,
            actual: doc.tiers.len(),
        });
    }

    for tier in &doc.tiers {
        if !approx_eq(tier.start_age, doc.start_age, eps) || !approx_eq(tier.end_age, doc.end_age, eps) {
            violations.push(Violation::TierSpanMismatch {
                tier: tier.id,
                expected_start: doc.start_age,
                expected_end: doc.end_age,
                actual_start: tier.start_age,
                actual_end: tier.end_age,
            });
        }

        if tier.segments.is_empty() {
            violations.push(Violation::EmptyTier { tier: tier.id });
            continue;
        }

        let band = config.band_for(tier.id);
        let mut expected_start = tier.start_age;

        for (i, segment) in tier.segments.iter().enumerate() {
            if !approx_eq(segment.start_age, expected_start, eps) {
                violations.push(Violation::SegmentDiscontinuity {
                    tier: tier.id,
                    segment: i,
                    expected_start,
                    actual_start: segment.start_age,
                });
            }

            if !approx_eq(segment.duration, segment.span(), eps) {
                violations.push(Violation::DurationRangeMismatch {
                    tier: tier.id,
                    segment: i,
                    duration: segment.duration,
                    span: segment.span(),
                });
            }

            if segment.duration < band.min - eps || segment.duration > band.max + eps {
                violations.push(Violation::DurationBandViolation {
                    tier: tier.id,
                    segment: i,
                    duration: segment.duration,
                    min: band.min,
                    max: band.max,
                });
            }

            expected_start = segment.end_age;
        }

        // expected_start is now the last segment's end
        if !approx_eq(expected_start, tier.end_age, eps) {
            violations.push(Violation::LastSegmentEndMismatch {
                tier: tier.id,
                expected_end: tier.end_age,
                actual_end: expected_start,
            });
        }
    }

    debug!(violation_count = violations.len(), "scan: complete");
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Segment, Tier};

    fn segment(start: f64, end: f64, duration: f64) -> Segment {
        Segment {
            title: "seg".to_string(),
            description: String::new(),
            start_age: start,
            end_age: end,
            duration,
        }
    }

    /// A fully consistent three-tier document over ages 10-18
    fn consistent_doc() -> PlanDocument {
        PlanDocument {
            goal: "test".to_string(),
            actor: "Sam".to_string(),
            start_age: 10.0,
            end_age: 18.0,
            tier_count: 3,
            tiers: vec![
                Tier {
                    id: 1,
                    title: "overview".to_string(),
                    start_age: 10.0,
                    end_age: 18.0,
                    segments: vec![segment(10.0, 14.0, 4.0), segment(14.0, 18.0, 4.0)],
                },
                Tier {
                    id: 2,
                    title: "phases".to_string(),
                    start_age: 10.0,
                    end_age: 18.0,
                    segments: vec![
                        segment(10.0, 12.0, 2.0),
                        segment(12.0, 14.0, 2.0),
                        segment(14.0, 16.0, 2.0),
                        segment(16.0, 18.0, 2.0),
                    ],
                },
                Tier {
                    id: 3,
                    title: "steps".to_string(),
                    start_age: 10.0,
                    end_age: 18.0,
                    segments: (0..16).map(|i| {
                        let start = 10.0 + i as f64 * 0.5;
                        segment(start, start + 0.5, 0.5)
                    }).collect(),
                },
            ],
        }
    }

    #[test]
    fn test_consistent_document_has_no_violations() {
        let doc = consistent_doc();
        let violations = scan(&doc, &ValidatorConfig::default());
        assert!(violations.is_empty(), "expected none, got {:?}", violations);
    }

    #[test]
    fn test_early_segment_end_yields_two_violations() {
        // Mutate second tier-1 segment to end at 17 while duration stays 4
        let mut doc = consistent_doc();
        doc.tiers[0].segments[1].end_age = 17.0;

        let violations = scan(&doc, &ValidatorConfig::default());

        assert_eq!(violations.len(), 2, "got {:?}", violations);
        assert!(violations.iter().any(|v| matches!(
            v,
            Violation::DurationRangeMismatch { tier: 1, segment: 1, .. }
        )));
        assert!(
            violations
                .iter()
                .any(|v| matches!(v, Violation::LastSegmentEndMismatch { tier: 1, .. }))
        );
    }

    #[test]
    fn test_scan_is_idempotent() {
        let mut doc = consistent_doc();
        doc.tiers[0].segments[1].end_age = 17.0;
        doc.tiers[1].segments.clear();

        let config = ValidatorConfig::default();
        let first = scan(&doc, &config);
        let second = scan(&doc, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_duration_tolerance_boundary() {
        let mut doc = consistent_doc();

        // Within epsilon: no violation
        doc.tiers[0].segments[0].duration = 4.01;
        let violations = scan(&doc, &ValidatorConfig::default());
        assert!(violations.is_empty(), "got {:?}", violations);

        // Just outside epsilon: exactly one duration mismatch
        doc.tiers[0].segments[0].duration = 4.02;
        let violations = scan(&doc, &ValidatorConfig::default());
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            violations[0],
            Violation::DurationRangeMismatch { tier: 1, segment: 0, .. }
        ));
    }

    #[test]
    fn test_first_segment_must_start_at_tier_start() {
        let mut doc = consistent_doc();
        doc.tiers[0].segments[0].start_age = 10.5;

        let violations = scan(&doc, &ValidatorConfig::default());
        assert!(violations.iter().any(|v| matches!(
            v,
            Violation::SegmentDiscontinuity {
                tier: 1,
                segment: 0,
                ..
            }
        )));
    }

    #[test]
    fn test_gap_between_segments_is_one_discontinuity() {
        let mut doc = consistent_doc();
        // Open a gap: second segment starts at 15 instead of 14
        doc.tiers[0].segments[1].start_age = 15.0;
        doc.tiers[0].segments[1].duration = 3.0;

        let violations = scan(&doc, &ValidatorConfig::default());
        let discontinuities: Vec<_> = violations
            .iter()
            .filter(|v| matches!(v, Violation::SegmentDiscontinuity { .. }))
            .collect();
        assert_eq!(discontinuities.len(), 1);
    }

    #[test]
    fn test_empty_tier_reported_once() {
        let mut doc = consistent_doc();
        doc.tiers[2].segments.clear();

        let violations = scan(&doc, &ValidatorConfig::default());
        assert_eq!(violations, vec![Violation::EmptyTier { tier: 3 }]);
    }

    #[test]
    fn test_tier_count_mismatch() {
        let mut doc = consistent_doc();
        doc.tier_count = 2;

        let violations = scan(&doc, &ValidatorConfig::default());
        assert!(
            violations
                .iter()
                .any(|v| matches!(v, Violation::TierCountMismatch { declared: 2, actual: 3 }))
        );
    }

    #[test]
    fn test_tier_span_mismatch() {
        let mut doc = consistent_doc();
        doc.tiers[1].end_age = 17.0;
        // Keep segments consistent with the shrunk tier to isolate the span check
        doc.tiers[1].segments = vec![
            segment(10.0, 12.0, 2.0),
            segment(12.0, 14.5, 2.5),
            segment(14.5, 17.0, 2.5),
        ];

        let violations = scan(&doc, &ValidatorConfig::default());
        assert_eq!(
            violations,
            vec![Violation::TierSpanMismatch {
                tier: 2,
                expected_start: 10.0,
                expected_end: 18.0,
                actual_start: 10.0,
                actual_end: 17.0,
            }]
        );
    }

    #[test]
    fn test_band_violation_per_tier() {
        let mut doc = consistent_doc();
        // Tier 3 band is [0.25, 1.0]; a 2-year segment violates it
        doc.tiers[2].segments = vec![segment(10.0, 12.0, 2.0), segment(12.0, 18.0, 6.0)];

        let violations = scan(&doc, &ValidatorConfig::default());
        let band_violations: Vec<_> = violations
            .iter()
            .filter(|v| matches!(v, Violation::DurationBandViolation { tier: 3, .. }))
            .collect();
        assert_eq!(band_violations.len(), 2);
    }

    #[test]
    fn test_integer_and_float_ages_compare_equal() {
        // Built from JSON with mixed integer/float ages
        let doc = PlanDocument::from_value(serde_json::json!({
            "goal": "g", "actor": "a",
            "start_age": 10, "end_age": 18.0, "tier_count": 2,
            "tiers": [
                {"id": 1, "title": "t1", "start_age": 10.0, "end_age": 18,
                 "segments": [
                    {"title": "s", "description": "", "start_age": 10, "end_age": 14.0, "duration": 4},
                    {"title": "s", "description": "", "start_age": 14.0, "end_age": 18, "duration": 4.0}
                 ]},
                {"id": 2, "title": "t2", "start_age": 10, "end_age": 18,
                 "segments": [
                    {"title": "s", "description": "", "start_age": 10, "end_age": 14, "duration": 4},
                    {"title": "s", "description": "", "start_age": 14, "end_age": 18, "duration": 4}
                 ]}
            ]
        }))
        .unwrap();

        let violations = scan(&doc, &ValidatorConfig::default());
        assert!(violations.is_empty(), "got {:?}", violations);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::domain::{Segment, Tier};
    use proptest::prelude::*;

    prop_compose! {
        /// Documents with contiguous segments but arbitrary durations and
        /// declared tier counts
        fn doc_strategy()(
            start in 0.0f64..50.0,
            durations in proptest::collection::vec(0.1f64..12.0, 1..8),
            declared in 0u8..5,
        ) -> PlanDocument {
            let mut segments = Vec::new();
            let mut cursor = start;
            for d in &durations {
                segments.push(Segment {
                    title: "s".to_string(),
                    description: String::new(),
                    start_age: cursor,
                    end_age: cursor + d,
                    duration: *d,
                });
                cursor += d;
            }
            PlanDocument {
                goal: "g".to_string(),
                actor: "a".to_string(),
                start_age: start,
                end_age: cursor,
                tier_count: declared,
                tiers: vec![Tier {
                    id: 1,
                    title: "t".to_string(),
                    start_age: start,
                    end_age: cursor,
                    segments,
                }],
            }
        }
    }

    proptest! {
        #[test]
        fn scan_is_deterministic(doc in doc_strategy()) {
            let config = ValidatorConfig::default();
            prop_assert_eq!(scan(&doc, &config), scan(&doc, &config));
        }

        #[test]
        fn contiguous_documents_have_no_continuity_violations(doc in doc_strategy()) {
            let violations = scan(&doc, &ValidatorConfig::default());
            let has_continuity_violation = violations.iter().any(|v| matches!(
                v,
                Violation::SegmentDiscontinuity { .. } | Violation::LastSegmentEndMismatch { .. }
            ));
            prop_assert!(!has_continuity_violation);
        }
    }
}
