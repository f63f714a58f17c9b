//! Single bounded repair
//!
//! `validate_and_correct` is straight-line code: scan, at most one repair
//! call, re-scan, report. There is no retry loop to misconfigure. A still-
//! invalid document after the one repair is surfaced as data, never as an
//! endless correction cycle.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::PlanDocument;
use crate::prompts::{self, Prompts};
use crate::reasoner::{CallCost, ReasonerClient, ReasonerRequest};

use super::scan::{ValidatorConfig, Violation, scan};

/// Outcome of validating (and possibly repairing) a generated document
#[derive(Debug, Clone, Serialize)]
pub struct CorrectionReport {
    /// Whether the final document passes the structural scan
    pub is_valid: bool,

    /// The final document: corrected if a repair succeeded, otherwise the
    /// document as generated
    pub document: PlanDocument,

    /// Violations still present in the final document
    pub remaining_violations: Vec<Violation>,

    /// Whether the one repair call was made
    pub repair_attempted: bool,

    /// Cost of the repair call (zero when no repair was needed)
    pub repair_cost: CallCost,
}

/// Validates generated documents, repairing at most once
pub struct Corrector {
    reasoner: Arc<dyn ReasonerClient>,
    config: ValidatorConfig,
    prompts: Prompts,
}

impl Corrector {
    pub fn new(reasoner: Arc<dyn ReasonerClient>, config: ValidatorConfig) -> eyre::Result<Self> {
        Ok(Self {
            reasoner,
            config,
            prompts: Prompts::new()?,
        })
    }

    /// Scan a document and repair it at most once
    ///
    /// Reasoner failures during repair degrade to an invalid report carrying
    /// the original document and its violations; they never abort the run.
    pub async fn validate_and_correct(&self, document: PlanDocument) -> eyre::Result<CorrectionReport> {
        let violations = scan(&document, &self.config);
        if violations.is_empty() {
            debug!("document passed structural scan, no repair needed");
            return Ok(CorrectionReport {
                is_valid: true,
                document,
                remaining_violations: Vec::new(),
                repair_attempted: false,
                repair_cost: CallCost::zero(),
            });
        }

        warn!(violation_count = violations.len(), "document failed structural scan, attempting repair");

        let prompt = self.prompts.render_repair(&document, &violations)?;
        let request = ReasonerRequest::new(prompt, prompts::document_schema());

        let result = match self.reasoner.invoke(request).await {
            Ok(result) => result,
            Err(e) => {
                warn!("repair call failed: {}", e);
                return Ok(CorrectionReport {
                    is_valid: false,
                    document,
                    remaining_violations: violations,
                    repair_attempted: true,
                    repair_cost: CallCost::zero(),
                });
            }
        };

        let corrected = match PlanDocument::from_value(result.value) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("repair returned a malformed document: {}", e);
                return Ok(CorrectionReport {
                    is_valid: false,
                    document,
                    remaining_violations: violations,
                    repair_attempted: true,
                    repair_cost: result.cost,
                });
            }
        };

        let remaining = scan(&corrected, &self.config);
        if remaining.is_empty() {
            debug!("repair resolved all violations");
        } else {
            warn!(remaining = remaining.len(), "document still invalid after the single repair");
        }

        Ok(CorrectionReport {
            is_valid: remaining.is_empty(),
            document: corrected,
            remaining_violations: remaining,
            repair_attempted: true,
            repair_cost: result.cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Segment, Tier};
    use crate::reasoner::client::mock::MockReasonerClient;

    fn segment(start: f64, end: f64) -> Segment {
        Segment {
            title: "seg".to_string(),
            description: String::new(),
            start_age: start,
            end_age: end,
            duration: end - start,
        }
    }

    fn valid_doc() -> PlanDocument {
        PlanDocument {
            goal: "g".to_string(),
            actor: "a".to_string(),
            start_age: 10.0,
            end_age: 18.0,
            tier_count: 2,
            tiers: vec![
                Tier {
                    id: 1,
                    title: "t1".to_string(),
                    start_age: 10.0,
                    end_age: 18.0,
                    segments: vec![segment(10.0, 14.0), segment(14.0, 18.0)],
                },
                Tier {
                    id: 2,
                    title: "t2".to_string(),
                    start_age: 10.0,
                    end_age: 18.0,
                    segments: vec![
                        segment(10.0, 12.0),
                        segment(12.0, 14.0),
                        segment(14.0, 16.0),
                        segment(16.0, 18.0),
                    ],
                },
            ],
        }
    }

    fn broken_doc() -> PlanDocument {
        let mut doc = valid_doc();
        doc.tiers[0].segments[1].end_age = 17.0;
        doc.tiers[0].segments[1].duration = 4.0;
        doc
    }

    #[tokio::test]
    async fn test_valid_document_makes_no_reasoner_call() {
        let mock = Arc::new(MockReasonerClient::new(vec![]));
        let corrector = Corrector::new(mock.clone(), ValidatorConfig::default()).unwrap();

        let report = corrector.validate_and_correct(valid_doc()).await.unwrap();

        assert!(report.is_valid);
        assert!(!report.repair_attempted);
        assert_eq!(report.repair_cost.calls, 0);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_broken_document_repaired_with_one_call() {
        let fixed = serde_json::to_value(valid_doc()).unwrap();
        let mock = Arc::new(MockReasonerClient::new(vec![fixed]));
        let corrector = Corrector::new(mock.clone(), ValidatorConfig::default()).unwrap();

        let report = corrector.validate_and_correct(broken_doc()).await.unwrap();

        assert!(report.is_valid);
        assert!(report.repair_attempted);
        assert!(report.remaining_violations.is_empty());
        assert_eq!(report.repair_cost.calls, 1);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_repair_never_retries() {
        // Repair returns a document that is still broken
        let still_broken = serde_json::to_value(broken_doc()).unwrap();
        let mock = Arc::new(MockReasonerClient::new(vec![still_broken]));
        let corrector = Corrector::new(mock.clone(), ValidatorConfig::default()).unwrap();

        let report = corrector.validate_and_correct(broken_doc()).await.unwrap();

        assert!(!report.is_valid);
        assert!(report.repair_attempted);
        assert!(!report.remaining_violations.is_empty());
        assert_eq!(mock.call_count(), 1, "exactly one repair call, no retry");
    }

    #[tokio::test]
    async fn test_repair_error_degrades_to_invalid_report() {
        // Mock with no queued responses errors on the first call
        let mock = Arc::new(MockReasonerClient::new(vec![]));
        let corrector = Corrector::new(mock.clone(), ValidatorConfig::default()).unwrap();

        let original = broken_doc();
        let report = corrector.validate_and_correct(original.clone()).await.unwrap();

        assert!(!report.is_valid);
        assert!(report.repair_attempted);
        assert_eq!(report.document.tiers[0].segments[1].end_age, original.tiers[0].segments[1].end_age);
        assert_eq!(mock.call_count(), 1);
    }
}
