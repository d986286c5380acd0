//! Independent recomputation pass over a finished artifact.
//!
//! The verifier re-derives every numeric conclusion from the
//! artifact's own recorded inputs and compares against what the
//! pipeline produced. Any disagreement beyond floating-point epsilon
//! marks the artifact for manual review; it is never silently
//! corrected.

use super::confidence;
use super::graph::KnowledgeGraph;
use super::priors::Priors;
use super::risk::{self, CategoryWeights};
use super::rules::RuleLibrary;
use super::types::{Artifact, ConfidenceValue, EngineError};
use crate::models::VerificationStatus;

const EPSILON: f64 = 1e-9;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

/// Recompute risks and confidences and collect every disagreement.
/// An empty result means the artifact checks out.
pub fn check(
    artifact: &Artifact,
    library: &RuleLibrary,
    graph: &KnowledgeGraph,
    priors: &Priors,
    weights: &CategoryWeights,
) -> Vec<String> {
    let mut mismatches = Vec::new();

    // Risk scores, category by category.
    let expected_risks = risk::score_categories(&artifact.parameters, &artifact.patient);
    if expected_risks.len() != artifact.risks.len() {
        mismatches.push(format!(
            "risk count {} != recomputed {}",
            artifact.risks.len(),
            expected_risks.len()
        ));
    }
    for (got, want) in artifact.risks.iter().zip(&expected_risks) {
        if got.category != want.category {
            mismatches.push(format!(
                "risk category order {} != {}",
                got.category.as_str(),
                want.category.as_str()
            ));
            continue;
        }
        if !close(got.raw, want.raw) || !close(got.adjusted, want.adjusted) {
            mismatches.push(format!(
                "{} risk {}/{} != recomputed {}/{}",
                got.category.as_str(),
                got.raw,
                got.adjusted,
                want.raw,
                want.adjusted
            ));
        }
    }

    let expected_overall = risk::overall_score(&expected_risks, weights);
    if !close(artifact.overall_risk, expected_overall) {
        mismatches.push(format!(
            "overall score {} != recomputed {}",
            artifact.overall_risk, expected_overall
        ));
    }

    // Confidence scores, pairwise by subject.
    let expected_conf = confidence::score_all(
        &artifact.findings,
        &artifact.causes,
        library,
        graph,
        priors,
        &artifact.parameters,
    );
    if expected_conf.len() != artifact.confidences.len() {
        mismatches.push(format!(
            "confidence count {} != recomputed {}",
            artifact.confidences.len(),
            expected_conf.len()
        ));
    }
    for (got, want) in artifact.confidences.iter().zip(&expected_conf) {
        if got.subject != want.subject {
            mismatches.push("confidence subject order differs".into());
            continue;
        }
        let agree = match (got.value, want.value) {
            (ConfidenceValue::Scored(a), ConfidenceValue::Scored(b)) => close(a, b),
            (ConfidenceValue::Indeterminate, ConfidenceValue::Indeterminate) => true,
            _ => false,
        };
        if !agree {
            mismatches.push(format!(
                "confidence mismatch for {:?}: {:?} != {:?}",
                got.subject, got.value, want.value
            ));
        }
    }

    mismatches
}

/// Fail hard on an unverified artifact. Callers that must not emit
/// review-flagged output route through this.
pub fn enforce(artifact: &Artifact) -> Result<(), EngineError> {
    match artifact.verification {
        VerificationStatus::Verified => Ok(()),
        VerificationStatus::NeedsReview => Err(EngineError::Verification(format!(
            "artifact {} failed recomputation",
            artifact.id
        ))),
    }
}
