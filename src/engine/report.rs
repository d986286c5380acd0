//! Plain-text rendering of a finished artifact.
//!
//! Renders only fields that have already passed the guardrail pass.
//! The layout is stable so downstream diffs of two runs over the same
//! input are meaningful.

use super::types::{Artifact, ConfidenceSubject, ConfidenceValue};
use crate::models::VerificationStatus;

fn confidence_text(value: ConfidenceValue) -> String {
    match value {
        ConfidenceValue::Scored(v) => format!("{:.2}", v),
        ConfidenceValue::Indeterminate => "indeterminate".into(),
    }
}

pub fn render_text(artifact: &Artifact) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("Lab report analysis {}", artifact.id));
    lines.push(format!("Generated: {}", artifact.created_at));
    lines.push(String::new());

    lines.push("Parameters:".into());
    for p in &artifact.parameters {
        let range = match &p.range {
            Some(r) => format!(" (range {}-{})", r.min, r.max),
            None => String::new(),
        };
        lines.push(format!(
            "- {}: {} {} [{}]{}",
            p.name,
            p.value,
            p.unit,
            p.status.as_str(),
            range
        ));
    }
    lines.push(String::new());

    lines.push("Patterns detected:".into());
    if artifact.findings.is_empty() {
        lines.push("- none".into());
    }
    for f in &artifact.findings {
        lines.push(format!(
            "- {} ({}) evidence: {}",
            f.label,
            f.likelihood.as_str(),
            f.matched.join(", ")
        ));
    }
    lines.push(String::new());

    lines.push("Probable causes:".into());
    let mut any_cause = false;
    for set in &artifact.causes {
        for c in &set.causes {
            any_cause = true;
            lines.push(format!(
                "- {} (score {:.2}, via {})",
                c.condition, c.score, set.rule_id
            ));
        }
    }
    if !any_cause {
        lines.push("- none".into());
    }
    lines.push(String::new());

    lines.push("Risk:".into());
    for r in &artifact.risks {
        lines.push(format!(
            "- {}: {:.0} (base {:.0}, {} modifiers)",
            r.category.as_str(),
            r.adjusted,
            r.raw,
            r.modifiers.len()
        ));
    }
    lines.push(format!("Overall wellbeing score: {:.1}", artifact.overall_risk));
    lines.push(String::new());

    let flagged: Vec<&str> = artifact
        .severities
        .iter()
        .filter(|s| s.band != crate::models::SeverityBand::Normal)
        .map(|s| s.parameter.as_str())
        .collect();
    if !flagged.is_empty() {
        lines.push(format!("Out-of-band parameters: {}", flagged.join(", ")));
        lines.push(String::new());
    }

    lines.push("Confidence:".into());
    for c in &artifact.confidences {
        let subject = match &c.subject {
            ConfidenceSubject::Finding { rule_id } => rule_id.clone(),
            ConfidenceSubject::Cause { condition, .. } => condition.clone(),
        };
        lines.push(format!(
            "- {}: {} ({}/{} evidence)",
            subject,
            confidence_text(c.value),
            c.evidence_present,
            c.evidence_required
        ));
    }
    lines.push(String::new());

    if !artifact.redactions.is_empty() {
        lines.push(format!(
            "Note: {} phrase(s) were redacted by output guardrails.",
            artifact.redactions.len()
        ));
    }
    lines.push(match artifact.verification {
        VerificationStatus::Verified => "Verification: passed".into(),
        VerificationStatus::NeedsReview => {
            "Verification: FAILED, artifact needs manual review".into()
        }
    });
    lines.push(String::new());
    lines.push(
        "This is an informational pattern analysis of laboratory values, not a diagnosis."
            .into(),
    );

    lines.join("\n")
}
