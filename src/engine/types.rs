use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Likelihood, Parameter, PatientContext, RiskCategory, SeverityBand, VerificationStatus,
};

// ---------------------------------------------------------------------------
// Finding
// ---------------------------------------------------------------------------

/// A pattern-rule match describing a clinical signal inferred from
/// parameter combinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Identifier of the rule that fired.
    pub rule_id: String,
    /// Evidentiary description, e.g. "microcytic anemia pattern".
    pub label: String,
    pub likelihood: Likelihood,
    /// Canonical names of the parameters the rule matched on.
    /// Always a subset of the input parameter set.
    pub matched: Vec<String>,
}

// ---------------------------------------------------------------------------
// ProbableCause
// ---------------------------------------------------------------------------

/// One contributing graph path behind a candidate cause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeContribution {
    /// "Hemoglobin:LOW -> Iron_Deficiency" style path rendering.
    pub path: String,
    /// Product of edge weights along the path.
    pub weight: f64,
}

/// A candidate underlying condition ranked by graph-weighted evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbableCause {
    pub condition: String,
    pub edges: Vec<EdgeContribution>,
    /// Aggregate of path weights x prior, capped at 1.0.
    pub score: f64,
}

/// Probable causes resolved for one finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CauseSet {
    pub rule_id: String,
    pub causes: Vec<ProbableCause>,
}

// ---------------------------------------------------------------------------
// RiskScore
// ---------------------------------------------------------------------------

/// One modifier applied on top of a base risk score. The chain is a
/// deterministic function of the patient context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedModifier {
    pub label: String,
    pub increment: f64,
}

/// A 0-100 deterministic severity estimate for one risk category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub category: RiskCategory,
    /// The raw parameter value the step function was applied to.
    pub input_value: f64,
    pub raw: f64,
    pub adjusted: f64,
    pub modifiers: Vec<AppliedModifier>,
}

// ---------------------------------------------------------------------------
// ConfidenceScore
// ---------------------------------------------------------------------------

/// Evidence-completeness value. Indeterminate means the originating
/// rule or condition declares no required evidence; it is deliberately
/// distinct from both 0.0 and 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConfidenceValue {
    Scored(f64),
    Indeterminate,
}

/// What the confidence score is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceSubject {
    Finding { rule_id: String },
    Cause { rule_id: String, condition: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub subject: ConfidenceSubject,
    pub value: ConfidenceValue,
    pub evidence_present: usize,
    pub evidence_required: usize,
}

// ---------------------------------------------------------------------------
// Severity labels
// ---------------------------------------------------------------------------

/// Deviation-band label for one parameter, relative to its own
/// reference range. Reported alongside, never merged into, the
/// step-function risk scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityLabel {
    pub parameter: String,
    pub band: SeverityBand,
    /// Signed distance from the nearest range bound; 0.0 inside range.
    pub distance: f64,
}

// ---------------------------------------------------------------------------
// Guardrail redaction log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedactionCategory {
    DiagnosticAssertion,
    MedicationNaming,
    DosageLanguage,
}

/// One guardrail hit. Violations are redacted and logged, never
/// silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionEntry {
    /// Which artifact field the text came from.
    pub field: String,
    pub category: RedactionCategory,
    pub matched: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// The final immutable bundle produced for one report. Created once,
/// never mutated after verifier acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: Uuid,
    pub created_at: NaiveDateTime,
    pub parameters: Vec<Parameter>,
    pub patient: PatientContext,
    pub findings: Vec<Finding>,
    pub causes: Vec<CauseSet>,
    pub risks: Vec<RiskScore>,
    pub overall_risk: f64,
    pub severities: Vec<SeverityLabel>,
    pub confidences: Vec<ConfidenceScore>,
    pub redactions: Vec<RedactionEntry>,
    pub verification: VerificationStatus,
}

impl Artifact {
    /// Look up a loaded parameter by canonical name.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Run-ending failures. Anything recoverable (a single misbehaving
/// rule, a guardrail hit) is handled locally and never surfaces here.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("malformed input encoding: {0}")]
    Schema(String),

    #[error("invalid {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("config load failed ({0}): {1}")]
    ConfigLoad(String, String),

    #[error("config parse failed ({0}): {1}")]
    ConfigParse(String, String),

    #[error("verification mismatch, artifact needs manual review: {0}")]
    Verification(String),
}

/// A single rule failed during precondition evaluation. Logged and the
/// rule is skipped; never fatal for the whole report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("rule {rule_id} skipped: {reason}")]
pub struct RuleEvaluationError {
    pub rule_id: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_parameter_lookup() {
        use crate::models::{Parameter, ParameterStatus, PatientContext, VerificationStatus};
        let artifact = Artifact {
            id: Uuid::new_v4(),
            created_at: chrono::NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            parameters: vec![Parameter {
                name: "MCV".into(),
                value: 72.0,
                unit: "fL".into(),
                status: ParameterStatus::Low,
                range: None,
            }],
            patient: PatientContext::default(),
            findings: vec![],
            causes: vec![],
            risks: vec![],
            overall_risk: 90.0,
            severities: vec![],
            confidences: vec![],
            redactions: vec![],
            verification: VerificationStatus::Verified,
        };
        assert!(artifact.parameter("MCV").is_some());
        assert!(artifact.parameter("RDW").is_none());
    }
}
