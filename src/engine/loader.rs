//! Input validation and normalization.
//!
//! Consumes the upstream classifier's output (parameter records plus a
//! patient-context record) and produces the engine's internal model.
//! The loader trusts the upstream status labels completely: it never
//! consults reference ranges and never re-classifies a value.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{Parameter, ParameterStatus, PatientContext, ReferenceRange};

use super::types::EngineError;

/// Raw parameter record as received from the upstream classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawParameter {
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    /// Free-form status label; must resolve to LOW/NORMAL/HIGH.
    pub status: String,
    #[serde(default)]
    pub range_min: Option<f64>,
    #[serde(default)]
    pub range_max: Option<f64>,
}

/// Complete raw report: classified parameters + patient context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReport {
    pub parameters: Vec<RawParameter>,
    #[serde(default)]
    pub patient: PatientContext,
}

/// Alias table mapping upstream spellings to canonical parameter names.
/// Lookup is case-insensitive with separators normalized to '_'.
const ALIASES: &[(&str, &str)] = &[
    ("hb", "Hemoglobin"),
    ("hgb", "Hemoglobin"),
    ("haemoglobin", "Hemoglobin"),
    ("hemoglobin", "Hemoglobin"),
    ("platelet", "Platelets"),
    ("platelets", "Platelets"),
    ("platelet_count", "Platelets"),
    ("wbc", "WBC"),
    ("total_wbc_count", "WBC"),
    ("white_blood_cells", "WBC"),
    ("mcv", "MCV"),
    ("mch", "MCH"),
    ("mchc", "MCHC"),
    ("rdw", "RDW"),
    ("neutrophils", "Neutrophils"),
    ("lymphocytes", "Lymphocytes"),
    ("rbc", "RBC"),
    ("ldl", "LDL"),
    ("vldl", "VLDL"),
    ("hdl", "HDL"),
    ("hdl_cholesterol", "HDL"),
    ("total_cholesterol", "Total_Cholesterol"),
    ("cholesterol", "Total_Cholesterol"),
    ("triglycerides", "Triglycerides"),
    ("glucose_fasting", "Glucose_Fasting"),
    ("fasting_glucose", "Glucose_Fasting"),
    ("glucose", "Glucose_Fasting"),
    ("hba1c", "HbA1c"),
    ("creatinine", "Creatinine"),
    ("urea", "Urea_BUN"),
    ("urea_bun", "Urea_BUN"),
    ("crp", "CRP"),
];

/// Resolve a raw parameter name to its canonical form. Unknown names
/// pass through with separators normalized, so novel analytes are kept
/// rather than dropped.
pub fn canonical_name(raw: &str) -> String {
    let key: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    for (alias, canon) in ALIASES {
        if *alias == key {
            return (*canon).to_string();
        }
    }
    raw.trim().replace(char::is_whitespace, "_")
}

/// Parse a JSON-encoded raw report. A structurally malformed document
/// is a schema error; field-level problems surface later in
/// [`load_report`].
pub fn parse_report(json: &str) -> Result<RawReport, EngineError> {
    serde_json::from_str(json).map_err(|e| EngineError::Schema(e.to_string()))
}

/// Validate and normalize a raw report into the internal model.
pub fn load_report(raw: RawReport) -> Result<(Vec<Parameter>, PatientContext), EngineError> {
    if raw.parameters.is_empty() {
        return Err(EngineError::Validation(
            "report contains no parameters".into(),
        ));
    }

    let mut parameters = Vec::with_capacity(raw.parameters.len());
    for (idx, rec) in raw.parameters.into_iter().enumerate() {
        if rec.name.trim().is_empty() {
            return Err(EngineError::Validation(format!(
                "parameter {idx}: missing name"
            )));
        }
        if !rec.value.is_finite() {
            return Err(EngineError::Validation(format!(
                "parameter '{}': value is not a finite number",
                rec.name
            )));
        }
        if rec.status.trim().is_empty() {
            return Err(EngineError::Validation(format!(
                "parameter '{}': missing status",
                rec.name
            )));
        }
        let status = ParameterStatus::from_str(&rec.status).map_err(|_| {
            EngineError::Validation(format!(
                "parameter '{}': status '{}' outside LOW/NORMAL/HIGH",
                rec.name, rec.status
            ))
        })?;

        let range = match (rec.range_min, rec.range_max) {
            (Some(min), Some(max)) if min < max => Some(ReferenceRange { min, max }),
            (Some(min), Some(max)) => {
                return Err(EngineError::Validation(format!(
                    "parameter '{}': reference range {min}..{max} is not ascending",
                    rec.name
                )));
            }
            _ => None,
        };

        parameters.push(Parameter {
            name: canonical_name(&rec.name),
            value: rec.value,
            unit: rec.unit,
            status,
            range,
        });
    }

    let mut patient = raw.patient;
    patient.history = patient
        .history
        .into_iter()
        .map(|h| h.trim().to_lowercase())
        .filter(|h| !h.is_empty())
        .collect();

    Ok((parameters, patient))
}
