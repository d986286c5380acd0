//! Static base-rate weights per condition identifier.
//!
//! Consulted by the probable-causes resolver when fusing edge evidence
//! and by the confidence stage as a floor when evidence is sparse.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::EngineError;

/// Condition -> base-rate weight in [0,1]. Read-only after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Priors {
    pub weights: BTreeMap<String, f64>,
}

impl Priors {
    /// Reject any weight outside [0,1], mirroring the graph edge
    /// check. An out-of-range prior would skew cause scores and
    /// confidence floors.
    pub fn validated(self) -> Result<Self, EngineError> {
        for (condition, w) in &self.weights {
            if !(0.0..=1.0).contains(w) {
                return Err(EngineError::ConfigParse(
                    "priors".into(),
                    format!("prior for {condition} is {w}, outside [0,1]"),
                ));
            }
        }
        Ok(self)
    }

    /// Base rate for a condition; unknown conditions get 0.0.
    pub fn get(&self, condition: &str) -> f64 {
        self.weights.get(condition).copied().unwrap_or(0.0)
    }

    /// Compiled-in default table. Deployments may replace it with a
    /// versioned `priors.json`.
    pub fn builtin() -> Self {
        let table = [
            ("Iron_Deficiency", 0.30),
            ("Thalassemia_Trait", 0.08),
            ("B12_Folate_Deficiency", 0.12),
            ("Chronic_Disease", 0.20),
            ("Acute_Blood_Loss", 0.10),
            ("Bone_Marrow_Suppression", 0.05),
            ("Bacterial_Infection", 0.25),
            ("Viral_Infection", 0.25),
            ("Sepsis", 0.03),
            ("Immune_Thrombocytopenia", 0.06),
            ("Medication_Effect", 0.10),
            ("Metabolic_Syndrome", 0.20),
            ("Diabetes_Mellitus", 0.15),
            ("Cardiovascular_Disease", 0.18),
            ("Renal_Impairment", 0.10),
            ("Secondary_Polycythemia", 0.05),
        ];
        Self {
            weights: table
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}
