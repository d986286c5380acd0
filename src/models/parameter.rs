use serde::{Deserialize, Serialize};

use super::enums::ParameterStatus;

/// Reference range the upstream classifier used for this parameter.
/// Carried for audit and for deviation-band labeling; the engine never
/// classifies against it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub min: f64,
    pub max: f64,
}

/// A single classified laboratory parameter. Immutable once loaded;
/// every later stage borrows, never copies-and-mutates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Canonical, alias-resolved name (e.g. "Hemoglobin", "MCV").
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub status: ParameterStatus,
    pub range: Option<ReferenceRange>,
}

impl Parameter {
    /// Graph observation node identifier for this parameter,
    /// e.g. "Hemoglobin:LOW".
    pub fn observation_node(&self) -> String {
        format!("{}:{}", self.name, self.status.as_str())
    }
}
