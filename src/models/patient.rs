use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::enums::{ActivityLevel, AlcoholLevel, Gender};

/// Lifestyle attributes considered by the risk context modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifestyle {
    pub smoking: bool,
    pub alcohol: AlcoholLevel,
    pub activity: ActivityLevel,
}

impl Default for Lifestyle {
    fn default() -> Self {
        Self {
            smoking: false,
            alcohol: AlcoholLevel::None,
            activity: ActivityLevel::Moderate,
        }
    }
}

/// Patient context for one report run. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PatientContext {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    /// Lower-cased medical-history condition names (e.g. "diabetes").
    pub history: BTreeSet<String>,
    #[serde(default)]
    pub lifestyle: Lifestyle,
}

impl PatientContext {
    pub fn has_history(&self, condition: &str) -> bool {
        self.history.contains(&condition.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_lookup_is_case_insensitive_on_query() {
        let mut ctx = PatientContext::default();
        ctx.history.insert("diabetes".into());
        assert!(ctx.has_history("Diabetes"));
        assert!(!ctx.has_history("asthma"));
    }
}
