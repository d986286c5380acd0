use serde::{Deserialize, Serialize};

use crate::engine::types::EngineError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = EngineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(EngineError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Gender {
    Female => "female",
    Male => "male",
    Other => "other",
});

str_enum!(AlcoholLevel {
    None => "none",
    Moderate => "moderate",
    High => "high",
});

str_enum!(ActivityLevel {
    Sedentary => "sedentary",
    Moderate => "moderate",
    Active => "active",
});

str_enum!(RiskCategory {
    Anemia => "anemia",
    Infection => "infection",
    Bleeding => "bleeding",
    Metabolic => "metabolic",
});

str_enum!(Likelihood {
    Possible => "possible",
    Likely => "likely",
    Strong => "strong",
});

str_enum!(VerificationStatus {
    Verified => "verified",
    NeedsReview => "needs_review",
});

/// Three-valued classification assigned upstream. The engine never
/// re-classifies; this label is the sole source of truth for a
/// parameter's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParameterStatus {
    Low,
    Normal,
    High,
}

impl ParameterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Normal => "NORMAL",
            Self::High => "HIGH",
        }
    }
}

impl std::str::FromStr for ParameterStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "NORMAL" => Ok(Self::Normal),
            "HIGH" => Ok(Self::High),
            other => Err(EngineError::InvalidEnum {
                field: "ParameterStatus".into(),
                value: other.into(),
            }),
        }
    }
}

/// Deviation band relative to a parameter's own reference range.
/// Kept distinct from the step-function risk scores on purpose: the two
/// answer different questions (how far outside the range vs how much
/// clinical risk the absolute value carries).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeverityBand {
    VerySevereLow,
    SevereLow,
    Low,
    BorderlineLow,
    Normal,
    BorderlineHigh,
    High,
    SevereHigh,
    VerySevereHigh,
}

impl SeverityBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerySevereLow => "very_severe_low",
            Self::SevereLow => "severe_low",
            Self::Low => "low",
            Self::BorderlineLow => "borderline_low",
            Self::Normal => "normal",
            Self::BorderlineHigh => "borderline_high",
            Self::High => "high",
            Self::SevereHigh => "severe_high",
            Self::VerySevereHigh => "very_severe_high",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_parses_case_insensitive() {
        assert_eq!(ParameterStatus::from_str("low").unwrap(), ParameterStatus::Low);
        assert_eq!(ParameterStatus::from_str(" HIGH ").unwrap(), ParameterStatus::High);
        assert_eq!(ParameterStatus::from_str("Normal").unwrap(), ParameterStatus::Normal);
    }

    #[test]
    fn status_rejects_out_of_domain() {
        assert!(ParameterStatus::from_str("CRITICAL").is_err());
        assert!(ParameterStatus::from_str("").is_err());
    }

    #[test]
    fn risk_category_round_trip() {
        for c in [
            RiskCategory::Anemia,
            RiskCategory::Infection,
            RiskCategory::Bleeding,
            RiskCategory::Metabolic,
        ] {
            assert_eq!(RiskCategory::from_str(c.as_str()).unwrap(), c);
        }
    }
}
