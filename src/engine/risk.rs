//! Per-category risk scoring.
//!
//! Each category maps one parameter's raw value through a monotone
//! step function (breakpoints documented inline), then applies a
//! context modifier derived deterministically from the patient
//! context. All arithmetic is pure; the verifier re-runs these same
//! functions against the artifact's recorded inputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{
    ActivityLevel, AlcoholLevel, Parameter, PatientContext, RiskCategory,
};

use super::types::{AppliedModifier, RiskScore};

/// Fixed per-deployment category weights used by the overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub weights: BTreeMap<RiskCategory, f64>,
}

impl CategoryWeights {
    pub fn builtin() -> Self {
        let weights = [
            (RiskCategory::Anemia, 0.3),
            (RiskCategory::Infection, 0.3),
            (RiskCategory::Bleeding, 0.4),
            (RiskCategory::Metabolic, 0.2),
        ];
        Self {
            weights: weights.into_iter().collect(),
        }
    }

    pub fn get(&self, category: RiskCategory) -> f64 {
        self.weights.get(&category).copied().unwrap_or(0.0)
    }
}

/// Parameter each category scores on.
pub fn category_parameter(category: RiskCategory) -> &'static str {
    match category {
        RiskCategory::Anemia => "Hemoglobin",
        RiskCategory::Bleeding => "Platelets",
        RiskCategory::Infection => "WBC",
        RiskCategory::Metabolic => "Glucose_Fasting",
    }
}

/// Base score from the raw value. Breakpoints per category:
/// - anemia (hemoglobin g/dL): <7 -> 100, <10 -> 70, <12 -> 40, else 10
/// - bleeding (platelets x10^3/uL): <20 -> 100, <50 -> 70, <150 -> 40, else 10
/// - infection (WBC x10^3/uL), bimodal: <2 -> 90, <4 -> 60,
///   >20 -> 90, >11 -> 60, normal band -> 10
/// - metabolic (fasting glucose mg/dL): >=126 -> 80, >=100 -> 50, else 10
pub fn base_score(category: RiskCategory, value: f64) -> f64 {
    match category {
        RiskCategory::Anemia => match value {
            v if v < 7.0 => 100.0,
            v if v < 10.0 => 70.0,
            v if v < 12.0 => 40.0,
            _ => 10.0,
        },
        RiskCategory::Bleeding => match value {
            v if v < 20.0 => 100.0,
            v if v < 50.0 => 70.0,
            v if v < 150.0 => 40.0,
            _ => 10.0,
        },
        RiskCategory::Infection => match value {
            v if v < 2.0 => 90.0,
            v if v < 4.0 => 60.0,
            v if v > 20.0 => 90.0,
            v if v > 11.0 => 60.0,
            _ => 10.0,
        },
        RiskCategory::Metabolic => match value {
            v if v >= 126.0 => 80.0,
            v if v >= 100.0 => 50.0,
            _ => 10.0,
        },
    }
}

/// Context modifier chain: 1.0 base, fixed increments per age band,
/// history condition and adverse lifestyle attribute. Reproducible
/// from the patient context alone.
pub fn context_modifiers(ctx: &PatientContext) -> Vec<AppliedModifier> {
    let mut chain = Vec::new();

    if let Some(age) = ctx.age {
        if age >= 60 {
            chain.push(AppliedModifier {
                label: "age 60+".into(),
                increment: 0.4,
            });
        } else if age >= 40 {
            chain.push(AppliedModifier {
                label: "age 40-59".into(),
                increment: 0.2,
            });
        }
    }

    // BTreeSet iteration keeps the chain order deterministic.
    for condition in &ctx.history {
        chain.push(AppliedModifier {
            label: format!("history: {condition}"),
            increment: 0.15,
        });
    }

    if ctx.lifestyle.smoking {
        chain.push(AppliedModifier {
            label: "smoking".into(),
            increment: 0.2,
        });
    }
    if ctx.lifestyle.alcohol == AlcoholLevel::High {
        chain.push(AppliedModifier {
            label: "high alcohol intake".into(),
            increment: 0.1,
        });
    }
    if ctx.lifestyle.activity == ActivityLevel::Sedentary {
        chain.push(AppliedModifier {
            label: "sedentary".into(),
            increment: 0.1,
        });
    }

    chain
}

pub fn modifier_factor(chain: &[AppliedModifier]) -> f64 {
    1.0 + chain.iter().map(|m| m.increment).sum::<f64>()
}

/// Score every category whose parameter is present in the input.
/// Absent parameters skip the category entirely; the engine never
/// invents a value.
pub fn score_categories(params: &[Parameter], ctx: &PatientContext) -> Vec<RiskScore> {
    let chain = context_modifiers(ctx);
    let factor = modifier_factor(&chain);

    let mut scores = Vec::new();
    for category in [
        RiskCategory::Anemia,
        RiskCategory::Infection,
        RiskCategory::Bleeding,
        RiskCategory::Metabolic,
    ] {
        let name = category_parameter(category);
        let Some(p) = params.iter().find(|p| p.name == name) else {
            continue;
        };
        let raw = base_score(category, p.value);
        scores.push(RiskScore {
            category,
            input_value: p.value,
            raw,
            adjusted: (raw * factor).clamp(0.0, 100.0),
            modifiers: chain.clone(),
        });
    }
    scores
}

/// Overall wellbeing score: 100 minus the weighted sum of adjusted
/// category scores, clamped to [0,100]. Higher is better.
pub fn overall_score(scores: &[RiskScore], weights: &CategoryWeights) -> f64 {
    let burden: f64 = scores
        .iter()
        .map(|s| weights.get(s.category) * s.adjusted)
        .sum();
    (100.0 - burden).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParameterStatus;

    fn p(name: &str, value: f64, status: ParameterStatus) -> Parameter {
        Parameter {
            name: name.into(),
            value,
            unit: String::new(),
            status,
            range: None,
        }
    }

    /// Hemoglobin 9.5 sits in the 7..10 band.
    #[test]
    fn anemia_step_function() {
        assert_eq!(base_score(RiskCategory::Anemia, 6.5), 100.0);
        assert_eq!(base_score(RiskCategory::Anemia, 9.5), 70.0);
        assert_eq!(base_score(RiskCategory::Anemia, 11.0), 40.0);
        assert_eq!(base_score(RiskCategory::Anemia, 14.0), 10.0);
    }

    #[test]
    fn infection_step_function_is_bimodal() {
        assert_eq!(base_score(RiskCategory::Infection, 1.0), 90.0);
        assert_eq!(base_score(RiskCategory::Infection, 3.0), 60.0);
        assert_eq!(base_score(RiskCategory::Infection, 7.0), 10.0);
        assert_eq!(base_score(RiskCategory::Infection, 13.0), 60.0);
        assert_eq!(base_score(RiskCategory::Infection, 25.0), 90.0);
    }

    #[test]
    fn step_functions_are_monotone_toward_extremes() {
        let mut last = f64::INFINITY;
        for v in [2.0, 6.0, 9.0, 11.0, 14.0] {
            let s = base_score(RiskCategory::Anemia, v);
            assert!(s <= last, "anemia score must not increase with value");
            last = s;
        }
    }

    /// Age 65 with diabetes history raises the adjusted score above
    /// the base score.
    #[test]
    fn context_modifier_raises_adjusted_score() {
        let mut ctx = PatientContext::default();
        ctx.age = Some(65);
        ctx.history.insert("diabetes".into());

        let params = vec![p("Hemoglobin", 9.5, ParameterStatus::Low)];
        let scores = score_categories(&params, &ctx);
        assert_eq!(scores.len(), 1);
        let s = &scores[0];
        assert_eq!(s.raw, 70.0);
        // 1.0 + 0.4 (age) + 0.15 (history) = 1.55
        assert!((s.adjusted - 70.0 * 1.55).abs() < 1e-9);
        assert!(s.adjusted > s.raw);
        assert_eq!(s.modifiers.len(), 2);
    }

    #[test]
    fn adjusted_score_is_clamped_to_100() {
        let mut ctx = PatientContext::default();
        ctx.age = Some(70);
        ctx.history.insert("diabetes".into());
        ctx.lifestyle.smoking = true;

        let params = vec![p("Hemoglobin", 6.0, ParameterStatus::Low)];
        let scores = score_categories(&params, &ctx);
        assert_eq!(scores[0].adjusted, 100.0);
    }

    /// All-normal CBC yields overall >= 90 with default weights.
    #[test]
    fn all_normal_overall_score() {
        let ctx = PatientContext::default();
        let params = vec![
            p("Hemoglobin", 14.0, ParameterStatus::Normal),
            p("WBC", 7.0, ParameterStatus::Normal),
            p("Platelets", 250.0, ParameterStatus::Normal),
        ];
        let scores = score_categories(&params, &ctx);
        let overall = overall_score(&scores, &CategoryWeights::builtin());
        // 100 - (0.3*10 + 0.3*10 + 0.4*10) = 90
        assert!((overall - 90.0).abs() < 1e-9);
    }

    #[test]
    fn absent_parameter_skips_category() {
        let ctx = PatientContext::default();
        let params = vec![p("Hemoglobin", 14.0, ParameterStatus::Normal)];
        let scores = score_categories(&params, &ctx);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].category, RiskCategory::Anemia);
    }

    #[test]
    fn modifier_chain_is_reproducible() {
        let mut ctx = PatientContext::default();
        ctx.age = Some(45);
        ctx.history.insert("hypertension".into());
        ctx.history.insert("asthma".into());
        ctx.lifestyle.alcohol = AlcoholLevel::High;

        let a = context_modifiers(&ctx);
        let b = context_modifiers(&ctx);
        assert_eq!(a, b);
        // History entries come out in set order.
        assert_eq!(a[1].label, "history: asthma");
        assert_eq!(a[2].label, "history: hypertension");
    }

    #[test]
    fn scores_stay_in_range() {
        let mut ctx = PatientContext::default();
        ctx.age = Some(80);
        ctx.lifestyle.smoking = true;
        for value in [0.0, 5.0, 50.0, 500.0] {
            for category in [
                RiskCategory::Anemia,
                RiskCategory::Infection,
                RiskCategory::Bleeding,
                RiskCategory::Metabolic,
            ] {
                let name = category_parameter(category);
                let params = vec![p(name, value, ParameterStatus::Normal)];
                let scores = score_categories(&params, &ctx);
                for s in &scores {
                    assert!((0.0..=100.0).contains(&s.raw));
                    assert!((0.0..=100.0).contains(&s.adjusted));
                }
            }
        }
    }
}
