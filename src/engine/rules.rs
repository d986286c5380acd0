//! Declarative clinical pattern rules and the generic matcher.
//!
//! Every pattern is a data record; adding one never touches control
//! flow. Matching is evaluated purely against the loaded input (no
//! rule ever sees another rule's output), so rules cannot chain.

use serde::{Deserialize, Serialize};

use crate::models::{Likelihood, Parameter, ParameterStatus, PatientContext};

use super::types::{Finding, RuleEvaluationError};

// ---------------------------------------------------------------------------
// Rule model
// ---------------------------------------------------------------------------

/// Half-open value band `[min, max)`; either bound may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ValueBand {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl ValueBand {
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |m| value >= m) && self.max.map_or(true, |m| value < m)
    }
}

/// One parameter precondition. Holds when the named parameter is
/// present, carries the expected status, and (if a band is declared)
/// its value falls inside the band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamCondition {
    pub parameter: String,
    pub status: ParameterStatus,
    #[serde(default)]
    pub band: Option<ValueBand>,
}

/// Patient-context precondition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContextCondition {
    MinAge(u32),
    MaxAge(u32),
    Smoker,
    HasHistory(String),
}

/// A declarative clinical pattern rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRule {
    pub id: String,
    /// Finding label, evidentiary phrasing only.
    pub label: String,
    pub likelihood: Likelihood,
    /// Tie-break key: higher priority rules emit first.
    pub priority: u32,
    /// ALL must hold; partial matches never fire.
    pub preconditions: Vec<ParamCondition>,
    /// ALL must hold.
    #[serde(default)]
    pub context: Vec<ContextCondition>,
    /// Extra evidence parameters counted by the confidence stage but
    /// not required for the rule to fire (e.g. RDW for anemia typing).
    #[serde(default)]
    pub supporting: Vec<String>,
}

impl PatternRule {
    /// Parameters the rule declares as required evidence, in
    /// declaration order: preconditions first, then supporting.
    pub fn evidence_parameters(&self) -> Vec<&str> {
        self.preconditions
            .iter()
            .map(|c| c.parameter.as_str())
            .chain(self.supporting.iter().map(String::as_str))
            .collect()
    }
}

/// The versioned rule library consumed at engine construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleLibrary {
    pub rules: Vec<PatternRule>,
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

fn param<'a>(params: &'a [Parameter], name: &str) -> Option<&'a Parameter> {
    params.iter().find(|p| p.name == name)
}

fn context_holds(cond: &ContextCondition, ctx: &PatientContext) -> bool {
    match cond {
        ContextCondition::MinAge(min) => ctx.age.is_some_and(|a| a >= *min),
        ContextCondition::MaxAge(max) => ctx.age.is_some_and(|a| a <= *max),
        ContextCondition::Smoker => ctx.lifestyle.smoking,
        ContextCondition::HasHistory(h) => ctx.has_history(h),
    }
}

/// Evaluate one rule against the input. `Ok(None)` means the rule did
/// not fire; `Err` means the rule itself is unusable.
fn evaluate_rule(
    rule: &PatternRule,
    params: &[Parameter],
    ctx: &PatientContext,
) -> Result<Option<Finding>, RuleEvaluationError> {
    if rule.preconditions.is_empty() {
        return Err(RuleEvaluationError {
            rule_id: rule.id.clone(),
            reason: "rule declares no parameter preconditions".into(),
        });
    }

    let mut matched = Vec::with_capacity(rule.preconditions.len());
    for cond in &rule.preconditions {
        let Some(p) = param(params, &cond.parameter) else {
            return Ok(None);
        };
        if p.status != cond.status {
            return Ok(None);
        }
        if let Some(band) = &cond.band {
            if !band.contains(p.value) {
                return Ok(None);
            }
        }
        matched.push(p.name.clone());
    }

    if !rule.context.iter().all(|c| context_holds(c, ctx)) {
        return Ok(None);
    }

    Ok(Some(Finding {
        rule_id: rule.id.clone(),
        label: rule.label.clone(),
        likelihood: rule.likelihood,
        matched,
    }))
}

/// Evaluate the whole library. Findings are emitted in descending
/// priority, then declaration order; misbehaving rules are skipped and
/// reported so the caller can log them.
pub fn evaluate(
    library: &RuleLibrary,
    params: &[Parameter],
    ctx: &PatientContext,
) -> (Vec<Finding>, Vec<RuleEvaluationError>) {
    let mut fired: Vec<(u32, usize, Finding)> = Vec::new();
    let mut skipped = Vec::new();

    for (decl_idx, rule) in library.rules.iter().enumerate() {
        match evaluate_rule(rule, params, ctx) {
            Ok(Some(finding)) => fired.push((rule.priority, decl_idx, finding)),
            Ok(None) => {}
            Err(e) => skipped.push(e),
        }
    }

    fired.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    (fired.into_iter().map(|(_, _, f)| f).collect(), skipped)
}

// ---------------------------------------------------------------------------
// Built-in library
// ---------------------------------------------------------------------------

impl RuleLibrary {
    /// Compiled-in default rule set. Deployments may replace it with a
    /// versioned `rules.json`.
    pub fn builtin() -> Self {
        fn cond(parameter: &str, status: ParameterStatus) -> ParamCondition {
            ParamCondition {
                parameter: parameter.into(),
                status,
                band: None,
            }
        }
        fn banded(
            parameter: &str,
            status: ParameterStatus,
            min: Option<f64>,
            max: Option<f64>,
        ) -> ParamCondition {
            ParamCondition {
                parameter: parameter.into(),
                status,
                band: Some(ValueBand { min, max }),
            }
        }
        fn rule(
            id: &str,
            label: &str,
            likelihood: Likelihood,
            priority: u32,
            preconditions: Vec<ParamCondition>,
        ) -> PatternRule {
            PatternRule {
                id: id.into(),
                label: label.into(),
                likelihood,
                priority,
                preconditions,
                context: vec![],
                supporting: vec![],
            }
        }

        use Likelihood::{Likely, Possible, Strong};
        use ParameterStatus::{High, Low, Normal};

        let mut rules = vec![
            // Composite: all three lineages depressed at once.
            rule(
                "pancytopenia",
                "pancytopenia pattern, all three cell lineages reduced",
                Strong,
                100,
                vec![
                    cond("Hemoglobin", Low),
                    cond("WBC", Low),
                    cond("Platelets", Low),
                ],
            ),
            // Anemia subtypes keyed on Hemoglobin status x MCV band.
            rule(
                "anemia_microcytic",
                "microcytic anemia pattern",
                Likely,
                90,
                vec![cond("Hemoglobin", Low), cond("MCV", Low)],
            ),
            rule(
                "anemia_macrocytic",
                "macrocytic anemia pattern",
                Likely,
                90,
                vec![cond("Hemoglobin", Low), cond("MCV", High)],
            ),
            rule(
                "anemia_normocytic",
                "normocytic anemia pattern",
                Likely,
                85,
                vec![cond("Hemoglobin", Low), cond("MCV", Normal)],
            ),
            // Thrombocytopenia severity keyed on platelet-count bands
            // (x10^3/uL). Status stays authoritative; the band only
            // grades depth within LOW.
            rule(
                "thrombocytopenia_severe",
                "severe thrombocytopenia pattern, platelets below 50",
                Strong,
                80,
                vec![banded("Platelets", Low, None, Some(50.0))],
            ),
            rule(
                "thrombocytopenia_moderate",
                "moderate thrombocytopenia pattern, platelets 50 to 100",
                Likely,
                70,
                vec![banded("Platelets", Low, Some(50.0), Some(100.0))],
            ),
            rule(
                "thrombocytopenia_mild",
                "mild thrombocytopenia pattern",
                Possible,
                60,
                vec![banded("Platelets", Low, Some(100.0), None)],
            ),
            // Infection typing keyed on WBC x differential.
            rule(
                "infection_bacterial",
                "neutrophilic leukocytosis, pattern consistent with bacterial infection",
                Likely,
                70,
                vec![cond("WBC", High), cond("Neutrophils", High)],
            ),
            rule(
                "infection_viral",
                "lymphocytic leukocytosis, pattern consistent with viral infection",
                Likely,
                70,
                vec![cond("WBC", High), cond("Lymphocytes", High)],
            ),
            // Single-lineage signals.
            rule(
                "anemia",
                "anemia pattern, hemoglobin below reference",
                Possible,
                50,
                vec![cond("Hemoglobin", Low)],
            ),
            rule(
                "leukopenia",
                "leukopenia pattern, white cell count below reference",
                Possible,
                50,
                vec![cond("WBC", Low)],
            ),
            rule(
                "leukocytosis",
                "leukocytosis pattern, white cell count above reference",
                Possible,
                50,
                vec![cond("WBC", High)],
            ),
            // Metabolic / lipid.
            rule(
                "impaired_fasting_glucose",
                "elevated fasting glucose pattern",
                Likely,
                55,
                vec![cond("Glucose_Fasting", High)],
            ),
            rule(
                "dyslipidemia",
                "dyslipidemia pattern, LDL above reference",
                Possible,
                45,
                vec![cond("LDL", High)],
            ),
            rule(
                "hypertriglyceridemia",
                "hypertriglyceridemia pattern",
                Possible,
                45,
                vec![cond("Triglycerides", High)],
            ),
            rule(
                "renal_marker",
                "elevated renal marker pattern",
                Possible,
                40,
                vec![cond("Creatinine", High)],
            ),
        ];

        // RDW supports but does not gate anemia typing.
        for r in rules.iter_mut() {
            if r.id.starts_with("anemia_") {
                r.supporting.push("RDW".into());
            }
        }

        // Secondary polycythemia needs the smoking context.
        rules.push(PatternRule {
            id: "polycythemia_smoking".into(),
            label: "elevated hemoglobin pattern consistent with smoking-related polycythemia".into(),
            likelihood: Possible,
            priority: 40,
            preconditions: vec![cond("Hemoglobin", High)],
            context: vec![ContextCondition::Smoker],
            supporting: vec!["RBC".into()],
        });

        Self { rules }
    }
}
