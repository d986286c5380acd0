//! Evidence-completeness scoring.
//!
//! Confidence is the ratio of evidence actually present to evidence
//! declared as required: a pure, monotone function of completeness.
//! A zero denominator yields the indeterminate sentinel rather than
//! 0 or 1, keeping "no evidence needed" distinct from "no evidence
//! available". Cause confidence is floored by the condition's prior
//! when the graph evidence is sparse.

use crate::models::Parameter;

use super::graph::KnowledgeGraph;
use super::priors::Priors;
use super::rules::{PatternRule, RuleLibrary};
use super::types::{
    CauseSet, ConfidenceScore, ConfidenceSubject, ConfidenceValue, Finding,
};

fn completeness(present: usize, required: usize) -> ConfidenceValue {
    if required == 0 {
        ConfidenceValue::Indeterminate
    } else {
        ConfidenceValue::Scored((present as f64 / required as f64).min(1.0))
    }
}

/// Confidence for one finding, against the evidence the originating
/// rule declares (preconditions plus supporting parameters).
pub fn finding_confidence(
    finding: &Finding,
    rule: &PatternRule,
    params: &[Parameter],
) -> ConfidenceScore {
    let evidence = rule.evidence_parameters();
    let present = evidence
        .iter()
        .filter(|name| params.iter().any(|p| &p.name == *name))
        .count();

    ConfidenceScore {
        subject: ConfidenceSubject::Finding {
            rule_id: finding.rule_id.clone(),
        },
        value: completeness(present, evidence.len()),
        evidence_present: present,
        evidence_required: evidence.len(),
    }
}

/// Confidence for one probable cause: contributing observations over
/// the observations the graph declares as direct evidence for the
/// condition, floored by the condition's prior.
pub fn cause_confidence(
    rule_id: &str,
    condition: &str,
    contributing_observations: usize,
    graph: &KnowledgeGraph,
    priors: &Priors,
) -> ConfidenceScore {
    let required = graph.declared_evidence(condition);
    let value = match completeness(contributing_observations, required) {
        ConfidenceValue::Scored(ratio) => {
            ConfidenceValue::Scored(ratio.max(priors.get(condition)).min(1.0))
        }
        indeterminate => indeterminate,
    };

    ConfidenceScore {
        subject: ConfidenceSubject::Cause {
            rule_id: rule_id.into(),
            condition: condition.into(),
        },
        value,
        evidence_present: contributing_observations,
        evidence_required: required,
    }
}

/// Count distinct observation nodes contributing to a cause (each
/// path's first hop is the observation).
pub fn contributing_observations(cause_edges: &[super::types::EdgeContribution]) -> usize {
    let mut seen: Vec<&str> = Vec::new();
    for c in cause_edges {
        if let Some(first) = c.path.split(" -> ").next() {
            if !seen.contains(&first) {
                seen.push(first);
            }
        }
    }
    seen.len()
}

/// Score every finding and every resolved cause for an artifact.
pub fn score_all(
    findings: &[Finding],
    cause_sets: &[CauseSet],
    library: &RuleLibrary,
    graph: &KnowledgeGraph,
    priors: &Priors,
    params: &[Parameter],
) -> Vec<ConfidenceScore> {
    let mut out = Vec::new();

    for finding in findings {
        if let Some(rule) = library.rules.iter().find(|r| r.id == finding.rule_id) {
            out.push(finding_confidence(finding, rule, params));
        }
    }

    for set in cause_sets {
        for cause in &set.causes {
            out.push(cause_confidence(
                &set.rule_id,
                &cause.condition,
                contributing_observations(&cause.edges),
                graph,
                priors,
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Likelihood, ParameterStatus};

    fn p(name: &str) -> Parameter {
        Parameter {
            name: name.into(),
            value: 1.0,
            unit: String::new(),
            status: ParameterStatus::Low,
            range: None,
        }
    }

    fn rule_with_evidence(required: &[&str], supporting: &[&str]) -> PatternRule {
        PatternRule {
            id: "r".into(),
            label: "r".into(),
            likelihood: Likelihood::Possible,
            priority: 1,
            preconditions: required
                .iter()
                .map(|name| super::super::rules::ParamCondition {
                    parameter: name.to_string(),
                    status: ParameterStatus::Low,
                    band: None,
                })
                .collect(),
            context: vec![],
            supporting: supporting.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn finding() -> Finding {
        Finding {
            rule_id: "r".into(),
            label: "r".into(),
            likelihood: Likelihood::Possible,
            matched: vec![],
        }
    }

    #[test]
    fn full_evidence_scores_one() {
        let rule = rule_with_evidence(&["Hemoglobin", "MCV"], &[]);
        let params = vec![p("Hemoglobin"), p("MCV")];
        let score = finding_confidence(&finding(), &rule, &params);
        assert_eq!(score.value, ConfidenceValue::Scored(1.0));
        assert_eq!(score.evidence_present, 2);
        assert_eq!(score.evidence_required, 2);
    }

    #[test]
    fn missing_supporting_evidence_lowers_score() {
        let rule = rule_with_evidence(&["Hemoglobin", "MCV"], &["RDW"]);
        let params = vec![p("Hemoglobin"), p("MCV")];
        let score = finding_confidence(&finding(), &rule, &params);
        match score.value {
            ConfidenceValue::Scored(v) => assert!((v - 2.0 / 3.0).abs() < 1e-9),
            ConfidenceValue::Indeterminate => panic!("expected scored"),
        }
    }

    /// Monotone non-decreasing in present count for a fixed
    /// denominator.
    #[test]
    fn confidence_is_monotone_in_present_evidence() {
        let rule = rule_with_evidence(&["A", "B"], &["C", "D"]);
        let mut last = -1.0;
        let names = ["A", "B", "C", "D"];
        for n in 0..=names.len() {
            let params: Vec<Parameter> = names[..n].iter().map(|s| p(s)).collect();
            let score = finding_confidence(&finding(), &rule, &params);
            let ConfidenceValue::Scored(v) = score.value else {
                panic!("expected scored");
            };
            assert!(v >= last, "confidence decreased at n={n}");
            last = v;
        }
    }

    #[test]
    fn zero_denominator_is_indeterminate() {
        assert_eq!(completeness(0, 0), ConfidenceValue::Indeterminate);
    }

    #[test]
    fn cause_confidence_floored_by_prior() {
        let graph = KnowledgeGraph::builtin();
        let priors = Priors::builtin();
        // One of three declared observations present: ratio 1/3, but
        // Iron_Deficiency prior is 0.30 < 1/3, so the ratio wins.
        let score = cause_confidence("r", "Iron_Deficiency", 1, &graph, &priors);
        let ConfidenceValue::Scored(v) = score.value else {
            panic!("expected scored");
        };
        assert!((v - 1.0 / 3.0).abs() < 1e-9);

        // Sparse evidence for a higher-prior condition: floor applies.
        // Bacterial_Infection declares 2 observations, prior 0.25.
        let score = cause_confidence("r", "Bacterial_Infection", 0, &graph, &priors);
        let ConfidenceValue::Scored(v) = score.value else {
            panic!("expected scored");
        };
        assert!((v - 0.25).abs() < 1e-9);
    }

    #[test]
    fn unknown_condition_is_indeterminate() {
        let graph = KnowledgeGraph::builtin();
        let priors = Priors::builtin();
        let score = cause_confidence("r", "Martian_Flu", 0, &graph, &priors);
        assert_eq!(score.value, ConfidenceValue::Indeterminate);
    }

    #[test]
    fn contributing_observations_dedupes_first_hop() {
        use super::super::types::EdgeContribution;
        let edges = vec![
            EdgeContribution { path: "A:LOW -> X".into(), weight: 0.5 },
            EdgeContribution { path: "A:LOW -> Y -> X".into(), weight: 0.2 },
            EdgeContribution { path: "B:LOW -> X".into(), weight: 0.4 },
        ];
        assert_eq!(contributing_observations(&edges), 2);
    }
}
