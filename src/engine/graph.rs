//! Static weighted knowledge graph and the probable-causes resolver.
//!
//! Nodes are observation identifiers ("Hemoglobin:LOW") and condition
//! identifiers ("Iron_Deficiency"). Edges are directed with a causal
//! strength in [0,1]. The graph is built once at engine construction
//! and never mutated while serving reports, so it is safe to share
//! across concurrently processed reports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Parameter;

use super::priors::Priors;
use super::types::{CauseSet, EdgeContribution, EngineError, Finding, ProbableCause};

/// Traversal never follows more than this many edges from an
/// observation, bounding transitive-cause explosion.
pub const MAX_DEPTH: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub weight: f64,
}

/// Construction goes through [`KnowledgeGraph::new`] (validating) or
/// [`KnowledgeGraph::from_edges_unchecked`]; both build the adjacency
/// indexes. External config deserializes a plain `Vec<Edge>` and calls
/// `new`, so a graph can never exist with unvalidated weights or an
/// empty index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeGraph {
    edges: Vec<Edge>,
    /// Adjacency index over `edges`.
    #[serde(skip)]
    outbound: BTreeMap<String, Vec<usize>>,
    /// Condition -> number of distinct observation nodes with a direct
    /// edge into it. The confidence stage uses this as the evidence
    /// denominator for causes.
    #[serde(skip)]
    inbound_observations: BTreeMap<String, usize>,
}

impl KnowledgeGraph {
    pub fn new(edges: Vec<Edge>) -> Result<Self, EngineError> {
        for e in &edges {
            if !(0.0..=1.0).contains(&e.weight) {
                return Err(EngineError::ConfigParse(
                    "knowledge_graph".into(),
                    format!("edge {} -> {} weight {} outside [0,1]", e.from, e.to, e.weight),
                ));
            }
        }
        let mut graph = Self {
            edges,
            outbound: BTreeMap::new(),
            inbound_observations: BTreeMap::new(),
        };
        graph.reindex();
        Ok(graph)
    }

    fn reindex(&mut self) {
        self.outbound.clear();
        self.inbound_observations.clear();
        let mut seen: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for (idx, e) in self.edges.iter().enumerate() {
            self.outbound.entry(e.from.clone()).or_default().push(idx);
            // Observation nodes carry a ':' separator; condition nodes
            // never do.
            if e.from.contains(':') {
                let sources = seen.entry(e.to.clone()).or_default();
                if !sources.contains(&e.from.as_str()) {
                    sources.push(&e.from);
                }
            }
        }
        for (cond, sources) in seen {
            self.inbound_observations.insert(cond, sources.len());
        }
    }

    /// Build from edges already known to be in range, skipping the
    /// weight check. Still builds the adjacency indexes.
    pub fn from_edges_unchecked(edges: Vec<Edge>) -> Self {
        let mut graph = Self {
            edges,
            outbound: BTreeMap::new(),
            inbound_observations: BTreeMap::new(),
        };
        graph.reindex();
        graph
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Distinct observation nodes the graph declares as direct
    /// evidence for a condition.
    pub fn declared_evidence(&self, condition: &str) -> usize {
        self.inbound_observations
            .get(condition)
            .copied()
            .unwrap_or(0)
    }

    fn outbound_edges(&self, node: &str) -> impl Iterator<Item = &Edge> {
        self.outbound
            .get(node)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    /// Walk outbound edges from the given observation nodes up to
    /// [`MAX_DEPTH`], accumulating path-weight products per reachable
    /// condition node.
    fn reachable_conditions(
        &self,
        observations: &[String],
    ) -> BTreeMap<String, Vec<EdgeContribution>> {
        let mut hits: BTreeMap<String, Vec<EdgeContribution>> = BTreeMap::new();

        for obs in observations {
            for e1 in self.outbound_edges(obs) {
                hits.entry(e1.to.clone()).or_default().push(EdgeContribution {
                    path: format!("{} -> {}", e1.from, e1.to),
                    weight: e1.weight,
                });
                if MAX_DEPTH < 2 {
                    continue;
                }
                for e2 in self.outbound_edges(&e1.to) {
                    hits.entry(e2.to.clone()).or_default().push(EdgeContribution {
                        path: format!("{} -> {} -> {}", e1.from, e1.to, e2.to),
                        weight: e1.weight * e2.weight,
                    });
                }
            }
        }
        hits
    }

    /// Compiled-in default graph. Deployments may replace it with a
    /// versioned `knowledge_graph.json`.
    pub fn builtin() -> Self {
        fn e(from: &str, to: &str, weight: f64) -> Edge {
            Edge {
                from: from.into(),
                to: to.into(),
                weight,
            }
        }
        let edges = vec![
            // Anemia evidence.
            e("Hemoglobin:LOW", "Iron_Deficiency", 0.6),
            e("Hemoglobin:LOW", "Chronic_Disease", 0.4),
            e("Hemoglobin:LOW", "Acute_Blood_Loss", 0.3),
            e("MCV:LOW", "Iron_Deficiency", 0.7),
            e("MCV:LOW", "Thalassemia_Trait", 0.4),
            e("MCV:HIGH", "B12_Folate_Deficiency", 0.7),
            e("RDW:HIGH", "Iron_Deficiency", 0.4),
            // White-cell evidence.
            e("WBC:HIGH", "Bacterial_Infection", 0.5),
            e("WBC:HIGH", "Viral_Infection", 0.4),
            e("WBC:LOW", "Viral_Infection", 0.4),
            e("WBC:LOW", "Bone_Marrow_Suppression", 0.4),
            e("Neutrophils:HIGH", "Bacterial_Infection", 0.7),
            e("Lymphocytes:HIGH", "Viral_Infection", 0.7),
            // Platelet evidence.
            e("Platelets:LOW", "Immune_Thrombocytopenia", 0.5),
            e("Platelets:LOW", "Bone_Marrow_Suppression", 0.4),
            e("Platelets:LOW", "Medication_Effect", 0.3),
            // Metabolic / lipid / renal evidence.
            e("Glucose_Fasting:HIGH", "Diabetes_Mellitus", 0.7),
            e("Glucose_Fasting:HIGH", "Metabolic_Syndrome", 0.5),
            e("HbA1c:HIGH", "Diabetes_Mellitus", 0.8),
            e("LDL:HIGH", "Cardiovascular_Disease", 0.6),
            e("Triglycerides:HIGH", "Metabolic_Syndrome", 0.5),
            e("HDL:LOW", "Metabolic_Syndrome", 0.4),
            e("Creatinine:HIGH", "Renal_Impairment", 0.7),
            e("Urea_BUN:HIGH", "Renal_Impairment", 0.5),
            e("Hemoglobin:HIGH", "Secondary_Polycythemia", 0.5),
            // Condition -> condition links, reachable only at depth 2.
            e("Bacterial_Infection", "Sepsis", 0.2),
            e("Metabolic_Syndrome", "Cardiovascular_Disease", 0.4),
        ];
        // Weights above are all in range; construction cannot fail.
        Self::from_edges_unchecked(edges)
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Rank candidate conditions for one finding by traversing the graph
/// from the finding's matched observation nodes. Score per condition is
/// the prior-weighted sum of path contributions, capped at 1.0. Ties
/// break alphabetically for determinism.
pub fn resolve_causes(
    graph: &KnowledgeGraph,
    priors: &Priors,
    finding: &Finding,
    params: &[Parameter],
    top_k: usize,
) -> CauseSet {
    let observations: Vec<String> = finding
        .matched
        .iter()
        .filter_map(|name| params.iter().find(|p| &p.name == name))
        .map(Parameter::observation_node)
        .collect();

    let hits = graph.reachable_conditions(&observations);

    let mut causes: Vec<ProbableCause> = hits
        .into_iter()
        .map(|(condition, edges)| {
            let evidence: f64 = edges.iter().map(|c| c.weight).sum();
            let score = (evidence * (1.0 + priors.get(&condition)) / 2.0).min(1.0);
            ProbableCause {
                condition,
                edges,
                score,
            }
        })
        .collect();

    causes.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.condition.cmp(&b.condition))
    });
    causes.truncate(top_k);

    CauseSet {
        rule_id: finding.rule_id.clone(),
        causes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Likelihood, ParameterStatus};

    fn p(name: &str, status: ParameterStatus) -> Parameter {
        Parameter {
            name: name.into(),
            value: 0.0,
            unit: String::new(),
            status,
            range: None,
        }
    }

    fn finding(rule_id: &str, matched: &[&str]) -> Finding {
        Finding {
            rule_id: rule_id.into(),
            label: rule_id.into(),
            likelihood: Likelihood::Likely,
            matched: matched.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn microcytic_evidence_ranks_iron_deficiency_first() {
        let graph = KnowledgeGraph::builtin();
        let priors = Priors::builtin();
        let params = vec![
            p("Hemoglobin", ParameterStatus::Low),
            p("MCV", ParameterStatus::Low),
        ];
        let set = resolve_causes(
            &graph,
            &priors,
            &finding("anemia_microcytic", &["Hemoglobin", "MCV"]),
            &params,
            3,
        );
        assert_eq!(set.causes[0].condition, "Iron_Deficiency");
        assert!(set.causes.len() <= 3);
        assert!(set.causes[0].score <= 1.0);
        // Both observations contribute edges.
        assert!(set.causes[0].edges.len() >= 2);
    }

    #[test]
    fn depth_two_reaches_indirect_conditions_only_via_one_hop() {
        let graph = KnowledgeGraph::builtin();
        let priors = Priors::builtin();
        let params = vec![
            p("WBC", ParameterStatus::High),
            p("Neutrophils", ParameterStatus::High),
        ];
        let set = resolve_causes(
            &graph,
            &priors,
            &finding("infection_bacterial", &["WBC", "Neutrophils"]),
            &params,
            10,
        );
        // Sepsis is only reachable through Bacterial_Infection.
        let sepsis = set
            .causes
            .iter()
            .find(|c| c.condition == "Sepsis")
            .expect("depth-2 condition reachable");
        assert!(sepsis.edges.iter().all(|c| c.path.contains("Bacterial_Infection")));
        let bacterial = set
            .causes
            .iter()
            .find(|c| c.condition == "Bacterial_Infection")
            .unwrap();
        assert!(bacterial.score > sepsis.score);
    }

    #[test]
    fn ranking_is_deterministic() {
        let graph = KnowledgeGraph::builtin();
        let priors = Priors::builtin();
        let params = vec![p("Platelets", ParameterStatus::Low)];
        let f = finding("thrombocytopenia_mild", &["Platelets"]);
        let a = resolve_causes(&graph, &priors, &f, &params, 3);
        let b = resolve_causes(&graph, &priors, &f, &params, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn equal_scores_tie_break_alphabetically() {
        let graph = KnowledgeGraph::from_edges_unchecked(vec![
            Edge { from: "X:LOW".into(), to: "Zeta".into(), weight: 0.5 },
            Edge { from: "X:LOW".into(), to: "Alpha".into(), weight: 0.5 },
        ]);
        let priors = Priors { weights: BTreeMap::new() };
        let params = vec![p("X", ParameterStatus::Low)];
        let set = resolve_causes(&graph, &priors, &finding("x", &["X"]), &params, 2);
        assert_eq!(set.causes[0].condition, "Alpha");
        assert_eq!(set.causes[1].condition, "Zeta");
    }

    #[test]
    fn unmatched_parameters_contribute_nothing() {
        let graph = KnowledgeGraph::builtin();
        let priors = Priors::builtin();
        // Finding references a parameter absent from the input; the
        // resolver simply has no observation to walk from.
        let set = resolve_causes(&graph, &priors, &finding("anemia", &["Hemoglobin"]), &[], 3);
        assert!(set.causes.is_empty());
    }

    #[test]
    fn out_of_range_weight_rejected_at_load() {
        let err = KnowledgeGraph::new(vec![Edge {
            from: "A:LOW".into(),
            to: "B".into(),
            weight: 1.5,
        }])
        .unwrap_err();
        assert!(matches!(err, EngineError::ConfigParse(_, _)));
    }

    /// The config wire form is a plain edge list; rebuilding through
    /// `new` re-validates weights and restores the indexes.
    #[test]
    fn edge_list_round_trip_rebuilds_indexes() {
        let original = KnowledgeGraph::builtin();
        let json = serde_json::to_string(original.edges()).unwrap();
        let edges: Vec<Edge> = serde_json::from_str(&json).unwrap();
        let rebuilt = KnowledgeGraph::new(edges).unwrap();
        assert_eq!(rebuilt, original);
        assert_eq!(
            rebuilt.declared_evidence("Iron_Deficiency"),
            original.declared_evidence("Iron_Deficiency")
        );
    }

    #[test]
    fn declared_evidence_counts_direct_observations() {
        let graph = KnowledgeGraph::builtin();
        // Iron_Deficiency: Hemoglobin:LOW, MCV:LOW, RDW:HIGH.
        assert_eq!(graph.declared_evidence("Iron_Deficiency"), 3);
        assert_eq!(graph.declared_evidence("Unknown_Condition"), 0);
    }
}
