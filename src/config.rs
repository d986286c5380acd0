//! Versioned external configuration.
//!
//! Every behavioral table the engine consults lives here: the rule
//! library, the knowledge graph, the priors and the category weights.
//! Deployments either take the compiled-in defaults or load a
//! directory of JSON files reviewed and versioned out of band. The
//! engine itself never mutates configuration.

use std::path::Path;

use serde::Deserialize;

use crate::engine::graph::{Edge, KnowledgeGraph};
use crate::engine::priors::Priors;
use crate::engine::risk::CategoryWeights;
use crate::engine::rules::RuleLibrary;
use crate::engine::types::EngineError;

pub const DEFAULT_TOP_K: usize = 3;

/// Immutable configuration bundle shared across all reports.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub rules: RuleLibrary,
    pub graph: KnowledgeGraph,
    pub priors: Priors,
    pub category_weights: CategoryWeights,
    /// Probable causes retained per finding.
    pub top_k: usize,
}

fn read_json<T: for<'de> Deserialize<'de>>(dir: &Path, file: &str) -> Result<T, EngineError> {
    let path = dir.join(file);
    let json = std::fs::read_to_string(&path)
        .map_err(|e| EngineError::ConfigLoad(path.display().to_string(), e.to_string()))?;
    serde_json::from_str(&json).map_err(|e| EngineError::ConfigParse(file.into(), e.to_string()))
}

impl EngineConfig {
    /// Compiled-in defaults.
    pub fn builtin() -> Self {
        Self {
            rules: RuleLibrary::builtin(),
            graph: KnowledgeGraph::builtin(),
            priors: Priors::builtin(),
            category_weights: CategoryWeights::builtin(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Load configuration from a directory of JSON files. All four
    /// files must be present; a partially overridden deployment is a
    /// review hazard.
    pub fn load(dir: &Path) -> Result<Self, EngineError> {
        let rules: RuleLibrary = read_json(dir, "rules.json")?;
        let edges: Vec<Edge> = read_json(dir, "knowledge_graph.json")?;
        let graph = KnowledgeGraph::new(edges)?;
        let priors = read_json::<Priors>(dir, "priors.json")?.validated()?;
        let category_weights: CategoryWeights = read_json(dir, "weights.json")?;

        Ok(Self {
            rules,
            graph,
            priors,
            category_weights,
            top_k: DEFAULT_TOP_K,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn builtin_config_is_complete() {
        let config = EngineConfig::builtin();
        assert!(!config.rules.rules.is_empty());
        assert!(!config.graph.edges().is_empty());
        assert!(!config.priors.weights.is_empty());
        assert_eq!(config.top_k, DEFAULT_TOP_K);
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let builtin = EngineConfig::builtin();
        fs::write(
            dir.path().join("rules.json"),
            serde_json::to_string(&builtin.rules).unwrap(),
        )
        .unwrap();
        fs::write(
            dir.path().join("knowledge_graph.json"),
            serde_json::to_string(builtin.graph.edges()).unwrap(),
        )
        .unwrap();
        fs::write(
            dir.path().join("priors.json"),
            serde_json::to_string(&builtin.priors).unwrap(),
        )
        .unwrap();
        fs::write(
            dir.path().join("weights.json"),
            serde_json::to_string(&builtin.category_weights).unwrap(),
        )
        .unwrap();

        let loaded = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.rules, builtin.rules);
        assert_eq!(loaded.priors, builtin.priors);
        assert_eq!(
            loaded.graph.declared_evidence("Iron_Deficiency"),
            builtin.graph.declared_evidence("Iron_Deficiency")
        );
    }

    #[test]
    fn missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::ConfigLoad(_, _)), "{err}");
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rules.json"), "{broken").unwrap();
        let err = EngineConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::ConfigParse(_, _)), "{err}");
    }

    #[test]
    fn out_of_range_prior_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let builtin = EngineConfig::builtin();
        fs::write(
            dir.path().join("rules.json"),
            serde_json::to_string(&builtin.rules).unwrap(),
        )
        .unwrap();
        fs::write(
            dir.path().join("knowledge_graph.json"),
            serde_json::to_string(builtin.graph.edges()).unwrap(),
        )
        .unwrap();
        fs::write(
            dir.path().join("priors.json"),
            r#"{"weights": {"Iron_Deficiency": 1.5}}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("weights.json"),
            serde_json::to_string(&builtin.category_weights).unwrap(),
        )
        .unwrap();
        let err = EngineConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::ConfigParse(_, _)), "{err}");
    }

    #[test]
    fn out_of_range_graph_weight_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let builtin = EngineConfig::builtin();
        fs::write(
            dir.path().join("rules.json"),
            serde_json::to_string(&builtin.rules).unwrap(),
        )
        .unwrap();
        fs::write(
            dir.path().join("knowledge_graph.json"),
            r#"[{"from": "Hemoglobin:LOW", "to": "Iron_Deficiency", "weight": 2.0}]"#,
        )
        .unwrap();
        let err = EngineConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::ConfigParse(_, _)));
    }
}
