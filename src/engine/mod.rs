//! The reasoning pipeline.
//!
//! One engine instance holds the immutable configuration and runs
//! every report through the same fixed stage order: load, pattern
//! rules, probable causes, risk, severity, confidence, guardrails,
//! verification. No stage mutates configuration, so a single engine
//! is shared by reference across any number of reports.

pub mod confidence;
pub mod graph;
pub mod guardrails;
pub mod loader;
pub mod priors;
pub mod report;
pub mod risk;
pub mod rules;
pub mod severity;
pub mod types;
pub mod verifier;

use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::models::VerificationStatus;

use types::{Artifact, CauseSet, EngineError};

/// Deterministic lab-report reasoning engine.
pub struct ReasoningEngine {
    config: EngineConfig,
}

impl ReasoningEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full pipeline over one JSON-encoded report.
    pub fn analyze_json(&self, json: &str) -> Result<Artifact, EngineError> {
        let raw = loader::parse_report(json)?;
        self.analyze(raw)
    }

    /// Run the full pipeline over one raw report.
    pub fn analyze(&self, raw: loader::RawReport) -> Result<Artifact, EngineError> {
        let start = Instant::now();

        let (parameters, patient) = loader::load_report(raw)?;

        let (findings, skipped) = rules::evaluate(&self.config.rules, &parameters, &patient);
        for skip in &skipped {
            tracing::warn!(rule_id = %skip.rule_id, reason = %skip.reason, "rule skipped");
        }

        let causes: Vec<CauseSet> = findings
            .iter()
            .map(|f| {
                graph::resolve_causes(
                    &self.config.graph,
                    &self.config.priors,
                    f,
                    &parameters,
                    self.config.top_k,
                )
            })
            .collect();

        let risks = risk::score_categories(&parameters, &patient);
        let overall_risk = risk::overall_score(&risks, &self.config.category_weights);
        let severities = severity::label_parameters(&parameters);

        let mut artifact = Artifact {
            id: Uuid::new_v4(),
            created_at: Utc::now().naive_utc(),
            parameters,
            patient,
            findings,
            causes,
            risks,
            overall_risk,
            severities,
            confidences: Vec::new(),
            redactions: Vec::new(),
            verification: VerificationStatus::Verified,
        };

        // Guardrails run before confidence scoring so the scores are
        // attached to the exact strings the artifact carries.
        guardrails::apply(&mut artifact);
        artifact.confidences = confidence::score_all(
            &artifact.findings,
            &artifact.causes,
            &self.config.rules,
            &self.config.graph,
            &self.config.priors,
            &artifact.parameters,
        );

        let mismatches = verifier::check(
            &artifact,
            &self.config.rules,
            &self.config.graph,
            &self.config.priors,
            &self.config.category_weights,
        );
        if !mismatches.is_empty() {
            for m in &mismatches {
                tracing::warn!(artifact_id = %artifact.id, mismatch = %m, "verification failed");
            }
            artifact.verification = VerificationStatus::NeedsReview;
        }

        tracing::info!(
            artifact_id = %artifact.id,
            findings = artifact.findings.len(),
            causes = artifact.causes.iter().map(|c| c.causes.len()).sum::<usize>(),
            risks = artifact.risks.len(),
            redactions = artifact.redactions.len(),
            verification = artifact.verification.as_str(),
            processing_ms = start.elapsed().as_millis() as u64,
            "report analyzed"
        );

        Ok(artifact)
    }
}
