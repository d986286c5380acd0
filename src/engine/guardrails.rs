//! Output guardrails.
//!
//! Every human-readable string the engine emits passes through a fixed
//! table of deny patterns before it reaches an artifact. Matches are
//! replaced with a redaction marker and logged; nothing is silently
//! dropped. The pass is idempotent because the marker itself matches
//! no pattern.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{Artifact, RedactionCategory, RedactionEntry};

pub const REDACTION_MARKER: &str = "[redacted]";

struct DenyPattern {
    category: RedactionCategory,
    regex: &'static LazyLock<Regex>,
    reason: &'static str,
}

// Assertive diagnostic phrasing. Findings speak in evidence terms
// ("pattern", "consistent with"); "you have X" or "diagnosed with X"
// crosses into diagnosis.
static DIAGNOSTIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(you (?:have|are suffering from)|(?:is|are) diagnosed with|this (?:confirms|proves))\b[^.;\n]*",
    )
    .expect("valid regex")
});

// Common drug names and drug-class phrasing.
static MEDICATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:take|start|begin|prescribe[d]?|switch to)\s+(?:\w+\s+)?(?:metformin|insulin|warfarin|aspirin|ibuprofen|paracetamol|acetaminophen|statins?|antibiotics?|iron supplements?)\b[^.;\n]*",
    )
    .expect("valid regex")
});

// Dosage language: a number with a dose unit, or frequency phrasing.
// Concentration units like mg/dL are lab measurements, not doses;
// matches followed by '/' are filtered out below.
static DOSAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d+(?:\.\d+)?\s?(?:mg|mcg|µg|g|ml|iu|units?)\b(?:\s+(?:once|twice|thrice|\d+\s*times?)\s+(?:daily|a day|per day|weekly))?",
    )
    .expect("valid regex")
});

static DENY_TABLE: [DenyPattern; 3] = [
    DenyPattern {
        category: RedactionCategory::DiagnosticAssertion,
        regex: &DIAGNOSTIC_RE,
        reason: "assertive diagnostic phrasing",
    },
    DenyPattern {
        category: RedactionCategory::MedicationNaming,
        regex: &MEDICATION_RE,
        reason: "medication recommendation",
    },
    DenyPattern {
        category: RedactionCategory::DosageLanguage,
        regex: &DOSAGE_RE,
        reason: "dosage instruction",
    },
];

/// Scan one text field. Returns the sanitized text plus one log entry
/// per match, in pattern-table order then text order.
pub fn scan_field(field: &str, text: &str) -> (String, Vec<RedactionEntry>) {
    let mut sanitized = text.to_string();
    let mut entries = Vec::new();

    for pattern in &DENY_TABLE {
        let ranges: Vec<(usize, usize)> = pattern
            .regex
            .find_iter(&sanitized)
            .filter(|m| !sanitized[m.end()..].starts_with('/'))
            .map(|m| (m.start(), m.end()))
            .collect();

        for &(start, end) in &ranges {
            entries.push(RedactionEntry {
                field: field.to_string(),
                category: pattern.category.clone(),
                matched: sanitized[start..end].to_string(),
                reason: pattern.reason.to_string(),
            });
        }
        // Splice back to front so earlier byte ranges stay valid. The
        // exact matched occurrence is replaced, never an equal
        // substring elsewhere in the text.
        for &(start, end) in ranges.iter().rev() {
            sanitized.replace_range(start..end, REDACTION_MARKER);
        }
    }

    (sanitized, entries)
}

/// Sanitize every free-text field of an artifact in place, appending
/// to its redaction log. Covers finding labels and cause condition
/// strings; condition identifiers come from external config, which is
/// not trusted to be violation-free.
pub fn apply(artifact: &mut Artifact) {
    let mut log = Vec::new();

    for finding in &mut artifact.findings {
        let (clean, entries) = scan_field(&format!("finding:{}", finding.rule_id), &finding.label);
        finding.label = clean;
        log.extend(entries);
    }

    for set in &mut artifact.causes {
        for cause in &mut set.causes {
            let (clean, entries) =
                scan_field(&format!("cause:{}", set.rule_id), &cause.condition);
            cause.condition = clean;
            log.extend(entries);
        }
    }

    artifact.redactions.extend(log);
}
