//! Deviation-band labelling relative to each parameter's own
//! reference range.
//!
//! Bands are a geometric statement about how far the value sits from
//! the range bounds. They are reported alongside the step-function
//! risk scores and never feed into them.

use crate::models::{Parameter, SeverityBand};

use super::types::SeverityLabel;

/// Below-range thresholds, as a fraction of the lower bound.
const VERY_SEVERE_LOW_RATIO: f64 = 0.5;
const SEVERE_LOW_RATIO: f64 = 0.7;
/// Above-range thresholds, as a multiple of the upper bound.
const SEVERE_HIGH_RATIO: f64 = 1.5;
const VERY_SEVERE_HIGH_RATIO: f64 = 2.0;
/// In-range values within this fraction of the span of either bound
/// are borderline.
const BORDERLINE_FRACTION: f64 = 0.05;

/// Band for one value against an ascending (min, max) range.
pub fn classify(value: f64, min: f64, max: f64) -> SeverityBand {
    if value < min {
        // A non-positive lower bound makes the ratio meaningless;
        // any deviation below it is just Low.
        if min <= 0.0 {
            return SeverityBand::Low;
        }
        let ratio = value / min;
        if ratio < VERY_SEVERE_LOW_RATIO {
            SeverityBand::VerySevereLow
        } else if ratio < SEVERE_LOW_RATIO {
            SeverityBand::SevereLow
        } else {
            SeverityBand::Low
        }
    } else if value >= max {
        let ratio = if max > 0.0 { value / max } else { f64::INFINITY };
        if ratio >= VERY_SEVERE_HIGH_RATIO {
            SeverityBand::VerySevereHigh
        } else if ratio >= SEVERE_HIGH_RATIO {
            SeverityBand::SevereHigh
        } else {
            SeverityBand::High
        }
    } else {
        let margin = (max - min) * BORDERLINE_FRACTION;
        if value < min + margin {
            SeverityBand::BorderlineLow
        } else if value > max - margin {
            SeverityBand::BorderlineHigh
        } else {
            SeverityBand::Normal
        }
    }
}

/// Label every parameter that carries a reference range. Parameters
/// without a range cannot be banded and are skipped.
pub fn label_parameters(params: &[Parameter]) -> Vec<SeverityLabel> {
    params
        .iter()
        .filter_map(|p| {
            let range = p.range.as_ref()?;
            let band = classify(p.value, range.min, range.max);
            let distance = if p.value < range.min {
                p.value - range.min
            } else if p.value >= range.max {
                p.value - range.max
            } else {
                0.0
            };
            Some(SeverityLabel {
                parameter: p.name.clone(),
                band,
                distance,
            })
        })
        .collect()
}
