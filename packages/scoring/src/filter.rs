//! Named acquisition criteria.
//!
//! A spec matches only when every bound holds. Specs are tried in
//! configured order and the first match labels the property; a property
//! matching none carries one rejection per spec listing every failed bound.

use ios_scoring_models::{CriteriaFailure, Grade, MatchClassification, SpecRejection};

use crate::ScoringInput;
use crate::config::CriteriaSpec;

/// Every bound of `spec` the property fails. Empty means a match.
#[must_use]
pub fn evaluate(spec: &CriteriaSpec, grade: Grade, input: &ScoringInput<'_>) -> Vec<CriteriaFailure> {
    let mut failures = Vec::new();

    if !spec.grades.contains(&grade) {
        failures.push(CriteriaFailure::Grade { grade });
    }

    let acres = input.acres;
    if acres < spec.min_acres || acres.is_nan() {
        failures.push(CriteriaFailure::AcresBelow {
            acres,
            min: spec.min_acres,
        });
    } else if acres > spec.max_acres {
        failures.push(CriteriaFailure::AcresAbove {
            acres,
            max: spec.max_acres,
        });
    }

    let coverage = input.coverage_ratio;
    if coverage >= spec.max_coverage || coverage.is_nan() {
        failures.push(CriteriaFailure::CoverageTooHigh {
            coverage,
            max: spec.max_coverage,
        });
    }

    match input.actual_total_value.filter(|value| !value.is_nan()) {
        None => failures.push(CriteriaFailure::ValueMissing),
        Some(value) if value < spec.min_value => failures.push(CriteriaFailure::ValueBelow {
            value,
            min: spec.min_value,
        }),
        Some(value) if value > spec.max_value => failures.push(CriteriaFailure::ValueAbove {
            value,
            max: spec.max_value,
        }),
        Some(_) => {}
    }

    failures
}

/// Classifies a property against `specs` in precedence order.
#[must_use]
pub fn classify(
    specs: &[CriteriaSpec],
    grade: Grade,
    input: &ScoringInput<'_>,
) -> MatchClassification {
    let mut reasons = Vec::with_capacity(specs.len());

    for spec in specs {
        let failures = evaluate(spec, grade, input);
        if failures.is_empty() {
            return MatchClassification::Matched {
                spec: spec.name.clone(),
            };
        }
        reasons.push(SpecRejection {
            spec: spec.name.clone(),
            failures,
        });
    }

    MatchClassification::Excluded { reasons }
}
