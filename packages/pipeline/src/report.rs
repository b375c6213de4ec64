//! Audit report assembly and the end-of-run summary log.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ios_parcel_models::{AuditCounters, AuditReport, CompositeSummary, ScoredProperty};
use ios_scoring::config::CriteriaSpec;
use ios_scoring_models::Grade;
use uuid::Uuid;

/// Builds the report for a finished run. Every grade and every configured
/// spec appears in the distributions, including those with a zero count.
#[must_use]
pub fn build_report(
    run_id: Uuid,
    started_at: DateTime<Utc>,
    mut counters: AuditCounters,
    properties: &[ScoredProperty],
    specs: &[CriteriaSpec],
) -> AuditReport {
    let mut grade_distribution: BTreeMap<Grade, u64> =
        Grade::all().iter().map(|grade| (*grade, 0)).collect();
    let mut spec_matches: BTreeMap<String, u64> =
        specs.iter().map(|spec| (spec.name.clone(), 0)).collect();

    for property in properties {
        *grade_distribution.entry(property.grade).or_default() += 1;
        if let Some(spec) = property.classification.spec() {
            *spec_matches.entry(spec.to_string()).or_default() += 1;
        }
        counters.review_flags_raised += property.review_flags.len() as u64;
        if property.metrics.coverage_clamped {
            counters.clamped_coverages += 1;
        }
    }
    counters.parcels_scored = properties.len() as u64;

    let composites = properties.iter().map(|p| p.composite).collect::<Vec<_>>();

    AuditReport {
        run_id,
        started_at,
        counters,
        grade_distribution,
        spec_matches,
        composite_summary: composite_summary(&composites),
    }
}

/// Mean, median, min, and max of `composites`. `None` when empty.
#[must_use]
pub fn composite_summary(composites: &[f64]) -> Option<CompositeSummary> {
    if composites.is_empty() {
        return None;
    }

    let mut sorted = composites.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let median = if n % 2 == 0 {
        f64::midpoint(sorted[n / 2 - 1], sorted[n / 2])
    } else {
        sorted[n / 2]
    };

    #[allow(clippy::cast_precision_loss)]
    let mean = sorted.iter().sum::<f64>() / n as f64;

    Some(CompositeSummary {
        mean,
        median,
        min: sorted[0],
        max: sorted[n - 1],
    })
}

/// Logs the audit summary at `info`.
pub fn log_summary(report: &AuditReport) {
    let c = &report.counters;

    log::info!(
        "Run {} complete: {} of {} parcels scored, {} footprints received",
        report.run_id,
        c.parcels_scored,
        c.parcels_received,
        c.footprints_received,
    );
    log::info!(
        "  Excluded: {} geometries ({} parcels, {} footprints), {} duplicate ids, {} outside study area",
        c.excluded_geometries(),
        c.excluded_parcel_geometries,
        c.excluded_footprint_geometries,
        c.duplicate_parcel_ids,
        c.parcels_outside_study_area,
    );
    log::info!(
        "  Matching: {} orphaned footprints, {} split across parcels, {} slivers ignored",
        c.orphaned_footprints,
        c.multi_parcel_footprints,
        c.sliver_overlaps_ignored,
    );
    log::info!(
        "  Review: {} clamped coverages, {} flags raised",
        c.clamped_coverages,
        c.review_flags_raised,
    );

    let grades = report
        .grade_distribution
        .iter()
        .map(|(grade, count)| format!("{grade}={count}"))
        .collect::<Vec<_>>()
        .join(" ");
    log::info!("  Grades: {grades}");

    for (spec, count) in &report.spec_matches {
        log::info!("  Criteria '{spec}': {count} matches");
    }

    if let Some(summary) = &report.composite_summary {
        log::info!(
            "  Composite: mean {:.1}, median {:.1}, min {:.1}, max {:.1}",
            summary.mean,
            summary.median,
            summary.min,
            summary.max,
        );
    }
}
