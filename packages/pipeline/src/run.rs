//! The scoring run: normalize, match, measure coverage, score, classify.

use std::collections::BTreeSet;

use chrono::Utc;
use geo::Coord;
use ios_geometry::{Normalizer, PlanarPolygon};
use ios_parcel_models::{
    AuditCounters, AuditReport, ParcelAttributes, ParcelMetrics, ScoredProperty, sq_m_to_acres,
    sq_m_to_sq_ft,
};
use ios_scoring::{Scorer, ScoringInput};
use ios_spatial::{
    Attribution, ParcelIndex, attributions_by_parcel, compute_coverage, match_footprints,
};
use rayon::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::config::RunConfig;
use crate::input::{FootprintInput, ParcelInput, RunInput};
use crate::progress::ProgressCallback;
use crate::report::{build_report, log_summary};
use crate::PipelineError;

/// Scored properties, highest composite first, and the audit report.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub report: AuditReport,
    pub properties: Vec<ScoredProperty>,
}

impl RunOutput {
    /// Properties that matched an acquisition spec, in output order.
    pub fn filtered(&self) -> impl Iterator<Item = &ScoredProperty> {
        self.properties
            .iter()
            .filter(|property| property.classification.is_matched())
    }
}

/// A parcel that survived normalization and the study-area check.
struct KeptParcel {
    id: String,
    attributes: ParcelAttributes,
    polygon: PlanarPolygon,
}

/// Runs every stage over `input`.
///
/// Configuration is validated first; an invalid configuration aborts
/// before any geometry is touched. Problems with individual records are
/// logged, counted in the report, and never abort the run.
///
/// # Errors
///
/// * [`PipelineError::Configuration`] if `config` fails validation
/// * [`PipelineError::Geometry`] if the projection cannot be built or a
///   configured position cannot be projected
pub fn run(
    config: &RunConfig,
    input: RunInput,
    progress: &dyn ProgressCallback,
) -> Result<RunOutput, PipelineError> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();

    config.validate()?;
    let scorer = Scorer::new(config.scoring.clone())?;
    let normalizer = Normalizer::new(&config.geometry.projection)?;
    let study_center =
        normalizer.project_point(config.study_area.center_lon, config.study_area.center_lat)?;
    let hub = normalizer.project_point(config.hub.lon, config.hub.lat)?;
    let radius_m = config.study_area.radius_km * 1000.0;
    log::debug!("Projecting into {}", normalizer.definition());

    let RunInput { parcels, footprints } = input;
    let mut counters = AuditCounters {
        parcels_received: parcels.len() as u64,
        footprints_received: footprints.len() as u64,
        ..AuditCounters::default()
    };

    log::info!(
        "Starting run {run_id}: {} parcels, {} footprints, study area '{}' ({} km)",
        parcels.len(),
        footprints.len(),
        config.study_area.name,
        config.study_area.radius_km,
    );

    // ── Normalize ────────────────────────────────────────────────────

    let parcels = dedupe_parcels(parcels, &mut counters);

    progress.start_stage("Normalizing parcels", parcels.len() as u64);
    let mut kept = Vec::with_capacity(parcels.len());
    for parcel in parcels {
        progress.inc(1);
        let polygon = match normalizer.normalize(&parcel.boundary) {
            Ok(polygon) => polygon,
            Err(e) => {
                log::warn!("Excluding parcel {}: {e}", parcel.id);
                counters.excluded_parcel_geometries += 1;
                continue;
            }
        };
        if distance(polygon.centroid(), study_center) > radius_m {
            log::debug!("Parcel {} lies outside the study area", parcel.id);
            counters.parcels_outside_study_area += 1;
            continue;
        }
        kept.push(KeptParcel {
            id: parcel.id,
            attributes: parcel.attributes,
            polygon,
        });
    }
    kept.sort_by(|a, b| a.id.cmp(&b.id));

    let footprints = normalize_footprints(&normalizer, footprints, &mut counters, progress);

    // ── Match ────────────────────────────────────────────────────────

    let (records, parcel_polygons): (Vec<_>, Vec<_>) = kept
        .into_iter()
        .map(|parcel| ((parcel.id, parcel.attributes), parcel.polygon))
        .unzip();
    let index = ParcelIndex::new(parcel_polygons);
    let (footprint_ids, footprint_polygons): (Vec<_>, Vec<_>) = footprints.into_iter().unzip();

    progress.start_stage("Matching footprints", footprint_polygons.len() as u64);
    let matches = match_footprints(&index, &footprint_polygons, &config.matching);
    progress.set_position(matches.len() as u64);

    for matched in &matches {
        if matched.is_orphaned() {
            log::debug!(
                "Footprint {} overlaps no parcel",
                footprint_ids[matched.footprint]
            );
            counters.orphaned_footprints += 1;
        } else if matched.is_split() {
            counters.multi_parcel_footprints += 1;
        }
        counters.sliver_overlaps_ignored += matched.slivers;
    }

    // ── Score ────────────────────────────────────────────────────────

    let attributions = attributions_by_parcel(&matches, index.len());

    progress.start_stage("Scoring parcels", records.len() as u64);
    let mut properties = records
        .into_par_iter()
        .zip(attributions.into_par_iter())
        .enumerate()
        .filter_map(|(key, ((id, attributes), attributed))| {
            let parcel = index.get(key)?;
            let property = score_parcel(&scorer, id, attributes, parcel, &attributed, hub);
            progress.inc(1);
            Some(property)
        })
        .collect::<Vec<_>>();

    properties.sort_by(|a, b| {
        b.composite
            .total_cmp(&a.composite)
            .then_with(|| a.parcel_id.cmp(&b.parcel_id))
    });

    let report = build_report(
        run_id,
        started_at,
        counters,
        &properties,
        &scorer.config().criteria,
    );
    progress.finish(format!(
        "Scored {} parcels",
        report.counters.parcels_scored
    ));
    log_summary(&report);

    Ok(RunOutput { report, properties })
}

/// Keeps the first parcel seen for each id.
fn dedupe_parcels(parcels: Vec<ParcelInput>, counters: &mut AuditCounters) -> Vec<ParcelInput> {
    let mut seen = BTreeSet::new();
    parcels
        .into_iter()
        .filter(|parcel| {
            if seen.insert(parcel.id.clone()) {
                true
            } else {
                log::warn!("Dropping duplicate parcel id {}", parcel.id);
                counters.duplicate_parcel_ids += 1;
                false
            }
        })
        .collect()
}

/// Normalizes footprints, sorted by id so matching never depends on
/// delivery order.
fn normalize_footprints(
    normalizer: &Normalizer,
    footprints: Vec<FootprintInput>,
    counters: &mut AuditCounters,
    progress: &dyn ProgressCallback,
) -> Vec<(String, PlanarPolygon)> {
    progress.start_stage("Normalizing footprints", footprints.len() as u64);

    let mut normalized = Vec::with_capacity(footprints.len());
    for footprint in footprints {
        progress.inc(1);
        match normalizer.normalize(&footprint.polygon) {
            Ok(polygon) => normalized.push((footprint.id, polygon)),
            Err(e) => {
                log::warn!("Excluding footprint {}: {e}", footprint.id);
                counters.excluded_footprint_geometries += 1;
            }
        }
    }
    normalized.sort_by(|a, b| a.0.cmp(&b.0));
    normalized
}

fn score_parcel(
    scorer: &Scorer,
    parcel_id: String,
    attributes: ParcelAttributes,
    parcel: &PlanarPolygon,
    attributed: &[Attribution<'_>],
    hub: Coord<f64>,
) -> ScoredProperty {
    let area_sq_m = parcel.area_sq_m();
    let coverage = compute_coverage(area_sq_m, attributed);

    if coverage.clamped {
        log::warn!(
            "Parcel {parcel_id}: building area exceeds parcel area (raw coverage {:.3}), clamped to 1.0",
            coverage.raw_ratio
        );
    }

    let metrics = ParcelMetrics {
        area_sq_m,
        area_sq_ft: sq_m_to_sq_ft(area_sq_m),
        acres: sq_m_to_acres(area_sq_m),
        building_count: coverage.building_count,
        building_share: coverage.building_share,
        gross_building_sq_ft: sq_m_to_sq_ft(coverage.gross_sq_m),
        overlap_deduction_sq_ft: sq_m_to_sq_ft(coverage.overlap_deduction_sq_m),
        aggregate_building_sq_ft: sq_m_to_sq_ft(coverage.net_sq_m),
        largest_building_sq_ft: coverage.largest_footprint_sq_m.map(sq_m_to_sq_ft),
        typical_building_sq_ft: coverage.typical_footprint_sq_m.map(sq_m_to_sq_ft),
        coverage_ratio: coverage.ratio,
        raw_coverage_ratio: coverage.raw_ratio,
        coverage_clamped: coverage.clamped,
        hub_distance_km: distance(parcel.centroid(), hub) / 1000.0,
    };

    let input = ScoringInput {
        acres: metrics.acres,
        coverage_ratio: metrics.coverage_ratio,
        coverage_clamped: metrics.coverage_clamped,
        zoning_code: attributes.zoning_code.as_deref(),
        zoning_description: attributes.zoning_description.as_deref(),
        land_use: attributes.land_use.as_deref(),
        building_count: metrics.building_count,
        typical_building_sq_ft: metrics.typical_building_sq_ft,
        hub_distance_km: metrics.hub_distance_km,
        actual_total_value: attributes.actual_total_value,
    };
    let card = scorer.score(&input);
    let classification = scorer.classify(&card, &input);

    ScoredProperty {
        parcel_id,
        attributes,
        metrics,
        scores: card.scores,
        zoning_bonus: card.zoning_bonus,
        composite: card.composite,
        grade: card.grade,
        tier: card.tier,
        notes: card.notes,
        review_flags: card.review_flags,
        classification,
    }
}

/// Planar distance in projection units.
fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}
