#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parcel and building footprint types, plus the flat scored-property
//! record and audit report produced by a scoring run.
//!
//! These are the only shapes downstream exporters see. Geometry is kept out
//! of this crate; the geometry-bearing input records live next to the code
//! that reprojects them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ios_scoring_models::{DimensionScores, Grade, MatchClassification, ReviewFlag, ScoreCard};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Square feet in one square metre.
pub const SQ_FT_PER_SQ_M: f64 = 10.763_910_416_709_722;

/// Square feet in one acre.
pub const SQ_FT_PER_ACRE: f64 = 43_560.0;

/// Converts square metres to square feet.
#[must_use]
pub const fn sq_m_to_sq_ft(sq_m: f64) -> f64 {
    sq_m * SQ_FT_PER_SQ_M
}

/// Converts square metres to acres.
#[must_use]
pub const fn sq_m_to_acres(sq_m: f64) -> f64 {
    sq_m * SQ_FT_PER_SQ_M / SQ_FT_PER_ACRE
}

/// Assessor and zoning attributes of a parcel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelAttributes {
    /// Jurisdiction zoning code (e.g. "I-2").
    pub zoning_code: Option<String>,
    /// Free-text zoning description.
    pub zoning_description: Option<String>,
    /// Free-text current land use description.
    pub land_use: Option<String>,
    /// Actual (market) total value.
    pub actual_total_value: Option<f64>,
    /// Actual land value.
    pub actual_land_value: Option<f64>,
    /// Assessed total value.
    pub assessed_total_value: Option<f64>,
    /// Area as reported by the source, in source units.
    pub raw_area: Option<f64>,
    /// Site address.
    pub address: Option<String>,
}

/// Provenance of a building footprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootprintSource {
    /// Dataset or agency the footprint came from.
    pub source: Option<String>,
}

/// Geometry-derived metrics of a parcel after matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelMetrics {
    /// Projected parcel area in square metres.
    pub area_sq_m: f64,
    /// Projected parcel area in square feet.
    pub area_sq_ft: f64,
    /// Projected parcel area in acres.
    pub acres: f64,
    /// Footprints attributed to the parcel. A footprint split across
    /// parcels counts toward each of them.
    pub building_count: u32,
    /// Sum of apportioned fractions (a 60/40 split contributes 0.6 here).
    pub building_share: f64,
    /// Sum of apportioned building areas before overlap deduction.
    pub gross_building_sq_ft: f64,
    /// Area counted twice by footprints overlapping each other.
    pub overlap_deduction_sq_ft: f64,
    /// Net building area on the parcel.
    pub aggregate_building_sq_ft: f64,
    /// Largest attributed footprint (full footprint area).
    pub largest_building_sq_ft: Option<f64>,
    /// Mean attributed footprint area (full footprint area).
    pub typical_building_sq_ft: Option<f64>,
    /// Coverage ratio in `[0, 1]`.
    pub coverage_ratio: f64,
    /// Coverage ratio before clamping.
    pub raw_coverage_ratio: f64,
    /// Whether `raw_coverage_ratio` exceeded 1.0.
    pub coverage_clamped: bool,
    /// Distance from the parcel centroid to the logistics hub.
    pub hub_distance_km: f64,
}

/// The terminal record of a scoring run: one parcel with its metrics,
/// scores, grade, and criteria classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredProperty {
    /// Parcel identifier.
    pub parcel_id: String,
    /// Source attributes, unchanged.
    pub attributes: ParcelAttributes,
    /// Geometry-derived metrics.
    pub metrics: ParcelMetrics,
    /// The six sub-scores.
    pub scores: DimensionScores,
    /// Bonus points included in the zoning sub-score.
    pub zoning_bonus: f64,
    /// Weighted composite score.
    pub composite: f64,
    /// Grade of the composite.
    pub grade: Grade,
    /// Tier label of the grade.
    pub tier: String,
    /// Scoring explanations.
    pub notes: Vec<String>,
    /// Conditions flagged for manual review.
    pub review_flags: Vec<ReviewFlag>,
    /// Criteria filter outcome.
    pub classification: MatchClassification,
}

impl ScoredProperty {
    /// The scoring portion of the record.
    #[must_use]
    pub fn score_card(&self) -> ScoreCard {
        ScoreCard {
            scores: self.scores,
            zoning_bonus: self.zoning_bonus,
            composite: self.composite,
            grade: self.grade,
            tier: self.tier.clone(),
            notes: self.notes.clone(),
            review_flags: self.review_flags.clone(),
        }
    }
}

/// Counters surfaced with every run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditCounters {
    /// Parcels received.
    pub parcels_received: u64,
    /// Footprints received.
    pub footprints_received: u64,
    /// Parcel polygons rejected by normalization.
    pub excluded_parcel_geometries: u64,
    /// Footprint polygons rejected by normalization.
    pub excluded_footprint_geometries: u64,
    /// Parcels dropped because their identifier was already seen.
    pub duplicate_parcel_ids: u64,
    /// Parcels whose centroid lies outside the study area.
    pub parcels_outside_study_area: u64,
    /// Footprints overlapping no parcel.
    pub orphaned_footprints: u64,
    /// Footprints apportioned across more than one parcel.
    pub multi_parcel_footprints: u64,
    /// Footprint/parcel overlaps ignored as slivers.
    pub sliver_overlaps_ignored: u64,
    /// Parcels whose coverage ratio was clamped to 1.0.
    pub clamped_coverages: u64,
    /// Review flags raised across all parcels.
    pub review_flags_raised: u64,
    /// Parcels scored.
    pub parcels_scored: u64,
}

impl AuditCounters {
    /// Total geometries excluded from matching.
    #[must_use]
    pub const fn excluded_geometries(&self) -> u64 {
        self.excluded_parcel_geometries + self.excluded_footprint_geometries
    }
}

/// Summary statistics of the composite scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeSummary {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Everything reported about a run besides the scored records themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    /// Identifier of this run.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Audit counters.
    pub counters: AuditCounters,
    /// Number of scored properties per grade.
    pub grade_distribution: BTreeMap<Grade, u64>,
    /// Number of properties labelled by each criteria spec.
    pub spec_matches: BTreeMap<String, u64>,
    /// Composite statistics, absent when nothing was scored.
    pub composite_summary: Option<CompositeSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acre_conversion() {
        let one_acre_sq_m = SQ_FT_PER_ACRE / SQ_FT_PER_SQ_M;
        assert!((sq_m_to_acres(one_acre_sq_m) - 1.0).abs() < 1e-12);
        assert!((sq_m_to_sq_ft(1.0) - SQ_FT_PER_SQ_M).abs() < 1e-12);
    }

    #[test]
    fn excluded_geometries_sums_both_kinds() {
        let counters = AuditCounters {
            excluded_parcel_geometries: 2,
            excluded_footprint_geometries: 5,
            ..AuditCounters::default()
        };
        assert_eq!(counters.excluded_geometries(), 7);
    }
}
