//! Per-parcel aggregation of apportioned building area.

use geo::MultiPolygon;
use ios_geometry::union_area;

use crate::{Apportionment, FootprintMatch};

/// One footprint's share of one parcel.
#[derive(Debug, Clone, Copy)]
pub struct Attribution<'a> {
    /// Full area of the footprint.
    pub footprint_sq_m: f64,
    pub apportionment: &'a Apportionment,
}

/// Building coverage of a single parcel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Coverage {
    /// Footprints attributed to the parcel.
    pub building_count: u32,
    /// Sum of apportioned fractions.
    pub building_share: f64,
    /// Sum of apportioned areas.
    pub gross_sq_m: f64,
    /// Area counted more than once by footprints overlapping each other.
    pub overlap_deduction_sq_m: f64,
    /// `gross_sq_m - overlap_deduction_sq_m`.
    pub net_sq_m: f64,
    /// Largest full footprint area.
    pub largest_footprint_sq_m: Option<f64>,
    /// Mean full footprint area.
    pub typical_footprint_sq_m: Option<f64>,
    /// Net building area over parcel area, clamped to `[0, 1]`.
    pub ratio: f64,
    /// Net building area over parcel area before clamping.
    pub raw_ratio: f64,
    /// Whether `raw_ratio` exceeded 1.0.
    pub clamped: bool,
}

/// Groups apportionments by parcel key. Within a parcel, attributions keep
/// footprint order.
#[must_use]
pub fn attributions_by_parcel(
    matches: &[FootprintMatch],
    parcel_count: usize,
) -> Vec<Vec<Attribution<'_>>> {
    let mut by_parcel = vec![Vec::new(); parcel_count];
    for matched in matches {
        for apportionment in &matched.apportionments {
            if let Some(slot) = by_parcel.get_mut(apportionment.parcel) {
                slot.push(Attribution {
                    footprint_sq_m: matched.footprint_sq_m,
                    apportionment,
                });
            }
        }
    }
    by_parcel
}

/// Computes the coverage of a parcel of `parcel_sq_m` from its
/// attributions.
///
/// A parcel with no attributions has zero coverage and no buildings.
#[must_use]
pub fn compute_coverage(parcel_sq_m: f64, attributions: &[Attribution<'_>]) -> Coverage {
    if attributions.is_empty() || parcel_sq_m <= 0.0 {
        return Coverage::default();
    }

    let gross_sq_m: f64 = attributions
        .iter()
        .map(|a| a.apportionment.apportioned_sq_m)
        .sum();
    let building_share: f64 = attributions.iter().map(|a| a.apportionment.fraction).sum();

    // Duplication is measured on the parcel-clipped overlaps and removed
    // from the apportioned gross in the same proportion.
    let overlap_deduction_sq_m = if attributions.len() > 1 {
        let clipped = attributions
            .iter()
            .map(|a| a.apportionment.overlap.clone())
            .collect::<Vec<MultiPolygon<f64>>>();
        let summed: f64 = attributions
            .iter()
            .map(|a| a.apportionment.overlap_sq_m)
            .sum();
        if summed > 0.0 {
            let unique_share = (union_area(&clipped) / summed).clamp(0.0, 1.0);
            gross_sq_m * (1.0 - unique_share)
        } else {
            0.0
        }
    } else {
        0.0
    };

    let net_sq_m = (gross_sq_m - overlap_deduction_sq_m).max(0.0);
    let raw_ratio = net_sq_m / parcel_sq_m;
    let clamped = raw_ratio > 1.0;

    let largest_footprint_sq_m = attributions
        .iter()
        .map(|a| a.footprint_sq_m)
        .max_by(f64::total_cmp);
    #[allow(clippy::cast_precision_loss)]
    let typical_footprint_sq_m = Some(
        attributions.iter().map(|a| a.footprint_sq_m).sum::<f64>() / attributions.len() as f64,
    );

    Coverage {
        building_count: u32::try_from(attributions.len()).unwrap_or(u32::MAX),
        building_share,
        gross_sq_m,
        overlap_deduction_sq_m,
        net_sq_m,
        largest_footprint_sq_m,
        typical_footprint_sq_m,
        ratio: raw_ratio.clamp(0.0, 1.0),
        raw_ratio,
        clamped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::tests::rect;
    use crate::{MatchConfig, ParcelIndex, match_footprints};

    fn coverage_of(
        parcels: Vec<ios_geometry::PlanarPolygon>,
        footprints: &[ios_geometry::PlanarPolygon],
    ) -> Vec<Coverage> {
        let index = ParcelIndex::new(parcels);
        let matches = match_footprints(&index, footprints, &MatchConfig::default());
        let grouped = attributions_by_parcel(&matches, index.len());
        (0..index.len())
            .filter_map(|key| {
                let parcel = index.get(key)?;
                Some(compute_coverage(parcel.area_sq_m(), &grouped[key]))
            })
            .collect()
    }

    #[test]
    fn vacant_parcel_has_zero_coverage() {
        let coverage = coverage_of(vec![rect(0.0, 0.0, 100.0, 100.0)], &[]);
        assert_eq!(coverage[0].building_count, 0);
        assert!(coverage[0].ratio.abs() < f64::EPSILON);
        assert_eq!(coverage[0].typical_footprint_sq_m, None);
        assert!(!coverage[0].clamped);
    }

    #[test]
    fn overlapping_footprints_are_not_double_counted() {
        let coverage = coverage_of(
            vec![rect(0.0, 0.0, 100.0, 100.0)],
            &[rect(0.0, 0.0, 20.0, 10.0), rect(10.0, 0.0, 30.0, 10.0)],
        );
        let parcel = &coverage[0];
        assert_eq!(parcel.building_count, 2);
        assert!((parcel.gross_sq_m - 400.0).abs() < 1e-6);
        assert!((parcel.overlap_deduction_sq_m - 100.0).abs() < 1e-6);
        assert!((parcel.net_sq_m - 300.0).abs() < 1e-6);
        assert!((parcel.ratio - 0.03).abs() < 1e-9);
        assert_eq!(parcel.largest_footprint_sq_m, Some(200.0));
    }

    #[test]
    fn duplicated_footprint_past_the_parcel_edge_counts_once() {
        // The same 10x10 m building digitized twice, 70% inside the parcel.
        let coverage = coverage_of(
            vec![rect(0.0, 0.0, 100.0, 100.0)],
            &[rect(-3.0, 0.0, 7.0, 10.0), rect(-3.0, 0.0, 7.0, 10.0)],
        );
        let parcel = &coverage[0];
        assert_eq!(parcel.building_count, 2);
        assert!((parcel.gross_sq_m - 200.0).abs() < 1e-6, "{}", parcel.gross_sq_m);
        assert!(
            (parcel.overlap_deduction_sq_m - 100.0).abs() < 1e-6,
            "{}",
            parcel.overlap_deduction_sq_m
        );
        assert!((parcel.net_sq_m - 100.0).abs() < 1e-6, "{}", parcel.net_sq_m);
        assert!((parcel.ratio - 0.01).abs() < 1e-9);
    }

    #[test]
    fn split_footprint_counts_toward_both_parcels() {
        let coverage = coverage_of(
            vec![rect(0.0, 0.0, 100.0, 100.0), rect(100.0, 0.0, 200.0, 100.0)],
            &[rect(94.0, 0.0, 104.0, 5.0)],
        );
        assert_eq!(coverage[0].building_count, 1);
        assert_eq!(coverage[1].building_count, 1);
        assert!((coverage[0].building_share - 0.6).abs() < 1e-9);
        assert!((coverage[1].building_share - 0.4).abs() < 1e-9);
        assert!((coverage[0].gross_sq_m + coverage[1].gross_sq_m - 50.0).abs() < 1e-6);
    }

    #[test]
    fn coverage_above_one_is_clamped_and_flagged() {
        // Footprint basis credits all 300 m2 to a 100 m2 parcel.
        let coverage = coverage_of(
            vec![rect(0.0, 0.0, 10.0, 10.0)],
            &[rect(0.0, 0.0, 30.0, 10.0)],
        );
        let parcel = &coverage[0];
        assert!(parcel.clamped);
        assert!((parcel.ratio - 1.0).abs() < f64::EPSILON);
        assert!((parcel.raw_ratio - 3.0).abs() < 1e-6);
    }

    #[test]
    fn ratio_stays_within_unit_interval() {
        let coverage = coverage_of(
            vec![
                rect(0.0, 0.0, 10.0, 10.0),
                rect(10.0, 0.0, 20.0, 10.0),
                rect(0.0, 10.0, 10.0, 20.0),
            ],
            &[
                rect(1.0, 1.0, 19.0, 9.0),
                rect(2.0, 2.0, 8.0, 30.0),
                rect(0.0, 0.0, 10.0, 10.0),
                rect(5.0, 5.0, 6.0, 6.0),
            ],
        );
        for parcel in coverage {
            assert!((0.0..=1.0).contains(&parcel.ratio), "ratio = {}", parcel.ratio);
        }
    }
}
