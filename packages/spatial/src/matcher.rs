//! Footprint to parcel matching and apportionment.

use geo::{Area, MultiPolygon};
use ios_geometry::PlanarPolygon;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ParcelIndex;

/// Which area a straddling footprint distributes across its parcels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApportionBasis {
    /// The full footprint area, split by overlap share.
    #[default]
    Footprint,
    /// Only the area actually lying within parcels.
    Overlap,
}

/// Sliver thresholds and apportionment basis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Overlaps below this many square metres are slivers.
    pub min_overlap_sq_m: f64,
    /// Overlaps below this share of the footprint's area are slivers.
    pub min_overlap_fraction: f64,
    pub apportion_basis: ApportionBasis,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_overlap_sq_m: 1.0,
            min_overlap_fraction: 0.005,
            apportion_basis: ApportionBasis::default(),
        }
    }
}

/// Share of one footprint attributed to one parcel.
#[derive(Debug, Clone, PartialEq)]
pub struct Apportionment {
    /// Parcel key in the [`ParcelIndex`].
    pub parcel: usize,
    /// Exact footprint/parcel intersection area.
    pub overlap_sq_m: f64,
    /// Building area credited to the parcel.
    pub apportioned_sq_m: f64,
    /// `overlap_sq_m` over the footprint's total qualifying overlap.
    pub fraction: f64,
    /// The footprint clipped to the parcel.
    pub overlap: MultiPolygon<f64>,
}

/// Everything the matcher decided about one footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct FootprintMatch {
    /// Footprint key (position in the matched slice).
    pub footprint: usize,
    /// Full footprint area.
    pub footprint_sq_m: f64,
    /// Qualifying parcels, ascending by parcel key.
    pub apportionments: Vec<Apportionment>,
    /// Overlaps ignored as slivers.
    pub slivers: u64,
}

impl FootprintMatch {
    /// No parcel received any of the footprint.
    #[must_use]
    pub fn is_orphaned(&self) -> bool {
        self.apportionments.is_empty()
    }

    /// The footprint was apportioned across more than one parcel.
    #[must_use]
    pub fn is_split(&self) -> bool {
        self.apportionments.len() > 1
    }

    /// Sum of apportioned areas across all parcels.
    #[must_use]
    pub fn apportioned_total(&self) -> f64 {
        self.apportionments.iter().map(|a| a.apportioned_sq_m).sum()
    }
}

/// Matches one footprint against the index.
///
/// The result depends only on the footprint and the parcels it overlaps,
/// never on the order footprints are processed in.
#[must_use]
pub fn match_footprint(
    index: &ParcelIndex,
    key: usize,
    footprint: &PlanarPolygon,
    config: &MatchConfig,
) -> FootprintMatch {
    let footprint_sq_m = footprint.area_sq_m();
    let min_overlap = config
        .min_overlap_sq_m
        .max(config.min_overlap_fraction * footprint_sq_m);

    let mut slivers = 0;
    let mut overlaps = Vec::new();

    for parcel_key in index.candidates(footprint.bounds()) {
        let Some(parcel) = index.get(parcel_key) else {
            continue;
        };
        let overlap = parcel.intersection(footprint);
        let overlap_sq_m = overlap.unsigned_area();
        if overlap_sq_m <= 0.0 {
            continue;
        }
        if overlap_sq_m < min_overlap {
            slivers += 1;
            continue;
        }
        overlaps.push((parcel_key, overlap, overlap_sq_m));
    }

    let total_overlap: f64 = overlaps.iter().map(|(_, _, area)| area).sum();
    let basis = match config.apportion_basis {
        ApportionBasis::Footprint => footprint_sq_m,
        // Parcels overlapping each other must not inflate the basis.
        ApportionBasis::Overlap => total_overlap.min(footprint_sq_m),
    };

    if overlaps.len() > 1 {
        log::debug!(
            "Footprint {key} straddles {} parcels; apportioning {basis:.1} m2 by overlap",
            overlaps.len()
        );
    }

    let apportionments = overlaps
        .into_iter()
        .map(|(parcel, overlap, overlap_sq_m)| {
            let fraction = overlap_sq_m / total_overlap;
            Apportionment {
                parcel,
                overlap_sq_m,
                apportioned_sq_m: basis * fraction,
                fraction,
                overlap,
            }
        })
        .collect();

    FootprintMatch {
        footprint: key,
        footprint_sq_m,
        apportionments,
        slivers,
    }
}

/// Matches every footprint in parallel. Results are in footprint order.
#[must_use]
pub fn match_footprints(
    index: &ParcelIndex,
    footprints: &[PlanarPolygon],
    config: &MatchConfig,
) -> Vec<FootprintMatch> {
    footprints
        .par_iter()
        .enumerate()
        .map(|(key, footprint)| match_footprint(index, key, footprint, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::tests::rect;

    fn two_parcels() -> ParcelIndex {
        ParcelIndex::new(vec![
            rect(0.0, 0.0, 100.0, 100.0),
            rect(100.0, 0.0, 200.0, 100.0),
        ])
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn footprint_inside_one_parcel_gets_full_area() {
        let index = two_parcels();
        let footprint = rect(10.0, 10.0, 30.0, 20.0);
        let matched = match_footprint(&index, 0, &footprint, &MatchConfig::default());

        assert_eq!(matched.apportionments.len(), 1);
        let only = &matched.apportionments[0];
        assert_eq!(only.parcel, 0);
        assert!(close(only.apportioned_sq_m, 200.0));
        assert!(close(only.apportioned_sq_m, only.overlap_sq_m));
        assert!(close(only.fraction, 1.0));
    }

    #[test]
    fn straddling_footprint_is_split_sixty_forty() {
        let index = two_parcels();
        // 6 m west of the shared edge, 4 m east.
        let footprint = rect(94.0, 0.0, 104.0, 5.0);
        let matched = match_footprint(&index, 0, &footprint, &MatchConfig::default());

        assert!(matched.is_split());
        let [west, east] = matched.apportionments.as_slice() else {
            panic!("expected two apportionments, got {:?}", matched.apportionments);
        };
        assert_eq!((west.parcel, east.parcel), (0, 1));
        assert!(close(west.apportioned_sq_m, 30.0), "west = {}", west.apportioned_sq_m);
        assert!(close(east.apportioned_sq_m, 20.0), "east = {}", east.apportioned_sq_m);
        assert!(close(west.fraction, 0.6));
        assert!(close(east.fraction, 0.4));
        assert!(close(matched.apportioned_total(), footprint.area_sq_m()));
    }

    #[test]
    fn footprint_outside_all_parcels_is_orphaned() {
        let index = two_parcels();
        let footprint = rect(500.0, 500.0, 510.0, 510.0);
        let matched = match_footprint(&index, 3, &footprint, &MatchConfig::default());
        assert!(matched.is_orphaned());
        assert_eq!(matched.footprint, 3);
        assert!(matched.apportioned_total().abs() < f64::EPSILON);
    }

    #[test]
    fn sliver_overlap_is_ignored_and_counted() {
        let index = two_parcels();
        // 2 m2 across the edge: above 1 m2 but below 0.5% of 502 m2.
        let footprint = rect(50.0, 0.0, 100.2, 10.0);
        let matched = match_footprint(&index, 0, &footprint, &MatchConfig::default());

        assert_eq!(matched.slivers, 1);
        assert_eq!(matched.apportionments.len(), 1);
        assert_eq!(matched.apportionments[0].parcel, 0);
        assert!(close(matched.apportioned_total(), footprint.area_sq_m()));
    }

    #[test]
    fn overlap_basis_only_distributes_area_inside_parcels() {
        let index = ParcelIndex::new(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        let footprint = rect(5.0, 0.0, 15.0, 10.0);

        let full = match_footprint(&index, 0, &footprint, &MatchConfig::default());
        assert!(close(full.apportioned_total(), 100.0));

        let config = MatchConfig {
            apportion_basis: ApportionBasis::Overlap,
            ..MatchConfig::default()
        };
        let clipped = match_footprint(&index, 0, &footprint, &config);
        assert!(close(clipped.apportioned_total(), 50.0));
    }

    #[test]
    fn overlap_basis_splits_exactly_the_area_inside_parcels() {
        // 20x20 m footprint over the shared line, half of it below both parcels.
        let index = two_parcels();
        let footprint = rect(90.0, -10.0, 110.0, 10.0);
        let config = MatchConfig {
            apportion_basis: ApportionBasis::Overlap,
            ..MatchConfig::default()
        };
        let matched = match_footprint(&index, 0, &footprint, &config);

        assert!(close(matched.footprint_sq_m, 400.0));
        assert_eq!(matched.apportionments.len(), 2);
        let summed_overlap: f64 = matched.apportionments.iter().map(|a| a.overlap_sq_m).sum();
        assert!(close(summed_overlap, 200.0));
        assert!(close(matched.apportioned_total(), summed_overlap));
        for apportionment in &matched.apportionments {
            assert!(close(apportionment.overlap_sq_m, 100.0));
            assert!(close(apportionment.apportioned_sq_m, apportionment.overlap_sq_m));
            assert!(close(apportionment.fraction, 0.5));
        }
    }

    #[test]
    fn apportioned_area_never_exceeds_footprint_area() {
        let index = ParcelIndex::new(vec![
            rect(0.0, 0.0, 10.0, 10.0),
            rect(10.0, 0.0, 20.0, 10.0),
            rect(0.0, 10.0, 10.0, 20.0),
            rect(10.0, 10.0, 20.0, 20.0),
        ]);
        let footprints = vec![
            rect(5.0, 5.0, 15.0, 15.0),
            rect(2.0, 2.0, 8.0, 18.0),
            rect(-5.0, -5.0, 25.0, 3.0),
        ];
        for basis in [ApportionBasis::Footprint, ApportionBasis::Overlap] {
            let config = MatchConfig {
                apportion_basis: basis,
                ..MatchConfig::default()
            };
            for matched in match_footprints(&index, &footprints, &config) {
                assert!(
                    matched.apportioned_total() <= matched.footprint_sq_m + 1e-6,
                    "{basis:?}: footprint {} apportioned {} of {}",
                    matched.footprint,
                    matched.apportioned_total(),
                    matched.footprint_sq_m
                );
            }
        }
    }

    #[test]
    fn matching_is_independent_of_footprint_order() {
        let index = two_parcels();
        let footprints = vec![
            rect(94.0, 0.0, 104.0, 5.0),
            rect(10.0, 10.0, 30.0, 20.0),
            rect(150.0, 50.0, 170.0, 90.0),
            rect(500.0, 500.0, 510.0, 510.0),
        ];
        let mut reversed = footprints.clone();
        reversed.reverse();

        let config = MatchConfig::default();
        let forward = match_footprints(&index, &footprints, &config);
        let backward = match_footprints(&index, &reversed, &config);

        let last = footprints.len() - 1;
        for (key, matched) in forward.iter().enumerate() {
            let mirror = &backward[last - key];
            assert_eq!(matched.apportionments, mirror.apportionments);
            assert_eq!(matched.slivers, mirror.slivers);
        }
    }
}
