//! Immutable R-tree over parcel envelopes.

use geo::Rect;
use ios_geometry::PlanarPolygon;
use rstar::{AABB, RTree, RTreeObject};

/// A parcel envelope stored in the R-tree, keyed by position in the
/// parcel list.
struct ParcelEntry {
    key: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for ParcelEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Spatial index over normalized parcel polygons.
///
/// Built once with [`ParcelIndex::new`] and only read afterwards; there is
/// no way to add or remove parcels. Parcel keys are their positions in the
/// vector passed at construction.
pub struct ParcelIndex {
    parcels: Vec<PlanarPolygon>,
    tree: RTree<ParcelEntry>,
}

impl ParcelIndex {
    /// Bulk-loads the R-tree.
    #[must_use]
    pub fn new(parcels: Vec<PlanarPolygon>) -> Self {
        let entries = parcels
            .iter()
            .enumerate()
            .map(|(key, polygon)| ParcelEntry {
                key,
                envelope: envelope_of(polygon.bounds()),
            })
            .collect::<Vec<_>>();

        let tree = RTree::bulk_load(entries);
        log::debug!("Indexed {} parcels", tree.size());

        Self { parcels, tree }
    }

    /// Keys of parcels whose envelope intersects `bounds`, ascending.
    #[must_use]
    pub fn candidates(&self, bounds: Rect<f64>) -> Vec<usize> {
        let query_env = envelope_of(bounds);
        let mut keys = self
            .tree
            .locate_in_envelope_intersecting(&query_env)
            .map(|entry| entry.key)
            .collect::<Vec<_>>();
        keys.sort_unstable();
        keys
    }

    #[must_use]
    pub fn get(&self, key: usize) -> Option<&PlanarPolygon> {
        self.parcels.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parcels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parcels.is_empty()
    }
}

fn envelope_of(rect: Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

#[cfg(test)]
pub(crate) mod tests {
    use geo::{LineString, MultiPolygon, Polygon};

    use super::*;

    pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> PlanarPolygon {
        PlanarPolygon::from_projected(MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
            vec![],
        )]))
        .unwrap()
    }

    #[test]
    fn candidates_are_sorted_and_envelope_filtered() {
        let index = ParcelIndex::new(vec![
            rect(200.0, 0.0, 300.0, 100.0),
            rect(0.0, 0.0, 100.0, 100.0),
            rect(100.0, 0.0, 200.0, 100.0),
            rect(0.0, 500.0, 100.0, 600.0),
        ]);
        assert_eq!(index.len(), 4);

        let query = rect(90.0, 10.0, 210.0, 20.0);
        assert_eq!(index.candidates(query.bounds()), vec![0, 1, 2]);

        let far = rect(1_000.0, 1_000.0, 1_010.0, 1_010.0);
        assert!(index.candidates(far.bounds()).is_empty());
    }

    #[test]
    fn get_returns_parcel_by_key() {
        let index = ParcelIndex::new(vec![rect(0.0, 0.0, 10.0, 10.0), rect(0.0, 0.0, 20.0, 20.0)]);
        assert!((index.get(1).unwrap().area_sq_m() - 400.0).abs() < 1e-9);
        assert!(index.get(2).is_none());
    }
}
