//! Geographic and planar polygon newtypes, plus topology repair.

use geo::{
    Area, BooleanOps, BoundingRect, Centroid, Coord, Intersects, LineString, MultiPolygon,
    Polygon, Rect, Validation,
};

use crate::{GeometryError, Projector};

/// A polygon (or multi-polygon) in WGS84 lon/lat degrees.
///
/// Exposes no area or intersection operations: degree-valued
/// coordinates must be projected first, via [`crate::Normalizer`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeographicPolygon(MultiPolygon<f64>);

impl GeographicPolygon {
    #[must_use]
    pub const fn new(polygon: MultiPolygon<f64>) -> Self {
        Self(polygon)
    }

    /// Wraps a single polygon.
    #[must_use]
    pub fn from_polygon(polygon: Polygon<f64>) -> Self {
        Self(MultiPolygon::new(vec![polygon]))
    }

    /// Builds a polygon from a single exterior ring of `(lon, lat)` pairs.
    #[must_use]
    pub fn from_exterior(ring: &[(f64, f64)]) -> Self {
        let coords = ring.iter().map(|&(x, y)| Coord { x, y }).collect::<Vec<_>>();
        Self::from_polygon(Polygon::new(LineString::new(coords), vec![]))
    }

    /// Number of member polygons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.0.is_empty()
    }

    /// Projects every vertex, validating that each is a finite lon/lat
    /// position. The result is in target units but not yet repaired.
    pub(crate) fn project(&self, projector: &Projector) -> Result<MultiPolygon<f64>, GeometryError> {
        if self.is_empty() {
            return Err(GeometryError::Degenerate);
        }

        let project_ring = |ring: &LineString<f64>| -> Result<LineString<f64>, GeometryError> {
            ring.coords()
                .map(|c| {
                    check_geographic(*c)?;
                    projector.project(c.x, c.y)
                })
                .collect::<Result<Vec<_>, _>>()
                .map(LineString::new)
        };

        let mut projected = Vec::with_capacity(self.len());
        for polygon in &self.0 {
            let exterior = project_ring(polygon.exterior())?;
            let interiors = polygon
                .interiors()
                .iter()
                .map(&project_ring)
                .collect::<Result<Vec<_>, _>>()?;
            projected.push(Polygon::new(exterior, interiors));
        }

        Ok(MultiPolygon::new(projected))
    }
}

/// Rejects non-finite and out-of-range lon/lat positions.
pub(crate) fn check_geographic(coord: Coord<f64>) -> Result<(), GeometryError> {
    if !coord.x.is_finite() || !coord.y.is_finite() {
        return Err(GeometryError::NonFinite);
    }
    if !(-180.0..=180.0).contains(&coord.x) || !(-90.0..=90.0).contains(&coord.y) {
        return Err(GeometryError::NotGeographic {
            x: coord.x,
            y: coord.y,
        });
    }
    Ok(())
}

/// A valid polygon with positive area in planar (metre) coordinates.
///
/// Construction always goes through repair, so every value of this type
/// satisfies [`Validation::is_valid`] and has `area_sq_m() > 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarPolygon {
    polygon: MultiPolygon<f64>,
    area_sq_m: f64,
    bounds: Rect<f64>,
    centroid: Coord<f64>,
}

impl PlanarPolygon {
    /// Repairs a polygon whose coordinates are already in the planar
    /// projection.
    ///
    /// # Errors
    ///
    /// * [`GeometryError::NonFinite`] if any coordinate is NaN or infinite
    /// * [`GeometryError::Degenerate`] if no ring with positive area remains
    /// * [`GeometryError::Unrepairable`] if the polygon is still invalid
    ///   after re-noding
    pub fn from_projected(polygon: MultiPolygon<f64>) -> Result<Self, GeometryError> {
        if polygon
            .iter()
            .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
            .flat_map(|ring| ring.coords())
            .any(|c| !c.x.is_finite() || !c.y.is_finite())
        {
            return Err(GeometryError::NonFinite);
        }

        let cleaned = MultiPolygon::new(polygon.into_iter().filter_map(clean_polygon).collect());
        if cleaned.0.is_empty() {
            return Err(GeometryError::Degenerate);
        }

        let repaired = if cleaned.is_valid() {
            cleaned
        } else {
            log::trace!("re-noding invalid polygon with {} parts", cleaned.0.len());
            renode(&cleaned)
        };

        let area_sq_m = repaired.unsigned_area();
        if repaired.0.is_empty() || area_sq_m.is_nan() || area_sq_m <= 0.0 {
            return Err(GeometryError::Degenerate);
        }
        if !repaired.is_valid() {
            return Err(GeometryError::Unrepairable);
        }

        let bounds = repaired.bounding_rect().ok_or(GeometryError::Degenerate)?;
        let centroid = repaired
            .centroid()
            .ok_or(GeometryError::Degenerate)?
            .0;

        Ok(Self {
            polygon: repaired,
            area_sq_m,
            bounds,
            centroid,
        })
    }

    /// Area in square metres.
    #[must_use]
    pub const fn area_sq_m(&self) -> f64 {
        self.area_sq_m
    }

    /// Axis-aligned bounding rectangle.
    #[must_use]
    pub const fn bounds(&self) -> Rect<f64> {
        self.bounds
    }

    /// Area-weighted centroid.
    #[must_use]
    pub const fn centroid(&self) -> Coord<f64> {
        self.centroid
    }

    /// The repaired geometry.
    #[must_use]
    pub const fn geometry(&self) -> &MultiPolygon<f64> {
        &self.polygon
    }

    /// Exact intersection with another planar polygon. Empty when the
    /// bounding rectangles are disjoint.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> MultiPolygon<f64> {
        if !self.bounds.intersects(&other.bounds) {
            return MultiPolygon::new(vec![]);
        }
        self.polygon.intersection(&other.polygon)
    }

    /// Area of [`Self::intersection`] in square metres.
    #[must_use]
    pub fn intersection_area(&self, other: &Self) -> f64 {
        self.intersection(other).unsigned_area()
    }
}

/// Area of the union of planar pieces, in square metres.
///
/// Callers pass intersection results of [`PlanarPolygon`]s, so the pieces
/// are already planar.
#[must_use]
pub fn union_area(pieces: &[MultiPolygon<f64>]) -> f64 {
    match pieces {
        [] => 0.0,
        [single] => single.unsigned_area(),
        [first, rest @ ..] => rest
            .iter()
            .fold(first.clone(), |acc, piece| acc.union(piece))
            .unsigned_area(),
    }
}

/// Resolves self-intersections and overlapping members by unioning each
/// member polygon into an accumulator.
fn renode(polygon: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    polygon
        .iter()
        .fold(MultiPolygon::new(vec![]), |acc, member| {
            acc.union(&MultiPolygon::new(vec![member.clone()]))
        })
}

fn clean_polygon(polygon: Polygon<f64>) -> Option<Polygon<f64>> {
    let (exterior, interiors) = polygon.into_inner();
    let exterior = clean_ring(exterior)?;
    let interiors = interiors.into_iter().filter_map(clean_ring).collect();
    Some(Polygon::new(exterior, interiors))
}

/// Drops consecutive repeated vertices and closes the ring. Rings with
/// fewer than four coordinates after closing are degenerate.
fn clean_ring(ring: LineString<f64>) -> Option<LineString<f64>> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len() + 1);
    for coord in ring {
        if coords.last() != Some(&coord) {
            coords.push(coord);
        }
    }

    if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
        if first != last {
            coords.push(first);
        }
    }

    (coords.len() >= 4).then(|| LineString::new(coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_PROJECTION, Normalizer};

    fn square(x0: f64, y0: f64, side: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + side, y0),
                (x0 + side, y0 + side),
                (x0, y0 + side),
                (x0, y0),
            ]),
            vec![],
        )])
    }

    #[test]
    fn valid_square_passes_through() {
        let planar = PlanarPolygon::from_projected(square(0.0, 0.0, 10.0)).unwrap();
        assert!((planar.area_sq_m() - 100.0).abs() < 1e-9);
        assert!((planar.centroid().x - 5.0).abs() < 1e-9);
        assert!((planar.bounds().max().y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn unclosed_ring_with_repeats_is_repaired() {
        let ring = LineString::from(vec![
            (0.0, 0.0),
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (10.0, 10.0),
            (0.0, 10.0),
        ]);
        let planar = PlanarPolygon::from_projected(MultiPolygon::new(vec![Polygon::new(
            ring,
            vec![],
        )]))
        .unwrap();
        assert!((planar.area_sq_m() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn bowtie_is_renoded_into_two_triangles() {
        let bowtie = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0), (0.0, 0.0)]),
            vec![],
        )]);
        assert!(!bowtie.is_valid());

        let planar = PlanarPolygon::from_projected(bowtie).unwrap();
        assert!(planar.geometry().is_valid());
        assert!(
            (planar.area_sq_m() - 2.0).abs() < 1e-9,
            "area = {}",
            planar.area_sq_m()
        );
    }

    #[test]
    fn overlapping_members_are_merged() {
        let mut both = square(0.0, 0.0, 10.0);
        both.0.extend(square(5.0, 0.0, 10.0));
        let planar = PlanarPolygon::from_projected(both).unwrap();
        assert!((planar.area_sq_m() - 150.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_rings_are_rejected() {
        let line = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            vec![],
        )]);
        assert_eq!(
            PlanarPolygon::from_projected(line),
            Err(GeometryError::Degenerate)
        );

        let collinear = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 0.0)]),
            vec![],
        )]);
        assert_eq!(
            PlanarPolygon::from_projected(collinear),
            Err(GeometryError::Degenerate)
        );

        assert_eq!(
            PlanarPolygon::from_projected(MultiPolygon::new(vec![])),
            Err(GeometryError::Degenerate)
        );
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let mut bad = square(0.0, 0.0, 10.0);
        bad.0[0].exterior_mut(|ring| ring.0[1].x = f64::NAN);
        assert_eq!(PlanarPolygon::from_projected(bad), Err(GeometryError::NonFinite));
    }

    #[test]
    fn intersection_of_disjoint_bounds_is_empty() {
        let a = PlanarPolygon::from_projected(square(0.0, 0.0, 10.0)).unwrap();
        let b = PlanarPolygon::from_projected(square(100.0, 100.0, 10.0)).unwrap();
        assert!(a.intersection(&b).0.is_empty());
        assert!(a.intersection_area(&b).abs() < f64::EPSILON);
    }

    #[test]
    fn intersection_area_of_half_overlap() {
        let a = PlanarPolygon::from_projected(square(0.0, 0.0, 10.0)).unwrap();
        let b = PlanarPolygon::from_projected(square(5.0, 0.0, 10.0)).unwrap();
        assert!((a.intersection_area(&b) - 50.0).abs() < 1e-6);
    }

    #[test]
    fn union_area_removes_double_counting() {
        let pieces = vec![square(0.0, 0.0, 10.0), square(5.0, 0.0, 10.0)];
        assert!((union_area(&pieces) - 150.0).abs() < 1e-6);
        assert!(union_area(&[]).abs() < f64::EPSILON);
    }

    #[test]
    fn geographic_square_has_expected_projected_area() {
        let normalizer = Normalizer::new(DEFAULT_PROJECTION).unwrap();
        let polygon = GeographicPolygon::from_exterior(&[
            (-104.9081, 39.8200),
            (-104.9071, 39.8200),
            (-104.9071, 39.8210),
            (-104.9081, 39.8210),
            (-104.9081, 39.8200),
        ]);
        let planar = normalizer.normalize(&polygon).unwrap();
        // 0.001 deg lat ~ 111.0 m; 0.001 deg lon ~ 85.5 m at 39.8N.
        let expected = 111.0 * 85.5;
        let relative = (planar.area_sq_m() - expected).abs() / expected;
        assert!(relative < 0.02, "area = {}", planar.area_sq_m());
    }

    #[test]
    fn out_of_range_coordinates_are_not_geographic() {
        let normalizer = Normalizer::new(DEFAULT_PROJECTION).unwrap();
        let projected_metres = GeographicPolygon::from_exterior(&[
            (500_000.0, 4_400_000.0),
            (500_100.0, 4_400_000.0),
            (500_100.0, 4_400_100.0),
            (500_000.0, 4_400_000.0),
        ]);
        assert!(matches!(
            normalizer.normalize(&projected_metres),
            Err(GeometryError::NotGeographic { .. })
        ));
    }
}
