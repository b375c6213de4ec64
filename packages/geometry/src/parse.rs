//! `GeoJSON` geometry parsing into [`GeographicPolygon`].

use crate::{GeographicPolygon, GeometryError};

impl TryFrom<geojson::Geometry> for GeographicPolygon {
    type Error = GeometryError;

    /// Accepts `Polygon` and `MultiPolygon` geometries. Everything else is
    /// [`GeometryError::UnsupportedGeometry`].
    fn try_from(geometry: geojson::Geometry) -> Result<Self, Self::Error> {
        let geo_geom: geo::Geometry<f64> =
            geometry
                .try_into()
                .map_err(|e: geojson::Error| GeometryError::UnsupportedGeometry {
                    message: e.to_string(),
                })?;

        match geo_geom {
            geo::Geometry::MultiPolygon(mp) => Ok(Self::new(mp)),
            geo::Geometry::Polygon(p) => Ok(Self::from_polygon(p)),
            other => Err(GeometryError::UnsupportedGeometry {
                message: format!("expected Polygon or MultiPolygon, got {}", kind(&other)),
            }),
        }
    }
}

const fn kind(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::LineString(_) | geo::Geometry::Line(_) => "LineString",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        _ => "non-polygon geometry",
    }
}

#[cfg(test)]
mod tests {
    use geojson::GeoJson;

    use super::*;

    fn geometry(text: &str) -> geojson::Geometry {
        match text.parse::<GeoJson>().unwrap() {
            GeoJson::Geometry(geometry) => geometry,
            other => panic!("expected a bare geometry, got {other:?}"),
        }
    }

    #[test]
    fn converts_polygon_geometry() {
        let polygon = GeographicPolygon::try_from(geometry(
            r#"{"type":"Polygon","coordinates":[[[-104.9,39.8],[-104.89,39.8],[-104.89,39.81],[-104.9,39.8]]]}"#,
        ))
        .unwrap();
        assert_eq!(polygon.len(), 1);
    }

    #[test]
    fn converts_multipolygon_geometry() {
        let polygon = GeographicPolygon::try_from(geometry(
            r#"{"type":"MultiPolygon","coordinates":[
                [[[-104.9,39.8],[-104.89,39.8],[-104.89,39.81],[-104.9,39.8]]],
                [[[-104.8,39.8],[-104.79,39.8],[-104.79,39.81],[-104.8,39.8]]]
            ]}"#,
        ))
        .unwrap();
        assert_eq!(polygon.len(), 2);
    }

    #[test]
    fn rejects_points() {
        let result = GeographicPolygon::try_from(geometry(
            r#"{"type":"Point","coordinates":[-104.9,39.8]}"#,
        ));
        match result {
            Err(GeometryError::UnsupportedGeometry { message }) => {
                assert!(message.contains("Point"), "message: {message}");
            }
            other => panic!("expected UnsupportedGeometry, got {other:?}"),
        }
    }
}
