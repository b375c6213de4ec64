#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reprojection and topology repair of parcel and footprint polygons.
//!
//! Input polygons arrive in geographic lon/lat degrees as
//! [`GeographicPolygon`]. The [`Normalizer`] projects them into a planar,
//! equal-area coordinate system, repairs their topology, and returns
//! [`PlanarPolygon`]s. Only the planar type exposes area and intersection
//! operations, so degree-valued polygons can never reach area math.

mod parse;
pub mod polygon;
pub mod projection;

pub use polygon::{GeographicPolygon, PlanarPolygon, union_area};
pub use projection::{DEFAULT_PROJECTION, Projector};

use geo::Coord;
use thiserror::Error;

/// Errors that can occur while normalizing a polygon.
///
/// Every variant excludes the offending geometry; none of them abort a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A coordinate is outside the valid longitude/latitude range.
    #[error("coordinate ({x}, {y}) is not a geographic lon/lat position")]
    NotGeographic {
        /// Offending x (longitude) value.
        x: f64,
        /// Offending y (latitude) value.
        y: f64,
    },

    /// A coordinate is NaN or infinite.
    #[error("geometry contains a non-finite coordinate")]
    NonFinite,

    /// The geometry is not a polygon or multi-polygon.
    #[error("unsupported geometry: {message}")]
    UnsupportedGeometry {
        /// Description of what was received.
        message: String,
    },

    /// No ring with positive area survived repair.
    #[error("geometry has no area after repair")]
    Degenerate,

    /// Self-intersections could not be resolved.
    #[error("geometry could not be repaired into a valid polygon")]
    Unrepairable,

    /// The projection library rejected a definition or a point.
    #[error("projection error: {message}")]
    Projection {
        /// Description of what went wrong.
        message: String,
    },
}

/// Projects and repairs polygons for area-accurate matching.
///
/// Stateless apart from the projection definitions built at construction.
pub struct Normalizer {
    projector: Projector,
}

impl Normalizer {
    /// Creates a normalizer targeting the given PROJ.4 definition.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Projection`] if the definition is rejected.
    pub fn new(target_definition: &str) -> Result<Self, GeometryError> {
        Ok(Self {
            projector: Projector::new(target_definition)?,
        })
    }

    /// Projects a geographic polygon and repairs it into a valid planar
    /// polygon with positive area.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] if a coordinate is not a finite lon/lat
    /// position, projection fails, or the polygon cannot be repaired.
    pub fn normalize(&self, polygon: &GeographicPolygon) -> Result<PlanarPolygon, GeometryError> {
        let projected = polygon.project(&self.projector)?;
        PlanarPolygon::from_projected(projected)
    }

    /// Projects a single lon/lat position.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] if the position is invalid or projection
    /// fails.
    pub fn project_point(&self, lon: f64, lat: f64) -> Result<Coord<f64>, GeometryError> {
        polygon::check_geographic(Coord { x: lon, y: lat })?;
        self.projector.project(lon, lat)
    }

    /// The target projection definition.
    #[must_use]
    pub fn definition(&self) -> &str {
        self.projector.definition()
    }
}
