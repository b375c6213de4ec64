//! Geographic to planar projection backed by `proj4rs`.

use geo::Coord;
use proj4rs::Proj;

use crate::GeometryError;

/// Lambert azimuthal equal-area, centred on the Commerce City industrial
/// corridor (Adams County, CO). Metres.
pub const DEFAULT_PROJECTION: &str =
    "+proj=laea +lat_0=39.82026 +lon_0=-104.90811 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs";

const GEOGRAPHIC: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Transforms WGS84 lon/lat degrees into a planar target projection.
pub struct Projector {
    source: Proj,
    target: Proj,
    definition: String,
}

impl Projector {
    /// Builds a projector for the given PROJ.4 target definition.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Projection`] if either definition fails to
    /// parse, or if the target is itself geographic.
    pub fn new(target_definition: &str) -> Result<Self, GeometryError> {
        if target_definition.contains("+proj=longlat") || target_definition.contains("+proj=latlong")
        {
            return Err(GeometryError::Projection {
                message: format!("target projection must be planar, got '{target_definition}'"),
            });
        }

        let source = Proj::from_proj_string(GEOGRAPHIC).map_err(|e| GeometryError::Projection {
            message: format!("failed to build geographic projection: {e:?}"),
        })?;
        let target =
            Proj::from_proj_string(target_definition).map_err(|e| GeometryError::Projection {
                message: format!("failed to build projection '{target_definition}': {e:?}"),
            })?;

        Ok(Self {
            source,
            target,
            definition: target_definition.to_string(),
        })
    }

    /// Projects one lon/lat position (degrees) into target coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Projection`] if the transformation fails or
    /// yields a non-finite coordinate.
    pub fn project(&self, lon: f64, lat: f64) -> Result<Coord<f64>, GeometryError> {
        // proj4rs works in radians for geographic coordinates.
        let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
        proj4rs::transform::transform(&self.source, &self.target, &mut point).map_err(|e| {
            GeometryError::Projection {
                message: format!("failed to project ({lon}, {lat}): {e:?}"),
            }
        })?;

        if !point.0.is_finite() || !point.1.is_finite() {
            return Err(GeometryError::Projection {
                message: format!("projection of ({lon}, {lat}) is not finite"),
            });
        }

        Ok(Coord {
            x: point.0,
            y: point.1,
        })
    }

    /// The target projection definition.
    #[must_use]
    pub fn definition(&self) -> &str {
        &self.definition
    }
}
