//! Reads parcel and footprint `GeoJSON` feature collections into run
//! input records.

use geo::MultiPolygon;
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, GeoJson};
use ios_geometry::GeographicPolygon;
use ios_parcel_models::{FootprintSource, ParcelAttributes};
use ios_pipeline::{FootprintInput, ParcelInput};
use serde_json::Value;
use thiserror::Error;

/// Errors reading an input file or a `--field-map` override.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// The text is not a `GeoJSON` feature collection.
    #[error("{path}: {message}")]
    Parse {
        /// File the text came from.
        path: String,
        /// Description of what went wrong.
        message: String,
    },

    /// An override named a field that does not exist.
    #[error("unknown field '{key}' (expected one of: {})", FieldMap::KEYS.join(", "))]
    UnknownField {
        /// The key as given.
        key: String,
    },

    /// An override was not of the form `key=property`.
    #[error("malformed field mapping '{value}', expected key=property")]
    MalformedOverride {
        /// The override as given.
        value: String,
    },
}

/// Feature property names read for each field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    pub parcel_id: String,
    pub zoning_code: String,
    pub zoning_desc: String,
    /// Land use is read from each of these in turn and joined with spaces.
    pub land_use: Vec<String>,
    pub actual_total_value: String,
    pub actual_land_value: String,
    pub assessed_total_value: String,
    pub lot_size: String,
    pub address: String,
    pub building_id: String,
    pub source: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            parcel_id: "parcel_id".to_string(),
            zoning_code: "zoning_code".to_string(),
            zoning_desc: "zoning_desc".to_string(),
            land_use: vec!["land_use".to_string()],
            actual_total_value: "actual_total_value".to_string(),
            actual_land_value: "actual_land_value".to_string(),
            assessed_total_value: "assessed_total_value".to_string(),
            lot_size: "lot_size".to_string(),
            address: "address".to_string(),
            building_id: "building_id".to_string(),
            source: "source".to_string(),
        }
    }
}

impl FieldMap {
    pub const KEYS: &[&str] = &[
        "parcel_id",
        "zoning_code",
        "zoning_desc",
        "land_use",
        "actual_total_value",
        "actual_land_value",
        "assessed_total_value",
        "lot_size",
        "address",
        "building_id",
        "source",
    ];

    /// Applies `key=property` overrides on top of the defaults.
    ///
    /// `land_use` may be given more than once; the listed properties
    /// replace the default and are read in order.
    ///
    /// # Errors
    ///
    /// Returns a [`FeatureError`] for a malformed override or unknown key.
    pub fn with_overrides(overrides: &[String]) -> Result<Self, FeatureError> {
        let mut map = Self::default();
        let mut land_use_overridden = false;
        for value in overrides {
            let Some((key, property)) = value.split_once('=') else {
                return Err(FeatureError::MalformedOverride {
                    value: value.clone(),
                });
            };
            let property = property.trim();
            if property.is_empty() {
                return Err(FeatureError::MalformedOverride {
                    value: value.clone(),
                });
            }
            let key = key.trim();
            if key == "land_use" {
                if !land_use_overridden {
                    map.land_use.clear();
                    land_use_overridden = true;
                }
                map.land_use.push(property.to_string());
                continue;
            }
            *map.slot(key)? = property.to_string();
        }
        Ok(map)
    }

    fn slot(&mut self, key: &str) -> Result<&mut String, FeatureError> {
        Ok(match key {
            "parcel_id" => &mut self.parcel_id,
            "zoning_code" => &mut self.zoning_code,
            "zoning_desc" => &mut self.zoning_desc,
            "actual_total_value" => &mut self.actual_total_value,
            "actual_land_value" => &mut self.actual_land_value,
            "assessed_total_value" => &mut self.assessed_total_value,
            "lot_size" => &mut self.lot_size,
            "address" => &mut self.address,
            "building_id" => &mut self.building_id,
            "source" => &mut self.source,
            _ => {
                return Err(FeatureError::UnknownField {
                    key: key.to_string(),
                });
            }
        })
    }
}

/// Parses a feature collection.
///
/// # Errors
///
/// Returns [`FeatureError::Parse`] if `text` is not a `GeoJSON` feature
/// collection.
pub fn read_collection(path: &str, text: &str) -> Result<FeatureCollection, FeatureError> {
    let parse_error = |e: geojson::Error| FeatureError::Parse {
        path: path.to_string(),
        message: e.to_string(),
    };
    let geojson: GeoJson = text.parse().map_err(parse_error)?;
    FeatureCollection::try_from(geojson).map_err(parse_error)
}

/// Converts parcel features. Features without a usable id fall back to
/// the feature id, then to their position in the file.
#[must_use]
pub fn parcels(collection: FeatureCollection, fields: &FieldMap) -> Vec<ParcelInput> {
    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(position, feature)| {
            let id = feature_id(&feature, &fields.parcel_id, position);
            let attributes = ParcelAttributes {
                zoning_code: text_property(&feature, &fields.zoning_code),
                zoning_description: text_property(&feature, &fields.zoning_desc),
                land_use: joined_text(&feature, &fields.land_use),
                actual_total_value: number_property(&feature, &fields.actual_total_value),
                actual_land_value: number_property(&feature, &fields.actual_land_value),
                assessed_total_value: number_property(&feature, &fields.assessed_total_value),
                raw_area: number_property(&feature, &fields.lot_size),
                address: text_property(&feature, &fields.address),
            };
            let boundary = polygon(feature, &id);
            ParcelInput {
                id,
                boundary,
                attributes,
            }
        })
        .collect()
}

/// Converts footprint features.
#[must_use]
pub fn footprints(collection: FeatureCollection, fields: &FieldMap) -> Vec<FootprintInput> {
    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(position, feature)| {
            let id = feature_id(&feature, &fields.building_id, position);
            let source = FootprintSource {
                source: text_property(&feature, &fields.source),
            };
            let polygon = polygon(feature, &id);
            FootprintInput { id, polygon, source }
        })
        .collect()
}

/// Unreadable geometry becomes an empty polygon, which the run excludes
/// and counts.
fn polygon(feature: Feature, id: &str) -> GeographicPolygon {
    let Some(geometry) = feature.geometry else {
        log::warn!("Feature {id} has no geometry; it will be excluded");
        return GeographicPolygon::new(MultiPolygon::new(Vec::new()));
    };
    GeographicPolygon::try_from(geometry).unwrap_or_else(|e| {
        log::warn!("Feature {id}: {e}; it will be excluded");
        GeographicPolygon::new(MultiPolygon::new(Vec::new()))
    })
}

fn feature_id(feature: &Feature, property: &str, position: usize) -> String {
    text_property(feature, property)
        .or_else(|| {
            feature.id.as_ref().map(|id| match id {
                Id::String(s) => s.clone(),
                Id::Number(n) => n.to_string(),
            })
        })
        .unwrap_or_else(|| format!("#{position}"))
}

fn text_property(feature: &Feature, property: &str) -> Option<String> {
    match feature.property(property)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn joined_text(feature: &Feature, properties: &[String]) -> Option<String> {
    let parts = properties
        .iter()
        .filter_map(|property| text_property(feature, property))
        .collect::<Vec<_>>();
    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Assessor exports often carry values as formatted text ("$1,250,000").
fn number_property(feature: &Feature, property: &str) -> Option<f64> {
    let value = match feature.property(property)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .trim_start_matches('$')
            .replace(',', "")
            .parse::<f64>()
            .ok(),
        _ => None,
    };
    value.filter(|value| value.is_finite())
}
