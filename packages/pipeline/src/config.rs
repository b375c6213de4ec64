//! Run configuration: projection, study area, hub, matching thresholds,
//! and the scoring configuration.
//!
//! Defaults are embedded from `config/run.toml` (run settings) and the
//! scoring crate's embedded tables. Any section left out of an override
//! file keeps its default.

use std::sync::LazyLock;

use ios_geometry::Projector;
use ios_scoring::{ConfigurationError, ScoringConfig};
use ios_spatial::MatchConfig;
use serde::{Deserialize, Serialize};

/// TOML embedded at compile time.
pub const DEFAULT_RUN_TOML: &str = include_str!("../config/run.toml");

/// Largest accepted study-area radius.
pub const MAX_STUDY_AREA_RADIUS_KM: f64 = 50.0;

static DEFAULT_RUN: LazyLock<RunConfig> = LazyLock::new(|| {
    toml::de::from_str(DEFAULT_RUN_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse embedded run config: {e}"))
});

/// Everything a run needs besides its input records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "defaults::geometry")]
    pub geometry: GeometryConfig,
    #[serde(default = "defaults::study_area")]
    pub study_area: StudyArea,
    #[serde(default = "defaults::hub")]
    pub hub: Hub,
    #[serde(default = "defaults::matching")]
    pub matching: MatchConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl Default for RunConfig {
    /// The embedded default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed. It is a compile-time
    /// constant covered by tests.
    fn default() -> Self {
        DEFAULT_RUN.clone()
    }
}

mod defaults {
    use super::{DEFAULT_RUN, GeometryConfig, Hub, MatchConfig, StudyArea};

    pub fn geometry() -> GeometryConfig {
        DEFAULT_RUN.geometry.clone()
    }
    pub fn study_area() -> StudyArea {
        DEFAULT_RUN.study_area.clone()
    }
    pub fn hub() -> Hub {
        DEFAULT_RUN.hub.clone()
    }
    pub fn matching() -> MatchConfig {
        DEFAULT_RUN.matching
    }
}

/// Target projection for area math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// PROJ.4 definition of a planar, equal-area projection in metres.
    pub projection: String,
}

/// Circle outside of which parcels are not scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyArea {
    #[serde(default)]
    pub name: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_km: f64,
}

/// Logistics hub for the location proximity bonus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hub {
    #[serde(default)]
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl RunConfig {
    /// Parses a TOML document. Missing sections take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Parse`] if the TOML is malformed.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigurationError> {
        toml::de::from_str(toml_str).map_err(|e| ConfigurationError::Parse {
            message: e.to_string(),
        })
    }

    /// Serializes the configuration back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Parse`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigurationError> {
        toml::to_string_pretty(self).map_err(|e| ConfigurationError::Parse {
            message: e.to_string(),
        })
    }

    /// Validates run settings, then the scoring configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigurationError`] found.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        Projector::new(&self.geometry.projection).map_err(|e| invalid("geometry.projection", &e))?;

        check_position("study_area", self.study_area.center_lat, self.study_area.center_lon)?;
        let radius = self.study_area.radius_km;
        if !(radius > 0.0 && radius <= MAX_STUDY_AREA_RADIUS_KM) {
            return Err(invalid(
                "study_area.radius_km",
                &format!("{radius} is outside (0, {MAX_STUDY_AREA_RADIUS_KM}]"),
            ));
        }

        check_position("hub", self.hub.lat, self.hub.lon)?;

        let matching = &self.matching;
        if !matching.min_overlap_sq_m.is_finite() || matching.min_overlap_sq_m < 0.0 {
            return Err(invalid(
                "matching.min_overlap_sq_m",
                &format!("{} must be a non-negative area", matching.min_overlap_sq_m),
            ));
        }
        if !(0.0..1.0).contains(&matching.min_overlap_fraction) {
            return Err(invalid(
                "matching.min_overlap_fraction",
                &format!("{} is outside [0, 1)", matching.min_overlap_fraction),
            ));
        }

        self.scoring.validate()
    }
}

fn check_position(setting: &str, lat: f64, lon: f64) -> Result<(), ConfigurationError> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(invalid(
            setting,
            &format!("({lat}, {lon}) is not a lat/lon position"),
        ));
    }
    Ok(())
}

fn invalid(setting: &str, message: &dyn std::fmt::Display) -> ConfigurationError {
    ConfigurationError::InvalidSetting {
        setting: setting.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ios_spatial::ApportionBasis;

    #[test]
    fn embedded_config_parses_and_validates() {
        let config: RunConfig = toml::de::from_str(DEFAULT_RUN_TOML).unwrap();
        config.validate().unwrap();
        assert_eq!(config, RunConfig::default());
        assert!((config.study_area.radius_km - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.matching.apportion_basis, ApportionBasis::Footprint);
        assert_eq!(config.scoring, ScoringConfig::default());
    }

    #[test]
    fn printed_config_round_trips() {
        let printed = RunConfig::default().to_toml().unwrap();
        assert_eq!(RunConfig::from_toml(&printed).unwrap(), RunConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_its_sections() {
        let config = RunConfig::from_toml(
            r#"
            [matching]
            min_overlap_sq_m = 2.5
            apportion_basis = "overlap"

            [scoring.weights]
            size = 0.30
            coverage = 0.30
            zoning = 0.15
            land_use = 0.15
            structural = 0.05
            location = 0.05
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        assert!((config.matching.min_overlap_sq_m - 2.5).abs() < f64::EPSILON);
        assert!((config.matching.min_overlap_fraction - 0.005).abs() < f64::EPSILON);
        assert_eq!(config.matching.apportion_basis, ApportionBasis::Overlap);
        assert_eq!(config.study_area, RunConfig::default().study_area);
        assert_eq!(config.scoring.criteria, ScoringConfig::default().criteria);
    }

    #[test]
    fn geographic_projection_is_rejected() {
        let mut config = RunConfig::default();
        config.geometry.projection = "+proj=longlat +datum=WGS84 +no_defs".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidSetting { setting, .. }) if setting == "geometry.projection"
        ));
    }

    #[test]
    fn bad_run_settings_are_rejected() {
        let mut radius = RunConfig::default();
        radius.study_area.radius_km = 0.0;
        assert!(radius.validate().is_err());

        let mut hub = RunConfig::default();
        hub.hub.lat = 120.0;
        assert!(hub.validate().is_err());

        let mut fraction = RunConfig::default();
        fraction.matching.min_overlap_fraction = 1.5;
        assert!(fraction.validate().is_err());
    }

    #[test]
    fn scoring_errors_surface_through_run_validation() {
        let mut config = RunConfig::default();
        config.scoring.criteria.clear();
        assert_eq!(config.validate(), Err(ConfigurationError::NoCriteria));
    }
}
