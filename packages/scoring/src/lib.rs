#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! IOS suitability scoring.
//!
//! Six independent dimension scorers map a parcel's attributes and derived
//! metrics to 0-100 sub-scores. The [`composite`] module combines them into
//! a weighted composite and grade, and the [`filter`] module classifies the
//! result against named acquisition criteria. All tables are data, loaded
//! from TOML (see [`config`]).

pub mod composite;
pub mod config;
pub mod dimensions;
pub mod filter;

use ios_scoring_models::{Dimension, MatchClassification, ScoreCard};

pub use config::ScoringConfig;

/// Errors in a scoring configuration. Always fatal: nothing is scored
/// with an invalid configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    /// The TOML document could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    Parse {
        /// Parser message.
        message: String,
    },

    /// Weights do not sum to 1.0.
    #[error("Dimension weights sum to {sum}, expected 1.0")]
    WeightSum {
        /// Actual sum.
        sum: f64,
    },

    /// A weight is negative, above 1.0, or not finite.
    #[error("Weight {weight} for {dimension} is outside [0, 1]")]
    WeightOutOfRange {
        /// Offending dimension.
        dimension: Dimension,
        /// Offending weight.
        weight: f64,
    },

    /// A scoring table is malformed.
    #[error("Invalid {table} table: {message}")]
    InvalidTable {
        /// Table name.
        table: String,
        /// Description of what is wrong.
        message: String,
    },

    /// A criteria spec has an empty or inverted bound.
    #[error("Invalid criteria spec '{spec}': {message}")]
    InvalidCriteria {
        /// Spec name.
        spec: String,
        /// Description of what is wrong.
        message: String,
    },

    /// Two criteria specs share a name.
    #[error("Duplicate criteria spec '{name}'")]
    DuplicateCriteria {
        /// The repeated name.
        name: String,
    },

    /// No criteria spec is configured.
    #[error("At least one criteria spec is required")]
    NoCriteria,

    /// A run-level setting is invalid.
    #[error("Invalid {setting}: {message}")]
    InvalidSetting {
        /// Setting name.
        setting: String,
        /// Description of what is wrong.
        message: String,
    },
}

/// Everything the scorers read about one parcel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoringInput<'a> {
    pub acres: f64,
    /// Coverage ratio in `[0, 1]`.
    pub coverage_ratio: f64,
    pub coverage_clamped: bool,
    pub zoning_code: Option<&'a str>,
    pub zoning_description: Option<&'a str>,
    pub land_use: Option<&'a str>,
    pub building_count: u32,
    /// Mean footprint area of the attributed buildings.
    pub typical_building_sq_ft: Option<f64>,
    /// Distance from the parcel centroid to the logistics hub.
    pub hub_distance_km: f64,
    pub actual_total_value: Option<f64>,
}

/// A validated scoring configuration, ready to score parcels.
///
/// Scoring is pure: the same input always yields the same card.
#[derive(Debug, Clone)]
pub struct Scorer {
    config: ScoringConfig,
}

impl Scorer {
    /// Validates `config` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the configuration is invalid.
    pub fn new(config: ScoringConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        log::debug!(
            "Scoring configuration valid: {} criteria specs ({})",
            config.criteria.len(),
            config
                .criteria
                .iter()
                .map(|spec| spec.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Scores one parcel.
    #[must_use]
    pub fn score(&self, input: &ScoringInput<'_>) -> ScoreCard {
        composite::score_card(&self.config, input)
    }

    /// Evaluates the criteria specs in precedence order.
    #[must_use]
    pub fn classify(&self, card: &ScoreCard, input: &ScoringInput<'_>) -> MatchClassification {
        filter::classify(&self.config.criteria, card.grade, input)
    }
}
