//! Scoring configuration: weights, declarative score tables, and criteria
//! specs.
//!
//! The default configuration is embedded from `config/default.toml` at
//! compile time. Every top-level section falls back to its embedded default
//! when absent, so an override file only needs the sections it changes.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use ios_scoring_models::{Dimension, Grade};
use serde::{Deserialize, Serialize};

use crate::ConfigurationError;

/// TOML embedded at compile time.
pub const DEFAULT_SCORING_TOML: &str = include_str!("../config/default.toml");

/// Tolerance on the sum of the weights.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

static DEFAULT_CONFIG: LazyLock<ScoringConfig> = LazyLock::new(|| {
    toml::de::from_str(DEFAULT_SCORING_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse embedded scoring config: {e}"))
});

/// Complete scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "defaults::weights")]
    pub weights: Weights,
    #[serde(default = "defaults::size")]
    pub size: SizeConfig,
    #[serde(default = "defaults::coverage")]
    pub coverage: CoverageConfig,
    #[serde(default = "defaults::zoning")]
    pub zoning: ZoningConfig,
    #[serde(default = "defaults::land_use")]
    pub land_use: LandUseConfig,
    #[serde(default = "defaults::structural")]
    pub structural: StructuralConfig,
    #[serde(default = "defaults::location")]
    pub location: LocationConfig,
    /// Named acquisition criteria, in precedence order.
    #[serde(default = "defaults::criteria")]
    pub criteria: Vec<CriteriaSpec>,
}

impl Default for ScoringConfig {
    /// The embedded default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed. It is a compile-time
    /// constant covered by tests.
    fn default() -> Self {
        DEFAULT_CONFIG.clone()
    }
}

/// Field defaults pulled from the embedded configuration.
mod defaults {
    use super::{
        CoverageConfig, CriteriaSpec, DEFAULT_CONFIG, LandUseConfig, LocationConfig, SizeConfig,
        StructuralConfig, Weights, ZoningConfig,
    };

    pub fn weights() -> Weights {
        DEFAULT_CONFIG.weights
    }
    pub fn size() -> SizeConfig {
        DEFAULT_CONFIG.size.clone()
    }
    pub fn coverage() -> CoverageConfig {
        DEFAULT_CONFIG.coverage.clone()
    }
    pub fn zoning() -> ZoningConfig {
        DEFAULT_CONFIG.zoning.clone()
    }
    pub fn land_use() -> LandUseConfig {
        DEFAULT_CONFIG.land_use.clone()
    }
    pub fn structural() -> StructuralConfig {
        DEFAULT_CONFIG.structural.clone()
    }
    pub fn location() -> LocationConfig {
        DEFAULT_CONFIG.location
    }
    pub fn criteria() -> Vec<CriteriaSpec> {
        DEFAULT_CONFIG.criteria.clone()
    }
}

impl ScoringConfig {
    /// Parses a TOML document. Missing sections take their defaults.
    ///
    /// The result is not validated; see [`Self::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Parse`] if the TOML is malformed.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigurationError> {
        toml::de::from_str(toml_str).map_err(|e| ConfigurationError::Parse {
            message: e.to_string(),
        })
    }

    /// Checks every invariant the scorers rely on.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigurationError`] found.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.weights.validate()?;
        self.size.bands.validate("size", true)?;
        self.coverage.validate()?;
        self.zoning.validate()?;
        self.land_use.validate()?;
        self.structural.count_bands.validate("structural.count_bands", true)?;
        self.structural.size_bands.validate("structural.size_bands", true)?;
        self.location.validate()?;
        validate_criteria(&self.criteria)
    }
}

// ── Weights ──────────────────────────────────────────────────────────────

/// Per-dimension weights of the composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub size: f64,
    pub coverage: f64,
    pub zoning: f64,
    pub land_use: f64,
    pub structural: f64,
    pub location: f64,
}

impl Weights {
    #[must_use]
    pub const fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Size => self.size,
            Dimension::Coverage => self.coverage,
            Dimension::Zoning => self.zoning,
            Dimension::LandUse => self.land_use,
            Dimension::Structural => self.structural,
            Dimension::Location => self.location,
        }
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        Dimension::all().iter().map(|d| self.get(*d)).sum()
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        for dimension in Dimension::all() {
            let weight = self.get(*dimension);
            if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
                return Err(ConfigurationError::WeightOutOfRange {
                    dimension: *dimension,
                    weight,
                });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigurationError::WeightSum { sum });
        }
        Ok(())
    }
}

// ── Bands ────────────────────────────────────────────────────────────────

/// One step of a piecewise-constant table.
///
/// Covers `[min, max)`, or `[min, max]` when `max_inclusive` is set. A band
/// without `max` is open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    #[serde(default)]
    pub min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub max_inclusive: bool,
    pub score: f64,
    #[serde(default)]
    pub label: String,
}

impl Band {
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min
            && self
                .max
                .is_none_or(|max| value < max || (self.max_inclusive && value <= max))
    }
}

/// Ordered, contiguous bands. The first band containing a value wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BandTable(pub Vec<Band>);

impl BandTable {
    /// The band containing `value`, if any.
    #[must_use]
    pub fn lookup(&self, value: f64) -> Option<&Band> {
        self.0.iter().find(|band| band.contains(value))
    }

    /// Requires a non-empty, finite, gapless table. With `open_ended` the
    /// last band must have no `max`; otherwise every band must have one.
    fn validate(&self, table: &str, open_ended: bool) -> Result<(), ConfigurationError> {
        let invalid = |message: String| ConfigurationError::InvalidTable {
            table: table.to_string(),
            message,
        };

        let Some(last) = self.0.last() else {
            return Err(invalid("table has no bands".to_string()));
        };

        for (i, band) in self.0.iter().enumerate() {
            if !band.min.is_finite() || !band.score.is_finite() {
                return Err(invalid(format!("band {i} is not finite")));
            }
            match band.max {
                Some(max) if !max.is_finite() || max <= band.min => {
                    return Err(invalid(format!(
                        "band {i} has an empty or inverted range [{}, {max})",
                        band.min
                    )));
                }
                None if i + 1 < self.0.len() => {
                    return Err(invalid(format!("band {i} is open-ended but not last")));
                }
                _ => {}
            }
            if let Some(next) = self.0.get(i + 1)
                && band.max != Some(next.min)
            {
                return Err(invalid(format!(
                    "gap or overlap between band {i} and band {}",
                    i + 1
                )));
            }
        }

        if open_ended && last.max.is_some() {
            return Err(invalid("last band must be open-ended".to_string()));
        }
        if !open_ended && last.max.is_none() {
            return Err(invalid("last band must be bounded".to_string()));
        }
        Ok(())
    }
}

// ── Dimension tables ─────────────────────────────────────────────────────

/// Acreage bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeConfig {
    pub bands: BandTable,
}

/// Coverage percent bands plus the linear high-coverage tail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageConfig {
    pub bands: BandTable,
    pub tail: CoverageTail,
}

impl CoverageConfig {
    fn validate(&self) -> Result<(), ConfigurationError> {
        self.bands.validate("coverage", false)?;
        let tail = &self.tail;
        let invalid = |message: String| ConfigurationError::InvalidTable {
            table: "coverage.tail".to_string(),
            message,
        };
        if self.bands.0.last().and_then(|b| b.max) != Some(tail.start_percent) {
            return Err(invalid(format!(
                "tail must start where the last band ends ({}%)",
                tail.start_percent
            )));
        }
        if !tail.zero_percent.is_finite() || tail.zero_percent <= tail.start_percent {
            return Err(invalid(format!(
                "zero_percent {} must exceed start_percent {}",
                tail.zero_percent, tail.start_percent
            )));
        }
        if !(0.0..=100.0).contains(&tail.start_score) {
            return Err(invalid(format!(
                "start_score {} is outside [0, 100]",
                tail.start_score
            )));
        }
        Ok(())
    }
}

/// Linear decline from `start_score` at `start_percent` to zero at
/// `zero_percent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageTail {
    pub start_percent: f64,
    pub start_score: f64,
    pub zero_percent: f64,
    #[serde(default)]
    pub label: String,
}

/// Exact zoning code rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoningCode {
    pub code: String,
    pub score: f64,
    #[serde(default)]
    pub label: String,
}

/// Zoning code prefix rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoningPrefix {
    pub prefix: String,
    pub score: f64,
    #[serde(default)]
    pub label: String,
}

/// Additive bonus for a keyword in the zoning description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordBonus {
    pub keyword: String,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoningConfig {
    pub default_score: f64,
    #[serde(default)]
    pub codes: Vec<ZoningCode>,
    #[serde(default)]
    pub prefixes: Vec<ZoningPrefix>,
    #[serde(default)]
    pub bonuses: Vec<KeywordBonus>,
}

impl ZoningConfig {
    fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |message: String| ConfigurationError::InvalidTable {
            table: "zoning".to_string(),
            message,
        };
        check_score("zoning", "default_score", self.default_score)?;

        let mut seen = BTreeSet::new();
        for rule in &self.codes {
            let code = normalize_code(&rule.code);
            if code.is_empty() {
                return Err(invalid("empty zoning code".to_string()));
            }
            if !seen.insert(code.clone()) {
                return Err(invalid(format!("duplicate zoning code '{code}'")));
            }
            check_score("zoning", &code, rule.score)?;
        }
        for rule in &self.prefixes {
            if normalize_code(&rule.prefix).is_empty() {
                return Err(invalid("empty zoning prefix".to_string()));
            }
            check_score("zoning", &rule.prefix, rule.score)?;
        }
        for bonus in &self.bonuses {
            if bonus.keyword.trim().is_empty() {
                return Err(invalid("empty bonus keyword".to_string()));
            }
            if !bonus.points.is_finite() || bonus.points < 0.0 {
                return Err(invalid(format!(
                    "bonus '{}' has invalid points {}",
                    bonus.keyword, bonus.points
                )));
            }
        }
        Ok(())
    }
}

/// Substring rule over the land-use text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandUseRule {
    pub pattern: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandUseConfig {
    pub default_score: f64,
    pub rules: Vec<LandUseRule>,
}

impl LandUseConfig {
    fn validate(&self) -> Result<(), ConfigurationError> {
        check_score("land_use", "default_score", self.default_score)?;
        for rule in &self.rules {
            if rule.pattern.trim().is_empty() {
                return Err(ConfigurationError::InvalidTable {
                    table: "land_use".to_string(),
                    message: "empty pattern".to_string(),
                });
            }
            check_score("land_use", &rule.pattern, rule.score)?;
        }
        Ok(())
    }
}

/// Base score plus count and typical-size adjustment bands. Band scores
/// here are signed adjustments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralConfig {
    pub base_score: f64,
    pub count_bands: BandTable,
    pub size_bands: BandTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Score of any parcel inside the study area.
    pub base_score: f64,
    /// Added when the parcel lies within `hub_radius_km` of the hub.
    pub hub_bonus: f64,
    pub hub_radius_km: f64,
}

impl LocationConfig {
    fn validate(&self) -> Result<(), ConfigurationError> {
        check_score("location", "base_score", self.base_score)?;
        check_score("location", "base_score + hub_bonus", self.base_score + self.hub_bonus)?;
        if !self.hub_radius_km.is_finite() || self.hub_radius_km < 0.0 {
            return Err(ConfigurationError::InvalidTable {
                table: "location".to_string(),
                message: format!("hub_radius_km {} is invalid", self.hub_radius_km),
            });
        }
        Ok(())
    }
}

// ── Criteria ─────────────────────────────────────────────────────────────

/// A named acquisition filter. All bounds must hold for a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaSpec {
    pub name: String,
    pub grades: Vec<Grade>,
    pub min_acres: f64,
    pub max_acres: f64,
    /// Coverage ratio must be strictly below this.
    pub max_coverage: f64,
    /// Bounds on the actual total value.
    pub min_value: f64,
    pub max_value: f64,
}

fn validate_criteria(specs: &[CriteriaSpec]) -> Result<(), ConfigurationError> {
    if specs.is_empty() {
        return Err(ConfigurationError::NoCriteria);
    }

    let mut names = BTreeSet::new();
    for spec in specs {
        let invalid = |message: String| ConfigurationError::InvalidCriteria {
            spec: spec.name.clone(),
            message,
        };

        if spec.name.trim().is_empty() {
            return Err(invalid("name is empty".to_string()));
        }
        if !names.insert(spec.name.as_str()) {
            return Err(ConfigurationError::DuplicateCriteria {
                name: spec.name.clone(),
            });
        }
        if spec.grades.is_empty() {
            return Err(invalid("grade set is empty".to_string()));
        }
        check_range(&spec.name, "acres", spec.min_acres, spec.max_acres)?;
        check_range(&spec.name, "value", spec.min_value, spec.max_value)?;
        if !(spec.max_coverage > 0.0 && spec.max_coverage <= 1.0) {
            return Err(invalid(format!(
                "max_coverage {} is outside (0, 1]",
                spec.max_coverage
            )));
        }
    }
    Ok(())
}

fn check_range(spec: &str, bound: &str, min: f64, max: f64) -> Result<(), ConfigurationError> {
    if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max {
        return Err(ConfigurationError::InvalidCriteria {
            spec: spec.to_string(),
            message: format!("{bound} range [{min}, {max}] is empty or inverted"),
        });
    }
    Ok(())
}

fn check_score(table: &str, rule: &str, score: f64) -> Result<(), ConfigurationError> {
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return Err(ConfigurationError::InvalidTable {
            table: table.to_string(),
            message: format!("score {score} for '{rule}' is outside [0, 100]"),
        });
    }
    Ok(())
}

/// Trimmed, upper-case zoning code.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
