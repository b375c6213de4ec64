#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! IOS suitability scoring types.
//!
//! Defines the six scoring dimensions, the A-F grade partition of the
//! composite score, the per-parcel [`ScoreCard`], and the criteria
//! [`MatchClassification`] attached after filtering. These types carry no
//! scoring logic beyond the grade partition, which is fixed.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One of the six independent scoring dimensions.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dimension {
    /// Parcel acreage
    Size,
    /// Building coverage ratio (inverted: open land scores higher)
    Coverage,
    /// Zoning code compatibility
    Zoning,
    /// Current land use text
    LandUse,
    /// Building count and typical building size
    Structural,
    /// Study area membership and hub proximity
    Location,
}

impl Dimension {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Size,
            Self::Coverage,
            Self::Zoning,
            Self::LandUse,
            Self::Structural,
            Self::Location,
        ]
    }
}

/// Ordinal classification of a composite score.
///
/// The bands partition `[0, 100]` with no gap and no overlap:
/// A=`[85,100]`, B=`[75,85)`, C=`[65,75)`, D=`[50,65)`, F=`[0,50)`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Grade {
    /// Excellent candidate
    A,
    /// Good candidate
    B,
    /// Moderate candidate
    C,
    /// Marginal candidate
    D,
    /// Poor candidate
    F,
}

impl Grade {
    /// Returns all grades, best first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::A, Self::B, Self::C, Self::D, Self::F]
    }

    /// Maps a composite score to its grade.
    ///
    /// Scores above 100 grade as A and scores below 0 (or NaN) as F, so
    /// every input maps to exactly one grade.
    #[must_use]
    pub fn from_composite(composite: f64) -> Self {
        if composite >= 85.0 {
            Self::A
        } else if composite >= 75.0 {
            Self::B
        } else if composite >= 65.0 {
            Self::C
        } else if composite >= 50.0 {
            Self::D
        } else {
            Self::F
        }
    }

    /// Inclusive lower bound of this grade's band.
    #[must_use]
    pub const fn lower_bound(self) -> f64 {
        match self {
            Self::A => 85.0,
            Self::B => 75.0,
            Self::C => 65.0,
            Self::D => 50.0,
            Self::F => 0.0,
        }
    }

    /// Human-readable tier label.
    #[must_use]
    pub const fn tier_label(self) -> &'static str {
        match self {
            Self::A => "Excellent IOS Candidate",
            Self::B => "Good IOS Candidate",
            Self::C => "Moderate IOS Candidate",
            Self::D => "Marginal IOS Candidate",
            Self::F => "Poor IOS Candidate",
        }
    }
}

/// Result of a single dimension scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScore {
    /// Which dimension produced this score.
    pub dimension: Dimension,
    /// Final score in `[0, 100]`, bonuses included.
    pub score: f64,
    /// Portion of `score` contributed by additive bonuses (after capping).
    pub bonus: f64,
    /// Explanations of how the score was reached.
    pub notes: Vec<String>,
}

impl DimensionScore {
    /// Creates a score with no bonus.
    #[must_use]
    pub const fn new(dimension: Dimension, score: f64, notes: Vec<String>) -> Self {
        Self {
            dimension,
            score,
            bonus: 0.0,
            notes,
        }
    }
}

/// The six sub-scores of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScores {
    pub size: f64,
    pub coverage: f64,
    pub zoning: f64,
    pub land_use: f64,
    pub structural: f64,
    pub location: f64,
}

impl DimensionScores {
    /// Returns the sub-score for `dimension`.
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

    /// Sets the sub-score for `dimension`.
    pub const fn set(&mut self, dimension: Dimension, score: f64) {
        match dimension {
            Dimension::Size => self.size = score,
            Dimension::Coverage => self.coverage = score,
            Dimension::Zoning => self.zoning = score,
            Dimension::LandUse => self.land_use = score,
            Dimension::Structural => self.structural = score,
            Dimension::Location => self.location = score,
        }
    }
}

/// Conditions that warrant a human look at a scored parcel.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewFlag {
    /// Coverage above 20% on a parcel whose current use is outdoor
    /// storage. Such sites may still qualify; the score is not adjusted.
    OutdoorStorageCoverageOverride,
    /// Matched building area exceeded the parcel area and the coverage
    /// ratio was clamped to 1.0.
    CoverageClamped,
}

/// Composite scoring result for one parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCard {
    /// The six sub-scores.
    pub scores: DimensionScores,
    /// Bonus points included in the zoning sub-score.
    pub zoning_bonus: f64,
    /// Weighted composite in `[0, 100]`.
    pub composite: f64,
    /// Grade band of `composite`.
    pub grade: Grade,
    /// Tier label of `grade`.
    pub tier: String,
    /// Notes collected from every dimension, in dimension order.
    pub notes: Vec<String>,
    /// Raised review flags.
    pub review_flags: Vec<ReviewFlag>,
}

/// A single bound of a criteria spec that a property failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CriteriaFailure {
    /// Grade not in the allowed set.
    Grade { grade: Grade },
    /// Acreage below the minimum.
    AcresBelow { acres: f64, min: f64 },
    /// Acreage above the maximum.
    AcresAbove { acres: f64, max: f64 },
    /// Coverage ratio at or above the maximum.
    CoverageTooHigh { coverage: f64, max: f64 },
    /// The property has no total value.
    ValueMissing,
    /// Value below the minimum.
    ValueBelow { value: f64, min: f64 },
    /// Value above the maximum.
    ValueAbove { value: f64, max: f64 },
}

/// Why a property did not satisfy one named criteria spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecRejection {
    /// Name of the spec.
    pub spec: String,
    /// Every bound that failed.
    pub failures: Vec<CriteriaFailure>,
}

/// Outcome of evaluating the criteria specs against a scored property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchClassification {
    /// Satisfied the named spec (the first one in precedence order).
    Matched { spec: String },
    /// Satisfied no spec.
    Excluded { reasons: Vec<SpecRejection> },
}

impl MatchClassification {
    /// Name of the matched spec, if any.
    #[must_use]
    pub fn spec(&self) -> Option<&str> {
        match self {
            Self::Matched { spec } => Some(spec),
            Self::Excluded { .. } => None,
        }
    }

    /// Whether this property survives filtering.
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}
