//! The six dimension scorers.
//!
//! Each scorer is a pure function of the configuration and one parcel's
//! [`ScoringInput`]. None depends on another, so they may run in any order.

use ios_scoring_models::{Dimension, DimensionScore};

use crate::ScoringInput;
use crate::config::{
    CoverageConfig, LandUseConfig, LocationConfig, ScoringConfig, SizeConfig, StructuralConfig,
    ZoningConfig, normalize_code,
};

/// Runs all six scorers, in [`Dimension::all`] order.
#[must_use]
pub fn score_all(config: &ScoringConfig, input: &ScoringInput<'_>) -> [DimensionScore; 6] {
    [
        score_size(&config.size, input),
        score_coverage(&config.coverage, input),
        score_zoning(&config.zoning, input),
        score_land_use(&config.land_use, input),
        score_structural(&config.structural, input),
        score_location(&config.location, input),
    ]
}

/// Step function over acreage.
#[must_use]
pub fn score_size(config: &SizeConfig, input: &ScoringInput<'_>) -> DimensionScore {
    let acres = input.acres;
    match config.bands.lookup(acres) {
        Some(band) => DimensionScore::new(
            Dimension::Size,
            band.score,
            vec![format!("Parcel size: {acres:.2} acres ({})", band.label)],
        ),
        None => DimensionScore::new(
            Dimension::Size,
            0.0,
            vec![format!("Parcel size: {acres} acres is not scoreable")],
        ),
    }
}

/// Inverted coverage score: open land scores higher than built land.
#[must_use]
pub fn score_coverage(config: &CoverageConfig, input: &ScoringInput<'_>) -> DimensionScore {
    let percent = input.coverage_ratio * 100.0;
    let tail = &config.tail;

    let (score, label) = if percent >= tail.start_percent {
        let remaining = (tail.zero_percent - percent) / (tail.zero_percent - tail.start_percent);
        (
            (tail.start_score * remaining).clamp(0.0, tail.start_score),
            tail.label.as_str(),
        )
    } else {
        config
            .bands
            .lookup(percent)
            .map_or((0.0, "unscoreable"), |band| (band.score, band.label.as_str()))
    };

    DimensionScore::new(
        Dimension::Coverage,
        score,
        vec![format!("Building coverage: {percent:.1}% ({label})")],
    )
}

/// Exact code, then longest prefix, then the default; plus capped
/// description keyword bonuses.
#[must_use]
pub fn score_zoning(config: &ZoningConfig, input: &ScoringInput<'_>) -> DimensionScore {
    let Some(code) = input
        .zoning_code
        .map(normalize_code)
        .filter(|code| !code.is_empty())
    else {
        return DimensionScore::new(
            Dimension::Zoning,
            config.default_score,
            vec![format!(
                "No zoning code; default score {}",
                config.default_score
            )],
        );
    };

    let mut notes = Vec::new();

    let exact = config
        .codes
        .iter()
        .find(|rule| normalize_code(&rule.code) == code);
    let base = if let Some(rule) = exact {
        notes.push(format!("Zoning: {code} ({}, score {})", rule.label, rule.score));
        rule.score
    } else if let Some(rule) = config
        .prefixes
        .iter()
        .filter(|rule| code.starts_with(&normalize_code(&rule.prefix)))
        .min_by_key(|rule| std::cmp::Reverse(rule.prefix.trim().len()))
    {
        notes.push(format!("Zoning: {code} ({}, score {})", rule.label, rule.score));
        rule.score
    } else {
        notes.push(format!(
            "Zoning: {code} (unrecognized, default score {})",
            config.default_score
        ));
        config.default_score
    };

    let mut score = base;
    if let Some(description) = input.zoning_description {
        let description = description.to_lowercase();
        for bonus in &config.bonuses {
            let keyword = bonus.keyword.trim().to_lowercase();
            if description.contains(&keyword) {
                score += bonus.points;
                notes.push(format!(
                    "Zoning keyword bonus: '{keyword}' (+{})",
                    bonus.points
                ));
            }
        }
    }
    let score = score.min(100.0);

    DimensionScore {
        dimension: Dimension::Zoning,
        score,
        bonus: score - base,
        notes,
    }
}

/// Highest-scoring matching keyword rule. Equal scores resolve to the
/// longest pattern, then to table order.
#[must_use]
pub fn score_land_use(config: &LandUseConfig, input: &ScoringInput<'_>) -> DimensionScore {
    let Some(text) = input
        .land_use
        .map(|text| text.trim().to_lowercase())
        .filter(|text| !text.is_empty())
    else {
        return DimensionScore::new(
            Dimension::LandUse,
            config.default_score,
            vec!["No land use data".to_string()],
        );
    };

    let best = config
        .rules
        .iter()
        .enumerate()
        .map(|(order, rule)| (order, rule, rule.pattern.trim().to_lowercase()))
        .filter(|(_, _, pattern)| text.contains(pattern.as_str()))
        .max_by(|(a_order, a, a_pattern), (b_order, b, b_pattern)| {
            a.score
                .total_cmp(&b.score)
                .then(a_pattern.len().cmp(&b_pattern.len()))
                .then(b_order.cmp(a_order))
        });

    match best {
        Some((_, rule, pattern)) => DimensionScore::new(
            Dimension::LandUse,
            rule.score,
            vec![format!("Land use match: '{pattern}' (score {})", rule.score)],
        ),
        None => DimensionScore::new(
            Dimension::LandUse,
            config.default_score,
            vec!["Land use: no specific IOS keywords found".to_string()],
        ),
    }
}

/// Base score adjusted for building count and typical building size.
#[must_use]
pub fn score_structural(config: &StructuralConfig, input: &ScoringInput<'_>) -> DimensionScore {
    let count = input.building_count;
    let mut notes = Vec::with_capacity(2);

    let count_adjustment = match config.count_bands.lookup(f64::from(count)) {
        Some(band) => {
            notes.push(format!("Buildings: {count} ({}, {:+})", band.label, band.score));
            band.score
        }
        None => 0.0,
    };

    let size_adjustment = match input.typical_building_sq_ft {
        Some(typical) if count > 0 => match config.size_bands.lookup(typical) {
            Some(band) => {
                notes.push(format!(
                    "Typical building: {typical:.0} sq ft ({}, {:+})",
                    band.label, band.score
                ));
                band.score
            }
            None => 0.0,
        },
        _ => {
            notes.push("No building footprints; no size adjustment".to_string());
            0.0
        }
    };

    DimensionScore::new(
        Dimension::Structural,
        (config.base_score + count_adjustment + size_adjustment).clamp(0.0, 100.0),
        notes,
    )
}

/// Study-area base score plus the hub proximity bonus.
#[must_use]
pub fn score_location(config: &LocationConfig, input: &ScoringInput<'_>) -> DimensionScore {
    let distance = input.hub_distance_km;
    let mut notes = vec!["In target industrial area".to_string()];

    let bonus = if distance <= config.hub_radius_km {
        notes.push(format!(
            "Hub proximity bonus: {distance:.1} km (+{})",
            config.hub_bonus
        ));
        config.hub_bonus
    } else {
        notes.push(format!("{distance:.1} km from hub; no proximity bonus"));
        0.0
    };

    let score = (config.base_score + bonus).clamp(0.0, 100.0);
    DimensionScore {
        dimension: Dimension::Location,
        score,
        bonus,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScoringConfig {
        ScoringConfig::default()
    }

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn size_bands_are_lower_inclusive() {
        let config = config();
        let size = |acres| {
            score_size(
                &config.size,
                &ScoringInput {
                    acres,
                    ..ScoringInput::default()
                },
            )
            .score
        };
        approx(size(0.5), 0.0);
        approx(size(1.0), 40.0);
        approx(size(2.99), 70.0);
        approx(size(3.0), 100.0);
        approx(size(14.99), 100.0);
        approx(size(15.0), 80.0);
        approx(size(25.0), 60.0);
        approx(size(30.0), 40.0);
        approx(size(400.0), 40.0);
    }

    #[test]
    fn coverage_is_inverted_and_monotonic_past_the_bands() {
        let config = config();
        let coverage = |ratio| {
            score_coverage(
                &config.coverage,
                &ScoringInput {
                    coverage_ratio: ratio,
                    ..ScoringInput::default()
                },
            )
            .score
        };
        approx(coverage(0.0), 95.0);
        approx(coverage(0.10), 100.0);
        approx(coverage(0.15), 85.0);
        approx(coverage(0.20), 70.0);
        approx(coverage(0.30), 60.0);
        approx(coverage(0.35), 30.0);
        approx(coverage(1.0), 0.0);
        assert!(coverage(0.10) >= coverage(0.30));

        let mut previous = coverage(0.35);
        for step in 36..=100 {
            let current = coverage(f64::from(step) / 100.0);
            assert!(current <= previous, "coverage score rose at {step}%");
            assert!((0.0..=30.0).contains(&current));
            previous = current;
        }
    }

    #[test]
    fn zoning_exact_codes_are_normalized() {
        let config = config();
        let zoning = |code| {
            score_zoning(
                &config.zoning,
                &ScoringInput {
                    zoning_code: Some(code),
                    ..ScoringInput::default()
                },
            )
            .score
        };
        approx(zoning("I-2"), 100.0);
        approx(zoning(" i-1 "), 100.0);
        approx(zoning("C-5"), 75.0);
        approx(zoning("C-4"), 65.0);
        approx(zoning("A-2"), 55.0);
        approx(zoning("PUD"), 50.0);
        approx(zoning("C-1"), 40.0);
        approx(zoning("R-1"), 10.0);
        approx(zoning("RE-2"), 10.0);
        approx(zoning("MH"), 10.0);
        approx(zoning("XYZ"), 30.0);
    }

    #[test]
    fn missing_zoning_code_uses_default_with_note() {
        let score = score_zoning(&config().zoning, &ScoringInput::default());
        approx(score.score, 30.0);
        assert!(score.notes[0].contains("No zoning code"));
    }

    #[test]
    fn zoning_bonuses_are_additive_and_capped() {
        let config = config();
        let score = score_zoning(
            &config.zoning,
            &ScoringInput {
                zoning_code: Some("C-4"),
                zoning_description: Some("Highway Commercial - Contractor Yard permitted"),
                ..ScoringInput::default()
            },
        );
        approx(score.score, 80.0);
        approx(score.bonus, 15.0);

        let capped = score_zoning(
            &config.zoning,
            &ScoringInput {
                zoning_code: Some("I-2"),
                zoning_description: Some("outdoor storage, contractor equipment yard"),
                ..ScoringInput::default()
            },
        );
        approx(capped.score, 100.0);
        approx(capped.bonus, 0.0);
    }

    #[test]
    fn land_use_highest_rule_wins() {
        let config = config();
        let land_use = |text| {
            score_land_use(
                &config.land_use,
                &ScoringInput {
                    land_use: Some(text),
                    ..ScoringInput::default()
                },
            )
        };
        approx(land_use("Truck Trailer Parking").score, 100.0);
        approx(land_use("industrial warehouse with outdoor storage").score, 100.0);
        approx(land_use("Vacant Industrial").score, 90.0);
        approx(land_use("retail commercial").score, 50.0);
        approx(land_use("Single Family Residential").score, 10.0);
        approx(land_use("vacant").score, 50.0);
    }

    #[test]
    fn land_use_ties_prefer_longest_pattern() {
        let config = config();
        let score = score_land_use(
            &config.land_use,
            &ScoringInput {
                land_use: Some("industrial warehouse"),
                ..ScoringInput::default()
            },
        );
        approx(score.score, 80.0);
        assert!(score.notes[0].contains("'industrial'"), "{:?}", score.notes);
    }

    #[test]
    fn missing_land_use_defaults_with_note() {
        let score = score_land_use(
            &config().land_use,
            &ScoringInput {
                land_use: Some("   "),
                ..ScoringInput::default()
            },
        );
        approx(score.score, 50.0);
        assert_eq!(score.notes, vec!["No land use data".to_string()]);
    }

    #[test]
    fn structural_adjustments() {
        let config = config();
        let structural = |count, typical| {
            score_structural(
                &config.structural,
                &ScoringInput {
                    building_count: count,
                    typical_building_sq_ft: typical,
                    ..ScoringInput::default()
                },
            )
            .score
        };
        approx(structural(0, None), 70.0);
        approx(structural(1, Some(1_500.0)), 80.0);
        approx(structural(1, Some(3_000.0)), 70.0);
        approx(structural(3, Some(8_000.0)), 50.0);
        approx(structural(2, Some(10_000.0)), 50.0);
        approx(structural(6, Some(40_000.0)), 20.0);
    }

    #[test]
    fn location_bonus_within_hub_radius() {
        let config = config();
        let location = |distance| {
            score_location(
                &config.location,
                &ScoringInput {
                    hub_distance_km: distance,
                    ..ScoringInput::default()
                },
            )
            .score
        };
        approx(location(5.0), 75.0);
        approx(location(25.0), 75.0);
        approx(location(25.1), 60.0);
        approx(location(f64::NAN), 60.0);
    }

    #[test]
    fn scorers_return_dimensions_in_order() {
        let scores = score_all(&config(), &ScoringInput::default());
        let dims = scores.iter().map(|s| s.dimension).collect::<Vec<_>>();
        assert_eq!(dims, Dimension::all());
    }
}
