//! Weighted composite, grade, review flags, and the analysis summary.

use std::fmt::Write as _;

use ios_scoring_models::{Dimension, DimensionScores, Grade, ReviewFlag, ScoreCard};

use crate::ScoringInput;
use crate::config::{ScoringConfig, Weights};
use crate::dimensions::score_all;

/// Coverage above which an outdoor-storage site is flagged for review.
pub const OUTDOOR_STORAGE_COVERAGE_THRESHOLD: f64 = 0.20;

/// Weighted sum of the six sub-scores.
#[must_use]
pub fn composite(weights: &Weights, scores: &DimensionScores) -> f64 {
    Dimension::all()
        .iter()
        .map(|dimension| weights.get(*dimension) * scores.get(*dimension))
        .sum()
}

/// Runs every scorer and assembles the card.
#[must_use]
pub fn score_card(config: &ScoringConfig, input: &ScoringInput<'_>) -> ScoreCard {
    let mut scores = DimensionScores::default();
    let mut zoning_bonus = 0.0;
    let mut notes = Vec::new();

    for result in score_all(config, input) {
        scores.set(result.dimension, result.score);
        if result.dimension == Dimension::Zoning {
            zoning_bonus = result.bonus;
        }
        notes.extend(result.notes);
    }

    let composite = composite(&config.weights, &scores);
    let grade = Grade::from_composite(composite);

    ScoreCard {
        scores,
        zoning_bonus,
        composite,
        grade,
        tier: grade.tier_label().to_string(),
        notes,
        review_flags: review_flags(input, &scores),
    }
}

/// Conditions that do not change the score but need a human look.
///
/// High coverage on a site already used for outdoor storage may still
/// qualify; that call is left to a reviewer.
#[must_use]
pub fn review_flags(input: &ScoringInput<'_>, scores: &DimensionScores) -> Vec<ReviewFlag> {
    let mut flags = Vec::new();
    if input.coverage_ratio > OUTDOOR_STORAGE_COVERAGE_THRESHOLD && scores.land_use >= 100.0 {
        flags.push(ReviewFlag::OutdoorStorageCoverageOverride);
    }
    if input.coverage_clamped {
        flags.push(ReviewFlag::CoverageClamped);
    }
    flags
}

/// Human-readable breakdown of a card: composite, per-dimension scores with
/// weights, then every note.
#[must_use]
pub fn analysis(card: &ScoreCard, weights: &Weights) -> String {
    let mut text = format!(
        "IOS Score: {:.1} ({} - {})\n\nComponent Scores:\n",
        card.composite, card.grade, card.tier
    );
    for dimension in Dimension::all() {
        let _ = writeln!(
            text,
            "  {:<12} {:>3.0}/100 (weight: {:.0}%)",
            dimension.as_ref(),
            card.scores.get(*dimension),
            weights.get(*dimension) * 100.0
        );
    }
    text.push_str("\nAnalysis Notes:\n");
    for note in &card.notes {
        let _ = writeln!(text, "  - {note}");
    }
    for flag in &card.review_flags {
        let _ = writeln!(text, "  ! review: {flag}");
    }
    text
}
