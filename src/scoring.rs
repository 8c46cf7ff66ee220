use crate::models::{ComplexityCategory, OverallComplexity, UnitId};
use crate::stats;

/// Mean unit time, in minutes, that scores as maximally time-consuming.
pub const TIME_CEILING_MINUTES: f64 = 240.0;
/// Unit count at which the units factor is exactly 1.0.
pub const BASELINE_UNITS: f64 = 5.0;
pub const NEUTRAL_SCORE: f64 = 50.0;

const TIME_WEIGHT: f64 = 0.7;
const VARIATION_WEIGHT: f64 = 0.3;

/// Difficulty of one unit from its present completion times, 0 to 100.
/// Fewer than two observations score the neutral midpoint.
pub fn difficulty_score(times: &[f64]) -> f64 {
    let (Some(mean), Some(std)) = (stats::mean(times), stats::std_dev(times)) else {
        return NEUTRAL_SCORE;
    };

    let normalized_time = (mean / TIME_CEILING_MINUTES * 100.0).clamp(0.0, 100.0);
    let variation = if mean > 0.0 { std / mean } else { 0.0 };

    stats::round_to(
        TIME_WEIGHT * normalized_time + VARIATION_WEIGHT * (variation * 100.0).min(100.0),
        1,
    )
}

pub fn units_factor(unit_count: usize) -> f64 {
    (unit_count as f64 / BASELINE_UNITS).clamp(0.5, 1.5)
}

impl ComplexityCategory {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s < 30.0 => ComplexityCategory::Easy,
            s if s < 60.0 => ComplexityCategory::Moderate,
            s if s < 80.0 => ComplexityCategory::Challenging,
            _ => ComplexityCategory::VeryDifficult,
        }
    }
}

/// Rolls unit difficulties, given in unit order, up into a course judgment.
/// On ties the earliest unit wins both the hardest and the easiest slot.
pub fn overall_complexity(unit_scores: &[(UnitId, f64)], unit_count: usize) -> OverallComplexity {
    let scores: Vec<f64> = unit_scores.iter().map(|(_, score)| *score).collect();
    let avg_difficulty = stats::mean(&scores).unwrap_or(NEUTRAL_SCORE);
    let factor = units_factor(unit_count);
    let complexity_score = stats::round_to(avg_difficulty * factor, 1);

    let mut hardest: Option<(UnitId, f64)> = None;
    let mut easiest: Option<(UnitId, f64)> = None;
    for &(unit, score) in unit_scores {
        if hardest.map_or(true, |(_, best)| score > best) {
            hardest = Some((unit, score));
        }
        if easiest.map_or(true, |(_, best)| score < best) {
            easiest = Some((unit, score));
        }
    }

    OverallComplexity {
        complexity_score,
        category: ComplexityCategory::from_score(complexity_score),
        most_difficult_unit: hardest.map(|(unit, _)| unit),
        easiest_unit: easiest.map(|(unit, _)| unit),
        units_factor: factor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_units_score_neutral() {
        assert_eq!(difficulty_score(&[]), 50.0);
        assert_eq!(difficulty_score(&[500.0]), 50.0);
    }

    #[test]
    fn uniform_hour_scores_seventeen_and_a_half() {
        assert_eq!(difficulty_score(&[60.0, 60.0, 60.0, 60.0, 60.0]), 17.5);
    }

    #[test]
    fn difficulty_stays_within_bounds() {
        let samples: [&[f64]; 5] = [
            &[0.0, 0.0],
            &[1000.0, 5000.0, 9000.0],
            &[1.0, 400.0],
            &[-30.0, -10.0],
            &[-5.0, 5.0],
        ];
        for sample in samples {
            let score = difficulty_score(sample);
            assert!((0.0..=100.0).contains(&score), "{sample:?} scored {score}");
        }
        assert_eq!(difficulty_score(&[1000.0, 1000.0]), 70.0);
    }

    #[test]
    fn variation_adds_thirty_percent_weight() {
        // mean 120, sample std ~84.85, cv ~0.7071
        let score = difficulty_score(&[60.0, 180.0]);
        assert_eq!(score, 56.2);
    }

    #[test]
    fn units_factor_is_bounded() {
        assert_eq!(units_factor(0), 0.5);
        assert_eq!(units_factor(1), 0.5);
        assert_eq!(units_factor(5), 1.0);
        assert_eq!(units_factor(6), 1.2);
        assert_eq!(units_factor(5000), 1.5);
    }

    #[test]
    fn categories_follow_thresholds() {
        let cases = [
            (0.0, ComplexityCategory::Easy),
            (29.9, ComplexityCategory::Easy),
            (30.0, ComplexityCategory::Moderate),
            (59.9, ComplexityCategory::Moderate),
            (60.0, ComplexityCategory::Challenging),
            (79.9, ComplexityCategory::Challenging),
            (80.0, ComplexityCategory::VeryDifficult),
            (150.0, ComplexityCategory::VeryDifficult),
        ];
        for (score, expected) in cases {
            assert_eq!(ComplexityCategory::from_score(score), expected, "score {score}");
        }
    }

    #[test]
    fn complexity_scales_by_unit_count() {
        let scores = [(UnitId(1), 17.5), (UnitId(2), 17.5), (UnitId(3), 17.5)];
        let overall = overall_complexity(&scores, 3);
        assert_eq!(overall.units_factor, 0.6);
        assert_eq!(overall.complexity_score, 10.5);
        assert_eq!(overall.category, ComplexityCategory::Easy);
    }

    #[test]
    fn ties_resolve_to_first_unit() {
        let scores = [
            (UnitId(1), 40.0),
            (UnitId(2), 70.0),
            (UnitId(3), 70.0),
            (UnitId(4), 40.0),
        ];
        let overall = overall_complexity(&scores, 4);
        assert_eq!(overall.most_difficult_unit, Some(UnitId(2)));
        assert_eq!(overall.easiest_unit, Some(UnitId(1)));
    }

    #[test]
    fn no_units_defaults_to_neutral() {
        let overall = overall_complexity(&[], 0);
        assert_eq!(overall.complexity_score, 25.0);
        assert_eq!(overall.most_difficult_unit, None);
        assert_eq!(overall.easiest_unit, None);
    }

    #[test]
    fn complexity_is_monotonic_in_difficulty() {
        for unit_count in [1, 3, 5, 9] {
            let mut previous = f64::MIN;
            for step in 0..=100 {
                let difficulty = step as f64;
                let scores: Vec<(UnitId, f64)> = (1..=unit_count as u32)
                    .map(|n| (UnitId(n), difficulty))
                    .collect();
                let score = overall_complexity(&scores, unit_count).complexity_score;
                assert!(score >= previous);
                previous = score;
            }
        }
    }
}
