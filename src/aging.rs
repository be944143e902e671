use crate::models::{AgingEstimate, DiagnosisRecord};

pub const AGING_CONCERN: &str = "aging";
pub const DEFAULT_AGE_GROUP: i32 = 1;

const MIN_SKIN_AGE: f64 = 18.0;
const MAX_AGE_OVERSHOOT: f64 = 15.0;
const MIN_PACE: f64 = 0.7;
const MAX_PACE: f64 = 1.5;
/// A score of 50 reads as "looks your actual age".
const NEUTRAL_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

impl AgeRange {
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) as f64 / 2.0
    }
}

pub fn age_range(age_group: Option<i32>) -> AgeRange {
    match age_group.unwrap_or(DEFAULT_AGE_GROUP) {
        0 => AgeRange { min: 18, max: 20 },
        2 => AgeRange { min: 31, max: 40 },
        3 => AgeRange { min: 41, max: 50 },
        4 => AgeRange { min: 51, max: 60 },
        5 => AgeRange { min: 61, max: 70 },
        _ => AgeRange { min: 21, max: 30 },
    }
}

pub fn base_age(age_group: Option<i32>) -> f64 {
    age_range(age_group).midpoint()
}

/// `aging_scores` must be ordered oldest to newest.
pub fn estimate(age_group: Option<i32>, aging_scores: &[f64]) -> AgingEstimate {
    let scores: Vec<f64> = aging_scores
        .iter()
        .copied()
        .filter(|score| score.is_finite())
        .collect();
    let base = base_age(age_group);

    AgingEstimate {
        skin_age: skin_age(base, &scores),
        aging_pace: aging_pace(&scores),
    }
}

fn skin_age(base: f64, scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return base.max(MIN_SKIN_AGE);
    }

    let (weighted_sum, total_weight) =
        scores
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(sum, weights), (i, score)| {
                let weight = (i + 1) as f64;
                (sum + score * weight, weights + weight)
            });
    let weighted_avg = weighted_sum / total_weight;

    let score_deviation = (weighted_avg - NEUTRAL_SCORE) / 100.0;
    // Offset grows with base age, so younger users move less.
    let age_offset = score_deviation * base * 0.3 * 2.0;

    (base + age_offset).clamp(MIN_SKIN_AGE, base + MAX_AGE_OVERSHOOT)
}

fn aging_pace(scores: &[f64]) -> f64 {
    let latest = match scores.last() {
        Some(latest) => *latest,
        None => return 1.0,
    };
    let base_pace = 1.0 + (latest - NEUTRAL_SCORE) / 200.0;

    if scores.len() == 1 {
        return base_pace.clamp(MIN_PACE, MAX_PACE);
    }

    let split = scores.len().div_ceil(2);
    let (older, newer) = scores.split_at(split);
    let change = mean(newer) - mean(older);
    let trend_adjustment = (change / 100.0) * 0.3;

    (base_pace + trend_adjustment).clamp(MIN_PACE, MAX_PACE)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Aging severities from dated diagnoses, oldest first.
pub fn aging_scores(records: &[DiagnosisRecord]) -> Vec<f64> {
    let mut dated: Vec<_> = records
        .iter()
        .filter_map(|record| {
            let created = record.created()?;
            let score = record.severity(AGING_CONCERN)?;
            Some((created, score as f64))
        })
        .collect();
    dated.sort_by(|a, b| a.0.cmp(&b.0));
    dated.into_iter().map(|(_, score)| score).collect()
}

impl AgingEstimate {
    pub fn pace_label(&self) -> &'static str {
        if self.aging_pace < 0.95 {
            "slower"
        } else if self.aging_pace > 1.05 {
            "faster"
        } else {
            "typical"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 0.01
    }

    #[test]
    fn base_age_is_bracket_midpoint() {
        let expected = [19.0, 25.5, 35.5, 45.5, 55.5, 65.5];
        for (group, age) in expected.iter().enumerate() {
            assert_eq!(base_age(Some(group as i32)), *age);
        }
    }

    #[test]
    fn unknown_brackets_fall_back_to_default() {
        assert_eq!(base_age(None), 25.5);
        assert_eq!(base_age(Some(9)), 25.5);
        assert_eq!(base_age(Some(-1)), 25.5);
    }

    #[test]
    fn empty_history_uses_base_age_and_neutral_pace() {
        for group in 0..6 {
            let estimate = estimate(Some(group), &[]);
            assert_eq!(estimate.aging_pace, 1.0);
            assert_eq!(estimate.skin_age, base_age(Some(group)).max(18.0));
        }
    }

    #[test]
    fn neutral_single_score_matches_actual_age() {
        let estimate = estimate(Some(1), &[50.0]);
        assert_eq!(estimate.skin_age, 25.5);
        assert_eq!(estimate.aging_pace, 1.0);
    }

    #[test]
    fn recent_scores_weigh_more() {
        let estimate = estimate(Some(1), &[30.0, 70.0]);
        assert!(close(estimate.skin_age, 26.52));
        assert!(close(estimate.aging_pace, 1.22));
        assert_eq!(estimate.pace_label(), "faster");
    }

    #[test]
    fn single_score_pace_is_clamped() {
        assert!(close(estimate(Some(1), &[100.0]).aging_pace, 1.25));
        assert!(close(estimate(Some(1), &[0.0]).aging_pace, 0.75));
    }

    #[test]
    fn odd_history_puts_middle_score_in_older_half() {
        // older = [20, 40] avg 30, newer = [60] avg 60
        let estimate = estimate(Some(2), &[20.0, 40.0, 60.0]);
        assert!(close(estimate.aging_pace, 1.05 + 0.09));
    }

    #[test]
    fn outputs_stay_within_bounds() {
        let histories: [&[f64]; 6] = [
            &[0.0],
            &[100.0],
            &[0.0, 0.0, 0.0, 0.0],
            &[100.0, 100.0, 100.0],
            &[0.0, 100.0],
            &[100.0, 0.0, 100.0, 0.0, 100.0],
        ];
        for group in -1..7 {
            let base = base_age(Some(group));
            for history in histories.iter() {
                let estimate = estimate(Some(group), history);
                assert!(estimate.skin_age >= 18.0);
                assert!(estimate.skin_age <= base + 15.0);
                assert!((0.7..=1.5).contains(&estimate.aging_pace));
            }
        }
    }

    #[test]
    fn youngest_bracket_never_drops_below_minimum() {
        let estimate = estimate(Some(0), &[0.0, 0.0]);
        assert_eq!(estimate.skin_age, 18.0);
    }

    #[test]
    fn non_finite_scores_are_ignored() {
        let estimate = estimate(Some(1), &[f64::NAN, 50.0, f64::INFINITY]);
        assert_eq!(estimate.skin_age, 25.5);
        assert_eq!(estimate.aging_pace, 1.0);
    }

    #[test]
    fn aging_scores_sort_oldest_first_and_skip_undated() {
        let make = |created_at: &str, aging: Option<i32>| {
            let mut severities = BTreeMap::new();
            if let Some(score) = aging {
                severities.insert(AGING_CONCERN.to_string(), score);
            }
            DiagnosisRecord {
                id: Uuid::new_v4(),
                created_at: created_at.to_string(),
                severities,
                routine_recommendations: None,
                scan_recommendations: None,
                image_uris: Vec::new(),
            }
        };
        let records = vec![
            make("2026-02-10", Some(70)),
            make("not a date", Some(99)),
            make("2026-01-05", Some(30)),
            make("2026-01-20", None),
        ];

        assert_eq!(aging_scores(&records), vec![30.0, 70.0]);
    }
}
