//! The five scoring methods.
//!
//! Every method reads the same inputs: the Echo, the character's stat
//! weights, and the numeric config. Missing weights count as 0 unless a
//! method documents another fallback; missing max rolls count as 1.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::config::ConfigBundle;
use crate::echo::{Echo, MAX_LEVEL};
use crate::stats::{
    DAMAGE_BONUS_STATS, STAT_ATK_FLAT, STAT_ATK_PERCENT, STAT_CRIT_DMG, STAT_CRIT_RATE, STAT_ER,
};

/// Tolerance for the effective-stat weight threshold.
const WEIGHT_EPSILON: f64 = 1e-9;

/// One scoring formula.
pub trait ScoringStrategy: Send + Sync {
    /// Stable identifier, also used in config files and CLI flags.
    fn name(&self) -> &'static str;

    fn compute(&self, echo: &Echo, weights: &BTreeMap<String, f64>, config: &ConfigBundle) -> f64;
}

fn level_factor(echo: &Echo) -> f64 {
    echo.level as f64 / MAX_LEVEL as f64
}

fn weight_of(weights: &BTreeMap<String, f64>, stat: &str) -> f64 {
    weights.get(stat).copied().unwrap_or(0.0)
}

/// Sum of `weight * value / max / 5 * 100` over all substats.
///
/// One max roll of a stat with weight `w` contributes exactly `20 * w`.
pub fn weighted_sub_score(echo: &Echo, weights: &BTreeMap<String, f64>, config: &ConfigBundle) -> f64 {
    echo.substats
        .iter()
        .map(|(stat, &value)| {
            (value / config.max_value(stat) / 5.0) * weight_of(weights, stat) * 100.0
        })
        .sum()
}

/// Number of substats whose weight reaches the effective threshold.
pub fn effective_count(echo: &Echo, weights: &BTreeMap<String, f64>, config: &ConfigBundle) -> u32 {
    let threshold = config.effective_stats.threshold - WEIGHT_EPSILON;
    echo.substats
        .keys()
        .filter(|stat| weight_of(weights, stat) >= threshold)
        .count() as u32
}

/// Main-stat bonus plus normalized substat rolls.
pub struct NormalizedScoring;

impl ScoringStrategy for NormalizedScoring {
    fn name(&self) -> &'static str {
        "normalized"
    }

    fn compute(&self, echo: &Echo, weights: &BTreeMap<String, f64>, config: &ConfigBundle) -> f64 {
        level_factor(echo) * (config.main_stat_multiplier + weighted_sub_score(echo, weights, config))
    }
}

/// Weighted share of max rolls, without the main-stat bonus.
pub struct RatioScoring;

impl ScoringStrategy for RatioScoring {
    fn name(&self) -> &'static str {
        "ratio"
    }

    fn compute(&self, echo: &Echo, weights: &BTreeMap<String, f64>, config: &ConfigBundle) -> f64 {
        let ratio: f64 = echo
            .substats
            .iter()
            .map(|(stat, &value)| (value / config.max_value(stat) / 5.0) * weight_of(weights, stat))
            .sum();
        100.0 * level_factor(echo) * ratio
    }
}

/// Points per roll tier, as a share of all-max rolls.
///
/// Only stats with configured tier ranges are rated. Stats missing from the
/// weights use the configured default weight.
pub struct RollQualityScoring;

impl ScoringStrategy for RollQualityScoring {
    fn name(&self) -> &'static str {
        "roll"
    }

    fn compute(&self, echo: &Echo, weights: &BTreeMap<String, f64>, config: &ConfigBundle) -> f64 {
        let rq = &config.roll_quality;
        let mut points = 0.0;
        let mut count = 0u32;

        for (stat, &value) in &echo.substats {
            let Some(ranges) = rq.ranges.get(stat) else {
                continue;
            };
            let weight = weights.get(stat).copied().unwrap_or(rq.default_weight);
            points += ranges.points_for(value, &rq.points) * weight;
            count += 1;
        }

        if count == 0 {
            return 0.0;
        }
        (points / (count as f64 * 3.0)) * 100.0 * level_factor(echo)
    }
}

/// Contribution of effective substats, scaled by a bonus for their count.
pub struct EffectiveStatsScoring;

impl ScoringStrategy for EffectiveStatsScoring {
    fn name(&self) -> &'static str {
        "effective"
    }

    fn compute(&self, echo: &Echo, weights: &BTreeMap<String, f64>, config: &ConfigBundle) -> f64 {
        let es = &config.effective_stats;
        let threshold = es.threshold - WEIGHT_EPSILON;

        let mut count = 0u32;
        let mut contribution = 0.0;
        for (stat, &value) in &echo.substats {
            let weight = weight_of(weights, stat);
            if weight >= threshold {
                count += 1;
                contribution += (value / config.max_value(stat)) * weight * es.base_multiplier;
            }
        }

        contribution * es.bonus_for(count) * level_factor(echo)
    }
}

/// Crit value extended with attack, energy regen and damage bonuses.
pub struct CvScoring;

impl ScoringStrategy for CvScoring {
    fn name(&self) -> &'static str {
        "cv"
    }

    fn compute(&self, echo: &Echo, weights: &BTreeMap<String, f64>, config: &ConfigBundle) -> f64 {
        let cv = &config.cv_weights;
        let sub = |stat: &str| echo.substats.get(stat).copied().unwrap_or(0.0);

        let mut score = sub(STAT_CRIT_RATE) * cv.crit_rate
            + sub(STAT_CRIT_DMG) * cv.crit_dmg
            + sub(STAT_ATK_PERCENT) * cv.atk_percent
            + sub(STAT_ER) * cv.er;

        if cv.atk_flat_divisor > 0.0 {
            score += sub(STAT_ATK_FLAT) / cv.atk_flat_divisor * cv.atk_flat_multiplier;
        }

        for stat in DAMAGE_BONUS_STATS {
            if let Some(&value) = echo.substats.get(stat) {
                let weight = weights.get(stat).copied().unwrap_or(cv.dmg_bonus_default_weight);
                score += value * cv.dmg_bonus * weight;
            }
        }

        score * level_factor(echo)
    }
}

/// Selectable scoring method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    Normalized,
    Ratio,
    Roll,
    Effective,
    Cv,
}

impl ScoringMethod {
    pub const ALL: [ScoringMethod; 5] = [
        ScoringMethod::Normalized,
        ScoringMethod::Ratio,
        ScoringMethod::Roll,
        ScoringMethod::Effective,
        ScoringMethod::Cv,
    ];

    pub fn strategy(self) -> &'static dyn ScoringStrategy {
        match self {
            Self::Normalized => &NormalizedScoring,
            Self::Ratio => &RatioScoring,
            Self::Roll => &RollQualityScoring,
            Self::Effective => &EffectiveStatsScoring,
            Self::Cv => &CvScoring,
        }
    }

    pub fn name(self) -> &'static str {
        self.strategy().name()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name.trim())
    }
}

impl fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::echo::CostTier;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn config() -> ConfigBundle {
        let mut config = ConfigBundle::default();
        config.substat_max_values = [
            (STAT_CRIT_RATE, 10.5),
            (STAT_CRIT_DMG, 21.0),
            (STAT_ATK_PERCENT, 11.6),
            (STAT_ATK_FLAT, 60.0),
            (STAT_ER, 12.4),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        config
    }

    fn weights() -> BTreeMap<String, f64> {
        [
            (STAT_CRIT_RATE, 1.0),
            (STAT_CRIT_DMG, 1.0),
            (STAT_ATK_PERCENT, 0.8),
            (STAT_ATK_FLAT, 0.3),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    fn echo(subs: &[(&str, f64)]) -> Echo {
        Echo::new(
            Some(CostTier::Four),
            STAT_CRIT_RATE,
            subs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        )
    }

    #[test]
    fn test_normalized_max_crit_roll() {
        let e = echo(&[(STAT_CRIT_RATE, 10.5)]);
        let score = NormalizedScoring.compute(&e, &weights(), &config());
        assert!(close(score, 15.0 + 20.0));
    }

    #[test]
    fn test_normalized_scales_with_level() {
        let mut e = echo(&[(STAT_CRIT_RATE, 10.5)]);
        e.level = 5;
        let score = NormalizedScoring.compute(&e, &weights(), &config());
        assert!(close(score, (15.0 + 20.0) / 5.0));
    }

    #[test]
    fn test_ratio() {
        let e = echo(&[(STAT_CRIT_RATE, 10.5), (STAT_CRIT_DMG, 21.0)]);
        let score = RatioScoring.compute(&e, &weights(), &config());
        assert!(close(score, 40.0));
    }

    #[test]
    fn test_unknown_stat_weight_zero_max_one() {
        let e = echo(&[("謎", 50.0)]);
        assert!(close(RatioScoring.compute(&e, &weights(), &config()), 0.0));
        assert!(close(weighted_sub_score(&e, &weights(), &config()), 0.0));
    }

    #[test]
    fn test_roll_quality() {
        // crit rate Max tier (3 * 1.0), atk flat Low tier (1 * 0.3)
        let e = echo(&[(STAT_CRIT_RATE, 10.5), (STAT_ATK_FLAT, 40.0)]);
        let score = RollQualityScoring.compute(&e, &weights(), &config());
        assert!(close(score, (3.3 / 6.0) * 100.0));
    }

    #[test]
    fn test_roll_quality_ignores_unranged_stats() {
        let e = echo(&[("謎", 50.0)]);
        assert_eq!(RollQualityScoring.compute(&e, &weights(), &config()), 0.0);
    }

    #[test]
    fn test_roll_quality_default_weight() {
        // ER has ranges but no weight: 3 points * 0.5
        let e = echo(&[(STAT_ER, 12.0)]);
        let score = RollQualityScoring.compute(&e, &weights(), &config());
        assert!(close(score, 50.0));
    }

    #[test]
    fn test_effective_stats() {
        let e = echo(&[
            (STAT_CRIT_RATE, 10.5),
            (STAT_CRIT_DMG, 21.0),
            (STAT_ATK_FLAT, 60.0),
        ]);
        let w = weights();
        let c = config();
        assert_eq!(effective_count(&e, &w, &c), 2);
        // two effective max rolls: (1 + 1) * 20 * bonus(2)=0.8
        let score = EffectiveStatsScoring.compute(&e, &w, &c);
        assert!(close(score, 40.0 * 0.8));
    }

    #[test]
    fn test_effective_threshold_inclusive() {
        let mut w = weights();
        w.insert(STAT_ER.to_string(), 0.5);
        let e = echo(&[(STAT_ER, 12.4)]);
        assert_eq!(effective_count(&e, &w, &config()), 1);
    }

    #[test]
    fn test_cv() {
        let e = echo(&[
            (STAT_CRIT_RATE, 8.1),
            (STAT_CRIT_DMG, 16.2),
            (STAT_ATK_FLAT, 50.0),
        ]);
        let score = CvScoring.compute(&e, &weights(), &config());
        assert!(close(score, 8.1 * 2.0 + 16.2 + 50.0 / 10.0 * 1.2));
    }

    #[test]
    fn test_cv_damage_bonus_default_weight() {
        let e = echo(&[("共鳴スキルダメージアップ", 10.0)]);
        let score = CvScoring.compute(&e, &weights(), &config());
        assert!(close(score, 10.0 * 1.1 * 0.5));
    }

    #[test]
    fn test_cv_zero_divisor() {
        let mut c = config();
        c.cv_weights.atk_flat_divisor = 0.0;
        let e = echo(&[(STAT_ATK_FLAT, 50.0)]);
        assert_eq!(CvScoring.compute(&e, &weights(), &c), 0.0);
    }

    #[test]
    fn test_method_names() {
        for method in ScoringMethod::ALL {
            assert_eq!(ScoringMethod::from_name(method.name()), Some(method));
        }
        assert_eq!(ScoringMethod::from_name("achievement"), None);
        assert_eq!(ScoringMethod::Roll.to_string(), "roll");
    }
}
