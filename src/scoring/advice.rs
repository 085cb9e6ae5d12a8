//! Main-stat consistency check and build advice.

use std::collections::BTreeMap;

use crate::echo::{CostTier, Echo};
use crate::gamedata::MainStatTarget;
use crate::stats::{
    DMG_BONUS_SUFFIX, ELEMENT_DMG_WILDCARD, STAT_ATK_PERCENT, STAT_BASIC_DMG_BONUS, STAT_CRIT_DMG,
    STAT_CRIT_RATE, STAT_ER,
};

/// Multiplier for an acceptable but not ideal main stat.
pub const PENALTY_ACCEPTABLE: f64 = 0.97;

/// Multiplier for a main stat that is not a target for the slot.
pub const PENALTY_MISMATCH: f64 = 0.8;

/// Outcome of comparing the Echo's main stat with the character's targets.
#[derive(Clone, Debug, PartialEq)]
pub struct Consistency {
    pub penalty: f64,
    pub message: Option<String>,
}

impl Consistency {
    fn ideal() -> Self {
        Self {
            penalty: 1.0,
            message: None,
        }
    }
}

/// Targets for every slot of the Echo's cost.
///
/// Slot keys name their cost by the first digit (`"3"`, `"cost3_echo_1"`).
fn targets_for_cost<'a>(
    main_stats: &'a BTreeMap<String, MainStatTarget>,
    cost: CostTier,
) -> Vec<&'a str> {
    let mut targets: Vec<&str> = Vec::new();
    for (slot, target) in main_stats {
        if slot.chars().find(|c| c.is_ascii_digit()) != Some(cost.digit()) {
            continue;
        }
        for stat in target.stats() {
            if !targets.contains(&stat) {
                targets.push(stat);
            }
        }
    }
    targets
}

/// Elemental damage matches the wildcard target; basic-attack damage does not.
fn matches_element_wildcard(main_stat: &str) -> bool {
    main_stat.contains(DMG_BONUS_SUFFIX) && main_stat != STAT_BASIC_DMG_BONUS
}

/// Checks the main stat against the character's targets for its cost.
///
/// No cost or no targets for the cost means there is nothing to compare
/// against, which counts as ideal.
pub fn check_main_stat(echo: &Echo, main_stats: &BTreeMap<String, MainStatTarget>) -> Consistency {
    let Some(cost) = echo.cost else {
        return Consistency::ideal();
    };
    let targets = targets_for_cost(main_stats, cost);
    if targets.is_empty() {
        return Consistency::ideal();
    }

    let main = echo.main_stat.as_str();
    if targets.contains(&main) {
        return Consistency::ideal();
    }
    if targets.contains(&ELEMENT_DMG_WILDCARD) && matches_element_wildcard(main) {
        return Consistency::ideal();
    }

    let wants_damage = targets
        .iter()
        .any(|t| *t == ELEMENT_DMG_WILDCARD || t.contains(DMG_BONUS_SUFFIX));
    if cost == CostTier::Three && main == STAT_ATK_PERCENT && wants_damage {
        return Consistency {
            penalty: PENALTY_ACCEPTABLE,
            message: Some("攻撃力%は属性ダメージに次ぐ有力な選択肢です（許容範囲）".to_string()),
        };
    }

    Consistency {
        penalty: PENALTY_MISMATCH,
        message: Some(format!(
            "メインステータスが一致しません（理想：{}）",
            targets.join(" / ")
        )),
    }
}

/// Crit rate above this is wasted beyond rounding slack.
const CRIT_RATE_OVERCAP: f64 = 105.0;
const CRIT_RATE_CAP: f64 = 100.0;
/// Displayed crit damage includes this base.
const CRIT_DMG_BASE: f64 = 100.0;
/// Both crit stats must exceed this before the ratio is judged.
const CRIT_MIN_FOR_RATIO: f64 = 5.0;
/// Allowed shortfall against the 1:2 crit ratio.
const CRIT_RATIO_TOLERANCE: f64 = 0.8;
const ER_TOLERANCE: f64 = 0.9;
const ATK_PERCENT_TOLERANCE: f64 = 0.8;

/// Rule-based hints from estimated totals and the ideal targets.
pub struct AdviceGenerator<'a> {
    ideal: &'a BTreeMap<String, f64>,
}

impl<'a> AdviceGenerator<'a> {
    pub fn new(ideal: &'a BTreeMap<String, f64>) -> Self {
        Self { ideal }
    }

    /// Returns hints in a fixed order: crit ratio, then energy regen, then attack%.
    ///
    /// Without ideal targets there is nothing to compare against and no
    /// hints are produced.
    pub fn generate(&self, estimated: &BTreeMap<String, f64>) -> Vec<String> {
        let mut advice = Vec::new();
        if self.ideal.is_empty() {
            return advice;
        }

        self.check_crit_ratio(estimated, &mut advice);

        if let (Some(&target), Some(&current)) = (self.ideal.get(STAT_ER), estimated.get(STAT_ER)) {
            if current < target * ER_TOLERANCE {
                advice.push(format!("{}が足りていません（目標: {:.1}%）", STAT_ER, target));
            }
        }

        if let (Some(&target), Some(&current)) = (
            self.ideal.get(STAT_ATK_PERCENT),
            estimated.get(STAT_ATK_PERCENT),
        ) {
            if current < target * ATK_PERCENT_TOLERANCE {
                advice.push(format!("{}を稼ぐとダメージが伸びます", STAT_ATK_PERCENT));
            }
        }

        advice
    }

    /// Ideal crit damage above the base is twice the crit rate.
    fn check_crit_ratio(&self, estimated: &BTreeMap<String, f64>, advice: &mut Vec<String>) {
        let rate = estimated.get(STAT_CRIT_RATE).copied().unwrap_or(0.0);
        let dmg = estimated.get(STAT_CRIT_DMG).copied().unwrap_or(0.0);
        let adj_dmg = (dmg - CRIT_DMG_BASE).max(0.0);

        if rate <= CRIT_MIN_FOR_RATIO || adj_dmg <= CRIT_MIN_FOR_RATIO {
            return;
        }

        if rate > CRIT_RATE_OVERCAP {
            advice.push(
                "会心率が100%を大きく超えています。過剰分を会心ダメージ等に振り分けましょう"
                    .to_string(),
            );
        }
        let effective_rate = rate.min(CRIT_RATE_CAP);

        if adj_dmg < effective_rate * 2.0 * CRIT_RATIO_TOLERANCE {
            advice.push("会心ダメージを優先的に稼ぐのが効率的です".to_string());
        } else if effective_rate < (adj_dmg / 2.0) * CRIT_RATIO_TOLERANCE
            && effective_rate < CRIT_RATE_CAP
        {
            advice.push("会心率をもう少し上げると期待値が伸びます".to_string());
        }
    }
}
