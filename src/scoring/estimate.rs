//! Estimated character totals with the Echo equipped.

use std::collections::BTreeMap;

use crate::echo::Echo;
use crate::gamedata::CharacterProfile;
use crate::stats::percent_variant;

/// Key of the final scaling-stat value, e.g. `Total 攻撃力`.
pub fn total_key(scaling_stat: &str) -> String {
    format!("Total {}", scaling_stat)
}

/// Key of the goal progress percentage, e.g. `Goal 攻撃力 %`.
pub fn goal_key(scaling_stat: &str) -> String {
    format!("Goal {} %", scaling_stat)
}

/// Substats plus the profile's offsets, per stat.
///
/// If the profile has a base value for its scaling stat, adds the final
/// value `base * (1 + percent / 100) + flat` and, with an ideal target for
/// the stat, the progress towards it in percent.
pub fn estimate_stats(echo: &Echo, profile: &CharacterProfile) -> BTreeMap<String, f64> {
    let mut estimated = profile.stat_offsets.clone();
    for (stat, value) in &echo.substats {
        *estimated.entry(stat.clone()).or_insert(0.0) += value;
    }

    let scaling = profile.scaling_stat.as_str();
    let Some(&base) = profile.base_stats.get(scaling) else {
        return estimated;
    };

    let percent_sum = percent_variant(scaling)
        .and_then(|p| estimated.get(p))
        .copied()
        .unwrap_or(0.0);
    let flat_sum = estimated.get(scaling).copied().unwrap_or(0.0);
    let total = base * (1.0 + percent_sum / 100.0) + flat_sum;
    estimated.insert(total_key(scaling), total);

    if let Some(&target) = profile.ideal_stats.get(scaling) {
        if target > 0.0 {
            estimated.insert(goal_key(scaling), total / target * 100.0);
        }
    }

    estimated
}
