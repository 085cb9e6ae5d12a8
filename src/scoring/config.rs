//! Numeric scoring configuration loaded from calculation_config.json.
//!
//! If the config file doesn't exist, default values are used. Every field
//! falls back to its default on its own, so a partial file only overrides
//! what it names.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::gamedata::GameData;
use crate::stats::*;

/// Threshold used when a stat has no entry for a roll-quality tier.
pub const MISSING_RANGE_THRESHOLD: f64 = 999.0;

/// Effective-stats bonus for counts the table doesn't list.
const DEFAULT_BONUS: f64 = 0.5;

/// All tables and constants the scoring methods read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigBundle {
    /// Highest single roll per stat
    pub substat_max_values: BTreeMap<String, f64>,
    /// Flat main-stat contribution of the normalized method
    pub main_stat_multiplier: f64,
    pub roll_quality: RollQualityConfig,
    pub effective_stats: EffectiveStatsConfig,
    pub cv_weights: CvWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollQualityConfig {
    /// Tier thresholds per stat. Stats without an entry are not rated.
    pub ranges: BTreeMap<String, RollRanges>,
    pub points: RollPoints,
    /// Weight for stats missing from the character's weights
    pub default_weight: f64,
}

/// Minimum value for each roll tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollRanges {
    #[serde(rename = "Max")]
    pub max: f64,
    #[serde(rename = "Good")]
    pub good: f64,
    #[serde(rename = "Low")]
    pub low: f64,
}

/// Points awarded per roll tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollPoints {
    #[serde(rename = "Max")]
    pub max: f64,
    #[serde(rename = "Good")]
    pub good: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Default")]
    pub fallback: f64,
}

/// In the file, the fallback bonus lives in the bonus table under
/// `"default"`, next to the per-count entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EffectiveStatsFile", into = "EffectiveStatsFile")]
pub struct EffectiveStatsConfig {
    /// Minimum weight for a substat to count as effective
    pub threshold: f64,
    pub base_multiplier: f64,
    /// Bonus factor by number of effective substats
    pub bonus_multiplier: BTreeMap<u32, f64>,
    /// Bonus factor for counts missing from `bonus_multiplier`
    pub bonus_default: f64,
}

const BONUS_DEFAULT_KEY: &str = "default";

/// On-disk shape of `EffectiveStatsConfig`.
#[derive(Serialize, Deserialize)]
#[serde(default)]
struct EffectiveStatsFile {
    threshold: f64,
    base_multiplier: f64,
    bonus_multiplier: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bonus_default: Option<f64>,
}

impl Default for EffectiveStatsFile {
    fn default() -> Self {
        EffectiveStatsConfig::default().into()
    }
}

impl From<EffectiveStatsFile> for EffectiveStatsConfig {
    fn from(file: EffectiveStatsFile) -> Self {
        let mut bonus_default = file.bonus_default;
        let mut bonus_multiplier = BTreeMap::new();
        for (key, factor) in file.bonus_multiplier {
            if key == BONUS_DEFAULT_KEY {
                bonus_default = Some(factor);
                continue;
            }
            match key.trim().parse::<u32>() {
                Ok(count) => {
                    bonus_multiplier.insert(count, factor);
                }
                Err(_) => crate::log(&format!(
                    "Warning: ignoring bonus_multiplier key \"{}\"",
                    key
                )),
            }
        }
        Self {
            threshold: file.threshold,
            base_multiplier: file.base_multiplier,
            bonus_multiplier,
            bonus_default: bonus_default.unwrap_or(DEFAULT_BONUS),
        }
    }
}

impl From<EffectiveStatsConfig> for EffectiveStatsFile {
    fn from(config: EffectiveStatsConfig) -> Self {
        let mut bonus_multiplier: BTreeMap<String, f64> = config
            .bonus_multiplier
            .into_iter()
            .map(|(count, factor)| (count.to_string(), factor))
            .collect();
        bonus_multiplier.insert(BONUS_DEFAULT_KEY.to_string(), config.bonus_default);
        Self {
            threshold: config.threshold,
            base_multiplier: config.base_multiplier,
            bonus_multiplier,
            bonus_default: None,
        }
    }
}

/// Coefficients of the crit-value method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvWeights {
    pub crit_rate: f64,
    pub crit_dmg: f64,
    pub atk_percent: f64,
    pub atk_flat_divisor: f64,
    pub atk_flat_multiplier: f64,
    pub er: f64,
    pub dmg_bonus: f64,
    /// Character weight for damage bonuses missing from the profile
    pub dmg_bonus_default_weight: f64,
}

impl Default for ConfigBundle {
    fn default() -> Self {
        Self {
            substat_max_values: BTreeMap::new(),
            main_stat_multiplier: 15.0,
            roll_quality: RollQualityConfig::default(),
            effective_stats: EffectiveStatsConfig::default(),
            cv_weights: CvWeights::default(),
        }
    }
}

impl Default for RollQualityConfig {
    fn default() -> Self {
        let mut ranges = BTreeMap::new();
        let mut add = |stat: &str, max: f64, good: f64, low: f64| {
            ranges.insert(stat.to_string(), RollRanges { max, good, low });
        };
        add(STAT_CRIT_RATE, 9.9, 8.1, 6.9);
        add(STAT_CRIT_DMG, 19.8, 16.2, 13.8);
        add(STAT_ATK_PERCENT, 10.9, 8.6, 7.1);
        add(STAT_ATK_FLAT, 60.0, 50.0, 40.0);
        add(STAT_HP_PERCENT, 10.9, 8.6, 7.1);
        add(STAT_HP_FLAT, 540.0, 470.0, 390.0);
        add(STAT_DEF_PERCENT, 13.8, 10.9, 9.0);
        add(STAT_DEF_FLAT, 60.0, 50.0, 40.0);
        add(STAT_ER, 11.6, 9.2, 7.6);
        for stat in [
            STAT_BASIC_DMG_BONUS,
            STAT_HEAVY_DMG_BONUS,
            STAT_SKILL_DMG_BONUS,
            STAT_LIBERATION_DMG_BONUS,
        ] {
            add(stat, 10.9, 8.6, 7.1);
        }

        Self {
            ranges,
            points: RollPoints::default(),
            default_weight: 0.5,
        }
    }
}

impl Default for RollRanges {
    fn default() -> Self {
        Self {
            max: MISSING_RANGE_THRESHOLD,
            good: MISSING_RANGE_THRESHOLD,
            low: MISSING_RANGE_THRESHOLD,
        }
    }
}

impl Default for RollPoints {
    fn default() -> Self {
        Self {
            max: 3.0,
            good: 2.0,
            low: 1.0,
            fallback: 0.5,
        }
    }
}

impl Default for EffectiveStatsConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            base_multiplier: 20.0,
            bonus_multiplier: [(5, 1.5), (4, 1.2), (3, 1.0), (2, 0.8), (1, 0.6)]
                .into_iter()
                .collect(),
            bonus_default: DEFAULT_BONUS,
        }
    }
}

impl Default for CvWeights {
    fn default() -> Self {
        Self {
            crit_rate: 2.0,
            crit_dmg: 1.0,
            atk_percent: 1.1,
            atk_flat_divisor: 10.0,
            atk_flat_multiplier: 1.2,
            er: 0.5,
            dmg_bonus: 1.1,
            dmg_bonus_default_weight: 0.5,
        }
    }
}

impl RollRanges {
    /// Points for `value` under these thresholds.
    pub fn points_for(&self, value: f64, points: &RollPoints) -> f64 {
        if value >= self.max {
            points.max
        } else if value >= self.good {
            points.good
        } else if value >= self.low {
            points.low
        } else {
            points.fallback
        }
    }
}

impl EffectiveStatsConfig {
    pub fn bonus_for(&self, effective_count: u32) -> f64 {
        self.bonus_multiplier
            .get(&effective_count)
            .copied()
            .unwrap_or(self.bonus_default)
    }
}

impl ConfigBundle {
    /// Defaults with the max-roll table taken from the game data.
    pub fn for_game(game: &GameData) -> Self {
        Self {
            substat_max_values: game.substat_max_values.clone(),
            ..Self::default()
        }
    }

    /// Max roll for `stat`. Unknown or non-positive entries count as 1.
    pub fn max_value(&self, stat: &str) -> f64 {
        match self.substat_max_values.get(stat) {
            Some(&max) if max > 0.0 => max,
            _ => 1.0,
        }
    }

    /// Load config from file, or return defaults if file doesn't exist.
    ///
    /// An empty max-roll table in the file keeps `fallback_max_values`.
    pub fn load(config_path: &Path, fallback_max_values: &BTreeMap<String, f64>) -> Self {
        let mut config = Self::default();
        if config_path.exists() {
            match fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str::<Self>(&content) {
                    Ok(loaded) => {
                        crate::log(&format!(
                            "Loaded calculation config from {}",
                            config_path.display()
                        ));
                        config = loaded;
                    }
                    Err(e) => {
                        crate::log(&format!(
                            "Failed to parse calculation config: {}. Using defaults.",
                            e
                        ));
                    }
                },
                Err(e) => {
                    crate::log(&format!(
                        "Failed to read calculation config: {}. Using defaults.",
                        e
                    ));
                }
            }
        }
        if config.substat_max_values.is_empty() {
            config.substat_max_values = fallback_max_values.clone();
        }
        config
    }

    /// Save default config to file (for reference).
    pub fn save_default(config_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&Self::default())?;
        fs::write(config_path, json)
            .context(format!("Failed to write config: {}", config_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_documented_defaults() {
        let config = ConfigBundle::default();
        assert_eq!(config.main_stat_multiplier, 15.0);
        assert_eq!(config.roll_quality.points.max, 3.0);
        assert_eq!(config.roll_quality.points.fallback, 0.5);
        assert_eq!(config.effective_stats.threshold, 0.5);
        assert_eq!(config.effective_stats.base_multiplier, 20.0);
        assert_eq!(config.cv_weights.crit_rate, 2.0);
        assert_eq!(config.cv_weights.atk_flat_divisor, 10.0);
    }

    #[test]
    fn test_missing_range_never_reached() {
        let ranges = RollRanges::default();
        let points = RollPoints::default();
        assert_eq!(ranges.points_for(500.0, &points), 0.5);
    }

    #[test]
    fn test_roll_tiers() {
        let config = RollQualityConfig::default();
        let crit = config.ranges[STAT_CRIT_RATE];
        let p = &config.points;
        assert_eq!(crit.points_for(10.5, p), 3.0);
        assert_eq!(crit.points_for(8.1, p), 2.0);
        assert_eq!(crit.points_for(7.5, p), 1.0);
        assert_eq!(crit.points_for(6.3, p), 0.5);
    }

    #[test]
    fn test_bonus_fallback() {
        let es = EffectiveStatsConfig::default();
        assert_eq!(es.bonus_for(5), 1.5);
        assert_eq!(es.bonus_for(0), 0.5);
        assert_eq!(es.bonus_for(9), 0.5);
    }

    #[test]
    fn test_max_value_defaults_to_one() {
        let mut config = ConfigBundle::default();
        config.substat_max_values.insert("zero".to_string(), 0.0);
        assert_eq!(config.max_value("unknown"), 1.0);
        assert_eq!(config.max_value("zero"), 1.0);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let fallback: BTreeMap<String, f64> = [("HP".to_string(), 580.0)].into_iter().collect();
        let config = ConfigBundle::load(Path::new("/nonexistent/calc.json"), &fallback);
        assert_eq!(config.main_stat_multiplier, 15.0);
        assert_eq!(config.substat_max_values, fallback);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"main_stat_multiplier": 10.0, "cv_weights": {{"crit_rate": 2.5}},
                "effective_stats": {{"bonus_multiplier": {{"5": 2.0}}}}}}"#
        )
        .unwrap();

        let config = ConfigBundle::load(file.path(), &BTreeMap::new());
        assert_eq!(config.main_stat_multiplier, 10.0);
        assert_eq!(config.cv_weights.crit_rate, 2.5);
        assert_eq!(config.cv_weights.crit_dmg, 1.0);
        assert_eq!(config.effective_stats.bonus_for(5), 2.0);
        assert_eq!(config.effective_stats.bonus_for(4), 0.5);
        assert!(!config.roll_quality.ranges.is_empty());
    }

    #[test]
    fn test_load_default_inside_bonus_table() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"main_stat_multiplier": 10.0,
                "effective_stats": {{"bonus_multiplier": {{"5": 2.0, "default": 0.3}}}}}}"#
        )
        .unwrap();

        let config = ConfigBundle::load(file.path(), &BTreeMap::new());
        assert_eq!(config.main_stat_multiplier, 10.0);
        assert_eq!(config.effective_stats.threshold, 0.5);
        assert_eq!(config.effective_stats.bonus_for(5), 2.0);
        assert_eq!(config.effective_stats.bonus_for(4), 0.3);
        assert!(!config.effective_stats.bonus_multiplier.contains_key(&0));
    }

    #[test]
    fn test_bonus_table_written_with_default_key() {
        let json = serde_json::to_value(EffectiveStatsConfig::default()).unwrap();
        assert_eq!(json["bonus_multiplier"]["default"], 0.5);
        assert_eq!(json["bonus_multiplier"]["5"], 1.5);
        assert!(json.get("bonus_default").is_none());
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let config = ConfigBundle::load(file.path(), &BTreeMap::new());
        assert_eq!(config, ConfigBundle::default());
    }

    #[test]
    fn test_save_default_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calculation_config.json");
        ConfigBundle::save_default(&path).unwrap();
        let config = ConfigBundle::load(&path, &BTreeMap::new());
        assert_eq!(config, ConfigBundle::default());
    }
}
