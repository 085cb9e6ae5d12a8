//! Game tables and character profiles.
//!
//! The tables are read-only inputs to the parser and the scoring engine:
//! max roll values, main-stat options per cost tier, the stat alias map and
//! the character presets. A copy ships embedded in the binary; a JSON file
//! with the same layout can replace it at runtime.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::stats::STAT_ATK_FLAT;

const BUILTIN_GAME_DATA: &str = include_str!("../data/game_data.json");

/// Keys that a game data file must define.
const ESSENTIAL_KEYS: [&str; 3] = ["substat_max_values", "main_stat_options", "stat_aliases"];

/// Main-stat target for one equipment slot: a single stat or a list of
/// equally good stats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MainStatTarget {
    One(String),
    Many(Vec<String>),
}

impl MainStatTarget {
    pub fn stats(&self) -> Vec<&str> {
        match self {
            Self::One(stat) => vec![stat.as_str()],
            Self::Many(stats) => stats.iter().map(|s| s.as_str()).collect(),
        }
    }
}

/// All game tables.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameData {
    /// Highest single roll for each substat
    pub substat_max_values: BTreeMap<String, f64>,
    /// Eligible main stats per cost tier ("1", "3", "4")
    pub main_stat_options: BTreeMap<String, Vec<String>>,
    /// Canonical stat name -> OCR spellings
    pub stat_aliases: BTreeMap<String, Vec<String>>,
    /// Preset weight profiles by character or template name
    pub character_stat_weights: BTreeMap<String, BTreeMap<String, f64>>,
    /// Preset main-stat targets by character, keyed by slot ("cost4_echo", "3", ...)
    pub character_main_stats: BTreeMap<String, BTreeMap<String, MainStatTarget>>,
}

impl GameData {
    /// Returns the tables embedded at build time.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_GAME_DATA).context("Embedded game data is corrupted")
    }

    /// Parses game data from JSON, rejecting documents without the essential tables.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).context("Game data is not valid JSON")?;

        for key in ESSENTIAL_KEYS {
            if value.get(key).is_none() {
                return Err(anyhow!("Corrupted game data: Missing '{}'", key));
            }
        }

        serde_json::from_value(value).context("Game data has an unexpected layout")
    }

    /// Loads game data from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read game data: {}", path.display()))?;
        let data = Self::from_json_str(&content)?;
        crate::log(&format!("Loaded game data from {}", path.display()));
        Ok(data)
    }

    /// Builds a profile from the presets for `name`.
    ///
    /// Returns None if neither weights nor main-stat targets exist for it.
    pub fn preset_profile(&self, name: &str) -> Option<CharacterProfile> {
        let weights = self.character_stat_weights.get(name);
        let main_stats = self.character_main_stats.get(name);
        if weights.is_none() && main_stats.is_none() {
            return None;
        }

        Some(CharacterProfile {
            name: name.to_string(),
            weights: weights.cloned().unwrap_or_default(),
            main_stats: main_stats.cloned().unwrap_or_default(),
            ..CharacterProfile::default()
        })
    }
}

/// Settings for one character.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterProfile {
    pub name: String,
    /// Stat weights used by every scoring method
    pub weights: BTreeMap<String, f64>,
    /// Ideal main stat per slot
    pub main_stats: BTreeMap<String, MainStatTarget>,
    /// Stats contributed by everything except the echo being scored
    pub stat_offsets: BTreeMap<String, f64>,
    /// Base values of the character plus weapon
    pub base_stats: BTreeMap<String, f64>,
    /// Target totals the build aims for
    pub ideal_stats: BTreeMap<String, f64>,
    /// Stat the character's damage scales with (flat name: 攻撃力, HP or 防御力)
    pub scaling_stat: String,
}

impl Default for CharacterProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            weights: BTreeMap::new(),
            main_stats: BTreeMap::new(),
            stat_offsets: BTreeMap::new(),
            base_stats: BTreeMap::new(),
            ideal_stats: BTreeMap::new(),
            scaling_stat: STAT_ATK_FLAT.to_string(),
        }
    }
}

impl CharacterProfile {
    /// Loads a profile from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read character profile: {}", path.display()))?;
        let profile: Self = serde_json::from_str(&content)
            .context(format!("Failed to parse character profile: {}", path.display()))?;
        crate::log(&format!(
            "Loaded profile '{}' from {}",
            profile.name,
            path.display()
        ));
        Ok(profile)
    }
}
