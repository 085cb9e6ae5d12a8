//! OCR text parsing.
//!
//! Turns the raw text of an Echo card into substats, cost tier and main stat:
//! - `normalize`: per-line cleanup
//! - `alias`: longest-first alias table
//! - `line`: label/number extraction with substring fallback
//! - `validate`: flat/percent and lost-decimal corrections
//! - `detect`: cost and main stat in the card header

pub mod alias;
pub mod detect;
pub mod line;
pub mod normalize;
pub mod validate;

pub use alias::AliasIndex;
pub use detect::{CostDetector, MainStatDetector};
pub use line::LineParser;
pub use normalize::TextNormalizer;
pub use validate::ValueValidator;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::echo::CostTier;
use crate::gamedata::GameData;
use crate::stats::MAX_SUBSTATS;

/// One substat roll.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubStat {
    pub stat: String,
    pub value: f64,
    pub is_percent: bool,
}

/// Everything read from one OCR text.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub substats: Vec<SubStat>,
    pub cost: Option<CostTier>,
    pub main_stat: Option<String>,
    /// Auto-fill messages for the user
    pub log: Vec<String>,
}

/// Parser for Echo card text.
///
/// Holds only read-only tables, so one instance can serve any number of
/// threads.
pub struct OcrParser<'a> {
    normalizer: TextNormalizer,
    lines: LineParser<'a>,
    cost: CostDetector,
    main_stat: MainStatDetector<'a>,
}

impl<'a> OcrParser<'a> {
    pub fn new(index: &'a AliasIndex, game: &'a GameData) -> Result<Self> {
        Ok(Self {
            normalizer: TextNormalizer::new()?,
            lines: LineParser::new(index, ValueValidator::new(&game.substat_max_values))?,
            cost: CostDetector::new()?,
            main_stat: MainStatDetector::new(&game.main_stat_options, index),
        })
    }

    /// Parses one OCR text. Empty or blank text yields an empty result.
    ///
    /// Substats are read from the last five non-empty lines, where the card
    /// lists them. Unrecognized lines are skipped.
    pub fn parse(&self, raw_text: &str) -> ParseResult {
        let lines = self.normalizer.normalize_lines(raw_text);
        if lines.is_empty() {
            return ParseResult::default();
        }

        let start = lines.len().saturating_sub(MAX_SUBSTATS);
        let mut substats = Vec::new();
        let mut log = Vec::new();

        for (i, line) in lines[start..].iter().enumerate() {
            if let Some(sub) = self.lines.parse_line(line) {
                log.push(format!(
                    "OCR auto-fill: Sub{} -> {} {}{}",
                    i + 1,
                    sub.stat,
                    sub.value,
                    if sub.is_percent { "%" } else { "" }
                ));
                substats.push(sub);
            }
        }

        let cost = self.cost.detect(&lines);
        let main_stat = self.main_stat.detect(&lines, cost);

        if let Some(cost) = cost {
            log.push(format!("OCR auto-fill: Cost -> {}", cost));
        }
        if let Some(main) = &main_stat {
            log.push(format!("OCR auto-fill: Main Stat -> {}", main));
        }

        ParseResult {
            substats,
            cost,
            main_stat,
            log,
        }
    }

    /// Normalizes and parses a single line.
    pub fn parse_line(&self, line: &str) -> Option<SubStat> {
        self.lines.parse_line(&self.normalizer.normalize(line))
    }
}
