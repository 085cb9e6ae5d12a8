use anyhow::Result;
use regex::Regex;
use std::collections::BTreeMap;

use super::alias::AliasIndex;
use crate::echo::CostTier;

/// Cost marker followed by an optional separator and the cost digit.
const COST_PATTERN: &str = r"(?:COST|Cost|cost|コスト)[\s:.]*([134])";

/// Only the card header carries the cost.
const COST_SEARCH_LINES: usize = 3;

/// The main stat sits near the top of the card.
const MAIN_STAT_SEARCH_LINES: usize = 10;

/// Finds the cost tier in the first three lines.
pub struct CostDetector {
    pattern: Regex,
}

impl CostDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(COST_PATTERN)?,
        })
    }

    /// Returns the first cost found in the leading lines.
    ///
    /// Lines past the third are never searched: substat numbers further
    /// down would produce false positives.
    pub fn detect(&self, lines: &[String]) -> Option<CostTier> {
        lines
            .iter()
            .filter(|line| !line.trim().is_empty())
            .take(COST_SEARCH_LINES)
            .find_map(|line| {
                self.pattern
                    .captures(line)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().chars().next())
                    .and_then(CostTier::from_digit)
            })
    }
}

/// Finds the main stat among the stats eligible for the detected cost.
pub struct MainStatDetector<'a> {
    options: &'a BTreeMap<String, Vec<String>>,
    index: &'a AliasIndex,
}

impl<'a> MainStatDetector<'a> {
    pub fn new(options: &'a BTreeMap<String, Vec<String>>, index: &'a AliasIndex) -> Self {
        Self { options, index }
    }

    /// Candidate main stats: the cost tier's list, or every tier's list
    /// (first occurrence order) when the cost is unknown or has no list.
    pub fn candidates(&self, cost: Option<CostTier>) -> Vec<&'a str> {
        if let Some(list) = cost.and_then(|c| self.options.get(c.as_str())) {
            return list.iter().map(|s| s.as_str()).collect();
        }

        let mut all: Vec<&'a str> = Vec::new();
        for stat in self.options.values().flatten() {
            if !all.contains(&stat.as_str()) {
                all.push(stat.as_str());
            }
        }
        all
    }

    /// Scans the first ten lines; the first line naming a candidate wins.
    ///
    /// A candidate matches by its name, any of its aliases, or for `X%`
    /// candidates the bare `X`.
    pub fn detect(&self, lines: &[String], cost: Option<CostTier>) -> Option<String> {
        let candidates = self.candidates(cost);

        for line in lines.iter().take(MAIN_STAT_SEARCH_LINES) {
            for &stat in &candidates {
                if self.line_names(line, stat) {
                    return Some(stat.to_string());
                }
            }
        }
        None
    }

    fn line_names(&self, line: &str, stat: &str) -> bool {
        if line.contains(stat) {
            return true;
        }
        if self.index.aliases_of(stat).any(|alias| !alias.is_empty() && line.contains(alias)) {
            return true;
        }
        match stat.strip_suffix('%') {
            Some(base) if !base.is_empty() => line.contains(base),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.to_string()).collect()
    }

    fn options() -> BTreeMap<String, Vec<String>> {
        [
            ("4", vec!["会心率", "会心ダメージ", "攻撃力%"]),
            ("3", vec!["属性ダメージ", "攻撃力%"]),
            ("1", vec!["攻撃力%", "HP%", "防御力%"]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into_iter().map(String::from).collect()))
        .collect()
    }

    fn aliases() -> BTreeMap<String, Vec<String>> {
        [
            ("会心率", vec!["クリティカル率", "クリ率"]),
            ("会心ダメージ", vec!["クリティカルダメージ"]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into_iter().map(String::from).collect()))
        .collect()
    }

    #[test]
    fn test_cost_on_first_line() {
        let d = CostDetector::new().unwrap();
        assert_eq!(d.detect(&lines("COST 4\n攻撃力 33%")), Some(CostTier::Four));
        assert_eq!(d.detect(&lines("Cost: 3")), Some(CostTier::Three));
        assert_eq!(d.detect(&lines("名前\nコスト1")), Some(CostTier::One));
    }

    #[test]
    fn test_cost_outside_window_ignored() {
        let d = CostDetector::new().unwrap();
        let text = "名前\nLv.25\n攻撃力 33%\nCOST 4";
        assert_eq!(d.detect(&lines(text)), None);
    }

    #[test]
    fn test_cost_window_skips_blank_lines() {
        let d = CostDetector::new().unwrap();
        let text = "名前\n\n  \nLv.25\n攻撃力 33%\nCOST 4";
        assert_eq!(d.detect(&lines(text)), None);
        let text = "名前\n\n  \nCOST 4";
        assert_eq!(d.detect(&lines(text)), Some(CostTier::Four));
    }

    #[test]
    fn test_cost_invalid_digit() {
        let d = CostDetector::new().unwrap();
        assert_eq!(d.detect(&lines("COST 2")), None);
        assert_eq!(d.detect(&lines("")), None);
    }

    #[test]
    fn test_main_stat_direct_match() {
        let opts = options();
        let index = AliasIndex::new(&aliases());
        let d = MainStatDetector::new(&opts, &index);
        let found = d.detect(&lines("COST 4\n会心率\n攻撃力"), Some(CostTier::Four));
        assert_eq!(found.as_deref(), Some("会心率"));
    }

    #[test]
    fn test_main_stat_alias_match() {
        let opts = options();
        let index = AliasIndex::new(&aliases());
        let d = MainStatDetector::new(&opts, &index);
        let found = d.detect(&lines("Cost: 4\nクリティカル率\nHP"), Some(CostTier::Four));
        assert_eq!(found.as_deref(), Some("会心率"));
    }

    #[test]
    fn test_main_stat_without_cost() {
        let opts = options();
        let index = AliasIndex::new(&aliases());
        let d = MainStatDetector::new(&opts, &index);
        let found = d.detect(&lines("???\n属性ダメージ\nSub: ATK"), None);
        assert_eq!(found.as_deref(), Some("属性ダメージ"));
    }

    #[test]
    fn test_main_stat_outside_window_ignored() {
        let opts = options();
        let index = AliasIndex::new(&aliases());
        let d = MainStatDetector::new(&opts, &index);

        let mut text: Vec<String> = (1..=10).map(|i| format!("line {}", i)).collect();
        text.push("会心率".to_string());
        assert_eq!(d.detect(&text, Some(CostTier::Four)), None);

        text.remove(0);
        assert_eq!(
            d.detect(&text, Some(CostTier::Four)).as_deref(),
            Some("会心率")
        );
    }

    #[test]
    fn test_main_stat_earliest_line_wins() {
        let opts = options();
        let index = AliasIndex::new(&aliases());
        let d = MainStatDetector::new(&opts, &index);

        // 会心率 is listed before 会心ダメージ and 攻撃力%
        let found = d.detect(&lines("COST 4\n会心ダメージ\n会心率"), Some(CostTier::Four));
        assert_eq!(found.as_deref(), Some("会心ダメージ"));

        let found = d.detect(&lines("COST 4\n攻撃力 18%\nクリ率"), Some(CostTier::Four));
        assert_eq!(found.as_deref(), Some("攻撃力%"));
    }

    #[test]
    fn test_main_stat_not_found() {
        let opts = options();
        let index = AliasIndex::new(&aliases());
        let d = MainStatDetector::new(&opts, &index);
        let found = d.detect(&lines("Cost 1\nSome garbage text\nAnother line"), Some(CostTier::One));
        assert_eq!(found, None);
    }

    #[test]
    fn test_percent_candidate_matches_base_name() {
        let opts = options();
        let index = AliasIndex::new(&aliases());
        let d = MainStatDetector::new(&opts, &index);
        let found = d.detect(&lines("COST 1\nHP 2280"), Some(CostTier::One));
        assert_eq!(found.as_deref(), Some("HP%"));
    }

    #[test]
    fn test_candidates_union_dedup() {
        let opts = options();
        let index = AliasIndex::new(&aliases());
        let d = MainStatDetector::new(&opts, &index);
        let all = d.candidates(None);
        assert_eq!(all.iter().filter(|s| **s == "攻撃力%").count(), 1);
        assert_eq!(all.len(), 6);
    }
}
