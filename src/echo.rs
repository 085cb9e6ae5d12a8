//! Echo record consumed by the scoring engine.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

use crate::ocr::ParseResult;
use crate::stats::MAX_SUBSTATS;

/// Level of a fully upgraded Echo.
pub const MAX_LEVEL: u32 = 25;

/// Upper bound (exclusive) for a plausible substat value.
const MAX_PLAUSIBLE_VALUE: f64 = 1_000_000.0;

/// Cost tier of an Echo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CostTier {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
}

impl CostTier {
    /// Parses the cost digit shown on the Echo card.
    pub fn from_digit(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::One),
            '3' => Some(Self::Three),
            '4' => Some(Self::Four),
            _ => None,
        }
    }

    pub fn digit(self) -> char {
        match self {
            Self::One => '1',
            Self::Three => '3',
            Self::Four => '4',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::One => "1",
            Self::Three => "3",
            Self::Four => "4",
        }
    }
}

impl fmt::Display for CostTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One Echo: cost, main stat, and substat values keyed by canonical stat.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    pub cost: Option<CostTier>,
    pub main_stat: String,
    pub substats: BTreeMap<String, f64>,
    pub level: u32,
}

impl Echo {
    pub fn new(cost: Option<CostTier>, main_stat: &str, substats: BTreeMap<String, f64>) -> Self {
        Self {
            cost,
            main_stat: main_stat.to_string(),
            substats,
            level: MAX_LEVEL,
        }
    }

    /// Builds an Echo from a parse result.
    ///
    /// Returns None when no main stat was detected. A repeated stat keeps
    /// the later value.
    pub fn from_parse(result: &ParseResult) -> Option<Self> {
        let main_stat = result.main_stat.as_deref()?;
        let substats = result
            .substats
            .iter()
            .take(MAX_SUBSTATS)
            .map(|s| (s.stat.clone(), s.value))
            .collect();
        Some(Self::new(result.cost, main_stat, substats))
    }

    /// Builds an Echo from user-entered (stat, text) pairs.
    ///
    /// Values may carry `%`, `+` or spaces. Empty, unparsable and
    /// implausible values are skipped with a warning.
    pub fn from_entries(
        cost: Option<CostTier>,
        main_stat: &str,
        entries: &[(String, String)],
    ) -> Self {
        let mut substats = BTreeMap::new();

        for (stat, raw) in entries.iter().take(MAX_SUBSTATS) {
            if stat.is_empty() || raw.is_empty() {
                continue;
            }

            let clean: String = raw
                .chars()
                .filter(|c| !matches!(c, '%' | '％' | '+' | ' ' | '\u{3000}'))
                .collect();
            if clean.is_empty() {
                continue;
            }

            match clean.parse::<f64>() {
                Ok(val) if (0.0..MAX_PLAUSIBLE_VALUE).contains(&val) => {
                    substats.insert(stat.clone(), val);
                }
                Ok(val) => {
                    crate::log(&format!("Warning: Value out of range for '{}': '{}'", stat, val));
                }
                Err(_) => {
                    crate::log(&format!(
                        "Warning: Invalid numeric value for '{}': '{}'",
                        stat, raw
                    ));
                }
            }
        }

        Self::new(cost, main_stat, substats)
    }

    /// Hex SHA-256 over cost, main stat and the sorted substats.
    ///
    /// Two Echoes with identical rolls share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let cost = self.cost.map(|c| c.as_str()).unwrap_or("?");
        let subs = self
            .substats
            .iter()
            .map(|(k, v)| format!("{}:{:?}", k, v))
            .collect::<Vec<_>>()
            .join("|");
        let raw = format!("{}|{}|{}", cost, self.main_stat, subs);
        hex::encode(Sha256::digest(raw.as_bytes()))
    }
}

impl fmt::Display for Echo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cost = self.cost.map(|c| c.as_str()).unwrap_or("?");
        writeln!(f, "Cost {} - Level {}", cost, self.level)?;
        writeln!(f, "Main: {}", self.main_stat)?;
        write!(f, "Substats:")?;
        for (name, value) in &self.substats {
            write!(f, "\n  {}: {}", name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::SubStat;

    #[test]
    fn test_cost_from_digit() {
        assert_eq!(CostTier::from_digit('4'), Some(CostTier::Four));
        assert_eq!(CostTier::from_digit('3'), Some(CostTier::Three));
        assert_eq!(CostTier::from_digit('1'), Some(CostTier::One));
        assert_eq!(CostTier::from_digit('2'), None);
        assert_eq!(CostTier::Four.to_string(), "4");
    }

    #[test]
    fn test_from_parse_requires_main_stat() {
        let mut result = ParseResult {
            substats: vec![SubStat {
                stat: "クリティカル率".to_string(),
                value: 8.1,
                is_percent: true,
            }],
            cost: Some(CostTier::Four),
            main_stat: None,
            log: Vec::new(),
        };
        assert!(Echo::from_parse(&result).is_none());

        result.main_stat = Some("クリティカルダメージ".to_string());
        let echo = Echo::from_parse(&result).unwrap();
        assert_eq!(echo.cost, Some(CostTier::Four));
        assert_eq!(echo.substats.get("クリティカル率"), Some(&8.1));
        assert_eq!(echo.level, MAX_LEVEL);
    }

    #[test]
    fn test_from_entries_cleans_values() {
        let entries = vec![
            ("攻撃力%".to_string(), "10.1%".to_string()),
            ("攻撃力".to_string(), "+ 40".to_string()),
            ("共鳴効率".to_string(), "abc".to_string()),
            ("HP".to_string(), "".to_string()),
            ("防御力".to_string(), "-5".to_string()),
        ];
        let echo = Echo::from_entries(Some(CostTier::One), "攻撃力%", &entries);

        assert_eq!(echo.substats.len(), 2);
        assert_eq!(echo.substats.get("攻撃力%"), Some(&10.1));
        assert_eq!(echo.substats.get("攻撃力"), Some(&40.0));
    }

    #[test]
    fn test_fingerprint_order_independent() {
        let a = Echo::from_entries(
            Some(CostTier::Three),
            "焦熱ダメージアップ",
            &[
                ("クリティカル率".to_string(), "6.3".to_string()),
                ("攻撃力".to_string(), "50".to_string()),
            ],
        );
        let b = Echo::from_entries(
            Some(CostTier::Three),
            "焦熱ダメージアップ",
            &[
                ("攻撃力".to_string(), "50".to_string()),
                ("クリティカル率".to_string(), "6.3".to_string()),
            ],
        );
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let c = Echo::new(Some(CostTier::Four), "焦熱ダメージアップ", a.substats.clone());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
