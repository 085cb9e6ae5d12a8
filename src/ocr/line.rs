use anyhow::Result;
use regex::Regex;

use super::alias::AliasIndex;
use super::validate::{Correction, ValueValidator};
use super::SubStat;

/// `label` + whitespace + `number[%]`. The label is matched lazily so the
/// first number preceded by whitespace ends it.
const LABEL_NUMBER_PATTERN: &str = r"(.+?)\s+([\d.]+(?:\s*[%％])?)";

/// First run of digits and dots.
const NUMBER_PATTERN: &str = r"[\d.]+";

/// Candidate stat, number text and percent flag read from one line.
#[derive(Clone, Debug, PartialEq)]
pub struct RawMatch {
    pub stat: String,
    pub number: String,
    pub is_percent: bool,
}

fn has_percent(text: &str) -> bool {
    text.contains('%') || text.contains('％')
}

/// Extracts one substat from a normalized line.
pub struct LineParser<'a> {
    index: &'a AliasIndex,
    validator: ValueValidator<'a>,
    label_number: Regex,
    number: Regex,
}

impl<'a> LineParser<'a> {
    pub fn new(index: &'a AliasIndex, validator: ValueValidator<'a>) -> Result<Self> {
        Ok(Self {
            index,
            validator,
            label_number: Regex::new(LABEL_NUMBER_PATTERN)?,
            number: Regex::new(NUMBER_PATTERN)?,
        })
    }

    /// Finds the stat and number in a line without validating the value.
    ///
    /// Tries an exact label match on a `label number` split first. If no
    /// label matches, falls back to the first alias contained anywhere in
    /// the line, which covers labels glued to their number (`攻撃力150`).
    pub fn match_line(&self, line: &str) -> Option<RawMatch> {
        if let Some(caps) = self.label_number.captures(line) {
            let label = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            let number_text = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

            if let Some(stat) = self.index.find_exact(label) {
                return self.number.find(number_text).map(|num| RawMatch {
                    stat: stat.to_string(),
                    number: num.as_str().to_string(),
                    is_percent: has_percent(number_text),
                });
            }
        }

        let stat = self.index.find_contained(line)?;
        self.number.find(line).map(|num| RawMatch {
            stat: stat.to_string(),
            number: num.as_str().to_string(),
            is_percent: has_percent(line),
        })
    }

    /// Matches a line and validates its value.
    ///
    /// Returns None for lines without a known stat. A value that is not a
    /// number is dropped with a warning.
    pub fn parse_line(&self, line: &str) -> Option<SubStat> {
        let raw = self.match_line(line)?;
        let correction = self
            .validator
            .validate(&raw.stat, &raw.number, raw.is_percent);
        Self::accept(line, correction)
    }

    fn accept(line: &str, correction: Correction) -> Option<SubStat> {
        match correction.value() {
            Some(value) => Some(SubStat {
                stat: correction.stat,
                value,
                is_percent: correction.is_percent,
            }),
            None => {
                crate::log(&format!(
                    "Warning: Dropping '{}': '{}' is not a number",
                    line, correction.text
                ));
                None
            }
        }
    }
}
