use anyhow::Result;
use regex::Regex;

/// Leading bullets, dots and separators that OCR picks up from the card
/// layout (・ ･ • · ● ◦ . : *), plus any whitespace around them.
const LEADING_MARKERS: &str = r"^[\s・･•·●◦\.:\*]+";

/// Any whitespace run, including full-width spaces.
const WHITESPACE_RUN: &str = r"\s+";

/// A digit followed by optional whitespace and a half- or full-width percent sign.
const SPACED_PERCENT: &str = r"(\d)\s*([%％])";

/// Cleans one raw OCR line.
pub struct TextNormalizer {
    leading: Regex,
    whitespace: Regex,
    percent: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            leading: Regex::new(LEADING_MARKERS)?,
            whitespace: Regex::new(WHITESPACE_RUN)?,
            percent: Regex::new(SPACED_PERCENT)?,
        })
    }

    /// Strips leading markers, collapses whitespace, joins `6.9 %` into
    /// `6.9%` and trims. Normalizing twice gives the same string.
    pub fn normalize(&self, line: &str) -> String {
        let stripped = self.leading.replace(line, "");
        let collapsed = self.whitespace.replace_all(&stripped, " ");
        let joined = self.percent.replace_all(&collapsed, "$1$2");
        joined.trim().to_string()
    }

    /// Normalizes every line of `text`, dropping lines that end up empty.
    pub fn normalize_lines(&self, text: &str) -> Vec<String> {
        text.lines()
            .map(|line| self.normalize(line))
            .filter(|line| !line.is_empty())
            .collect()
    }
}
