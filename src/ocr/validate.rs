use std::collections::BTreeMap;

use crate::stats::{base_name, is_dual_form};

/// Below this value a flat/percent stat is read as the percent roll,
/// above it as the flat roll. Flat rolls of ATK, HP and DEF never go below 30.
const DUAL_FORM_SPLIT: f64 = 20.0;

/// Values above `max * MAGNITUDE_TRIGGER` are treated as a lost decimal point.
const MAGNITUDE_TRIGGER: f64 = 1.5;

/// A tenth of the value is accepted only if it lands within `max * MAGNITUDE_TOLERANCE`.
const MAGNITUDE_TOLERANCE: f64 = 1.1;

/// Outcome of validating one parsed value.
#[derive(Clone, Debug, PartialEq)]
pub struct Correction {
    pub stat: String,
    /// Value as displayed: one decimal for percent or decimal input, integer otherwise
    pub text: String,
    pub is_percent: bool,
}

impl Correction {
    /// Numeric value of `text`, or None if the input was never a number.
    pub fn value(&self) -> Option<f64> {
        self.text.parse().ok()
    }
}

/// Best-effort repair of OCR misreads using the max roll table.
pub struct ValueValidator<'a> {
    max_values: &'a BTreeMap<String, f64>,
}

impl<'a> ValueValidator<'a> {
    pub fn new(max_values: &'a BTreeMap<String, f64>) -> Self {
        Self { max_values }
    }

    /// Applies flat/percent disambiguation, then magnitude correction.
    ///
    /// Never fails: a value that cannot be parsed or corrected comes back unchanged.
    pub fn validate(&self, stat: &str, raw: &str, is_percent: bool) -> Correction {
        let Ok(mut val) = raw.parse::<f64>() else {
            return Correction {
                stat: stat.to_string(),
                text: raw.to_string(),
                is_percent,
            };
        };

        let (stat, is_percent) = Self::disambiguate(stat, val, is_percent);

        if let Some(&max) = self.max_values.get(&stat) {
            if max > 0.0 && val > max * MAGNITUDE_TRIGGER {
                let reduced = val / 10.0;
                if reduced <= max * MAGNITUDE_TOLERANCE {
                    val = reduced;
                }
            }
        }

        let text = if is_percent || raw.contains('.') {
            format!("{:.1}", val)
        } else {
            format!("{}", val.trunc() as i64)
        };

        Correction {
            stat,
            text,
            is_percent,
        }
    }

    /// Picks the flat or percent form of ATK/HP/DEF from the value's size.
    fn disambiguate(stat: &str, val: f64, is_percent: bool) -> (String, bool) {
        if !is_dual_form(stat) {
            return (stat.to_string(), is_percent);
        }

        let percent = if !is_percent && val < DUAL_FORM_SPLIT {
            true
        } else if is_percent && val > DUAL_FORM_SPLIT {
            false
        } else {
            is_percent || stat.ends_with('%')
        };

        let base = base_name(stat);
        let stat = if percent {
            format!("{}%", base)
        } else {
            base.to_string()
        };
        (stat, percent)
    }
}
