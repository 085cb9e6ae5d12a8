//! Rating tiers for the achievement rate and labels for each method score.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::methods::ScoringMethod;
use crate::echo::CostTier;

/// Overall rating, best first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    SSS,
    SS,
    S,
    A,
    B,
    C,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SSS => "SSS",
            Self::SS => "SS",
            Self::S => "S",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// B applies from here down to the bottom of every cost's scale.
const TIER_B_MIN: f64 = 15.0;

/// Minimum achievement rate for SSS, SS, S and A.
///
/// Cost 3 is the hardest to farm and gets the lowest bar, cost 1 the highest.
fn thresholds(cost: Option<CostTier>) -> [f64; 4] {
    match cost {
        Some(CostTier::Three) => [80.0, 65.0, 45.0, 25.0],
        Some(CostTier::Four) => [85.0, 70.0, 50.0, 30.0],
        Some(CostTier::One) | None => [90.0, 75.0, 55.0, 35.0],
    }
}

/// Maps an achievement rate to a tier for the given cost.
pub fn classify(rate: f64, cost: Option<CostTier>) -> Tier {
    let [sss, ss, s, a] = thresholds(cost);
    if rate >= sss {
        Tier::SSS
    } else if rate >= ss {
        Tier::SS
    } else if rate >= s {
        Tier::S
    } else if rate >= a {
        Tier::A
    } else if rate >= TIER_B_MIN {
        Tier::B
    } else {
        Tier::C
    }
}

/// Keep-farming or equip verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Keep farming for a better Echo
    Continue,
    Use,
}

/// Below this achievement rate the Echo is not worth equipping.
const USE_THRESHOLD: f64 = 30.0;

impl Recommendation {
    pub fn for_score(score: f64) -> Self {
        if score < USE_THRESHOLD {
            Self::Continue
        } else {
            Self::Use
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Continue => "厳選継続",
            Self::Use => "装備推奨",
        }
    }
}

/// Label for one method's score.
///
/// The effective method also needs the effective substat count.
pub fn method_label(method: ScoringMethod, score: f64, effective_count: u32) -> &'static str {
    match method {
        ScoringMethod::Normalized => match score {
            s if s >= 70.0 => "SSS",
            s if s >= 50.0 => "SS",
            s if s >= 30.0 => "S",
            _ => "B",
        },
        ScoringMethod::Ratio => match score {
            s if s >= 75.0 => "完璧",
            s if s >= 60.0 => "優秀",
            s if s >= 45.0 => "良好",
            s if s >= 30.0 => "平均",
            _ => "弱い",
        },
        ScoringMethod::Roll => match score {
            s if s >= 80.0 => "神ロール",
            s if s >= 65.0 => "当たり",
            s if s >= 45.0 => "平均",
            _ => "ハズレ",
        },
        ScoringMethod::Effective => match (effective_count, score) {
            (c, s) if c >= 5 && s >= 70.0 => "完璧",
            (c, s) if c >= 4 && s >= 50.0 => "優秀",
            (c, s) if c >= 3 && s >= 30.0 => "良好",
            _ => "不足",
        },
        ScoringMethod::Cv => match score {
            s if s >= 45.0 => "傑出",
            s if s >= 38.0 => "優秀",
            s if s >= 30.0 => "良好",
            s if s >= 25.0 => "許容",
            _ => "弱い",
        },
    }
}
