//! Echo scoring.
//!
//! `ScoringEngine::evaluate` runs the selected methods, computes the
//! achievement rate against the character's best possible Echo, applies the
//! main-stat penalty and attaches rating, estimated totals and advice.
//! Everything here is a pure function of its inputs.

pub mod advice;
pub mod config;
pub mod estimate;
pub mod methods;
pub mod rating;
pub mod summary;

pub use advice::{AdviceGenerator, Consistency};
pub use config::ConfigBundle;
pub use methods::{ScoringMethod, ScoringStrategy};
pub use rating::{Recommendation, Tier};
pub use summary::BatchSummary;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::echo::Echo;
use crate::gamedata::CharacterProfile;
use crate::stats::MAX_SUBSTATS;

/// Used when the profile has no positive weight.
const DEFAULT_THEORETICAL_MAX: f64 = 100.0;

/// Normalized sub-score of one max roll per unit of weight.
const MAX_ROLL_SUB_SCORE: f64 = 20.0;

/// Full evaluation of one Echo for one character.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Achievement rate with the main-stat penalty applied
    pub total_score: f64,
    /// Achievement rate before the penalty
    pub achievement_rate: f64,
    pub penalty: f64,
    pub rating: Tier,
    pub recommendation: Recommendation,
    /// Scores of the methods that were run
    pub individual_scores: BTreeMap<ScoringMethod, f64>,
    pub effective_count: u32,
    pub estimated_stats: BTreeMap<String, f64>,
    pub consistency_advice: Option<String>,
    pub advice: Vec<String>,
    /// `total_score` minus the equipped Echo's, when compared
    pub comparison_diff: Option<f64>,
}

impl EvaluationResult {
    /// Mean of the individual method scores.
    ///
    /// Not comparable with `total_score`; kept for reference only.
    pub fn method_average(&self) -> f64 {
        if self.individual_scores.is_empty() {
            return 0.0;
        }
        self.individual_scores.values().sum::<f64>() / self.individual_scores.len() as f64
    }
}

/// Best normalized sub-score the character can reach: a max roll in each
/// of the five highest positive weights.
pub fn theoretical_max(weights: &BTreeMap<String, f64>) -> f64 {
    let mut positive: Vec<f64> = weights.values().copied().filter(|w| *w > 0.0).collect();
    positive.sort_by(|a, b| b.total_cmp(a));

    let max: f64 = positive
        .iter()
        .take(MAX_SUBSTATS)
        .map(|w| MAX_ROLL_SUB_SCORE * w)
        .sum();
    if max > 0.0 { max } else { DEFAULT_THEORETICAL_MAX }
}

/// Scores Echoes with one numeric configuration.
pub struct ScoringEngine<'a> {
    config: &'a ConfigBundle,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(config: &'a ConfigBundle) -> Self {
        Self { config }
    }

    /// Evaluates `echo` for `profile` with the given methods.
    ///
    /// `enabled` should not be empty; callers check this and warn the user.
    /// With no methods the result still carries the achievement rate.
    pub fn evaluate(
        &self,
        echo: &Echo,
        profile: &CharacterProfile,
        enabled: &[ScoringMethod],
    ) -> EvaluationResult {
        let weights = &profile.weights;

        let individual_scores: BTreeMap<ScoringMethod, f64> = enabled
            .iter()
            .map(|&m| (m, m.strategy().compute(echo, weights, self.config)))
            .collect();
        let effective_count = methods::effective_count(echo, weights, self.config);

        let actual = methods::weighted_sub_score(echo, weights, self.config);
        let achievement_rate = actual / theoretical_max(weights) * 100.0;

        let consistency = advice::check_main_stat(echo, &profile.main_stats);
        let total_score = achievement_rate * consistency.penalty;

        let estimated_stats = estimate::estimate_stats(echo, profile);
        let advice = AdviceGenerator::new(&profile.ideal_stats).generate(&estimated_stats);

        EvaluationResult {
            total_score,
            achievement_rate,
            penalty: consistency.penalty,
            rating: rating::classify(total_score, echo.cost),
            recommendation: Recommendation::for_score(total_score),
            individual_scores,
            effective_count,
            estimated_stats,
            consistency_advice: consistency.message,
            advice,
            comparison_diff: None,
        }
    }

    /// Evaluates `candidate` and records how much it beats `equipped` by.
    pub fn compare(
        &self,
        candidate: &Echo,
        equipped: &Echo,
        profile: &CharacterProfile,
        enabled: &[ScoringMethod],
    ) -> EvaluationResult {
        let mut result = self.evaluate(candidate, profile, enabled);
        let baseline = self.evaluate(equipped, profile, enabled);
        result.comparison_diff = Some(result.total_score - baseline.total_score);
        result
    }
}
