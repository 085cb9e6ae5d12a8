//! Totals and averages over several evaluations.

use serde::Serialize;
use std::collections::BTreeMap;

use super::methods::ScoringMethod;
use super::EvaluationResult;

/// Summary of a batch of evaluated Echoes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Number of evaluated Echoes
    pub count: usize,
    /// Sum of total scores
    pub total_sum: f64,
    /// Mean total score
    pub total_average: f64,
    /// Per-method sums, only for methods that ran
    pub method_sums: BTreeMap<ScoringMethod, f64>,
    /// Per-method means
    pub method_averages: BTreeMap<ScoringMethod, f64>,
}

impl BatchSummary {
    /// Sums every evaluation. An empty slice gives zero counts and averages.
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a EvaluationResult>,
    {
        let mut count = 0usize;
        let mut total_sum = 0.0;
        let mut method_sums: BTreeMap<ScoringMethod, f64> = BTreeMap::new();

        for result in results {
            count += 1;
            total_sum += result.total_score;
            for (&method, &score) in &result.individual_scores {
                *method_sums.entry(method).or_insert(0.0) += score;
            }
        }

        let mean = |sum: f64| if count == 0 { 0.0 } else { sum / count as f64 };
        let method_averages = method_sums.iter().map(|(&m, &s)| (m, mean(s))).collect();

        BatchSummary {
            count,
            total_sum,
            total_average: mean(total_sum),
            method_sums,
            method_averages,
        }
    }
}
