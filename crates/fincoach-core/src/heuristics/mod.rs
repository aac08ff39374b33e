//! Deterministic heuristic checks over a candidate recommendation.
//!
//! Five independent checks run against the text and its declared
//! calculations; the engine aggregates them into a [`HeuristicsReport`]
//! with a weighted score and a derived critical-failure flag. Same input
//! always produces the same report.

pub mod calculations;
pub mod disclaimers;
pub mod readability;
pub mod risk;
pub mod tone;

pub use risk::RiskLevel;

use crate::config::{HeuristicsConfig, RiskConfig};
use crate::types::{HeuristicResult, HeuristicsReport, Recommendation, UserContext};

/// Runs the fixed check set. Pure and thread-safe: holds only read-only
/// configuration.
#[derive(Debug, Clone, Default)]
pub struct HeuristicsEngine {
    config: HeuristicsConfig,
    vocab: RiskConfig,
}

impl HeuristicsEngine {
    pub fn new(config: HeuristicsConfig, vocab: RiskConfig) -> Self {
        Self { config, vocab }
    }

    /// Run all five checks and aggregate.
    pub fn evaluate(&self, recommendation: &Recommendation, context: &UserContext) -> HeuristicsReport {
        let weights = &self.config.weights;
        let results = vec![
            (
                calculations::check(
                    &recommendation.calculations,
                    self.config.calculation_tolerance,
                ),
                weights.calculation,
            ),
            (
                risk::check(&recommendation.text, context, &self.vocab),
                weights.risk,
            ),
            (
                readability::check(&recommendation.text, self.config.readability_floor),
                weights.readability,
            ),
            (tone::check(&recommendation.text), weights.tone),
            (disclaimers::check(&recommendation.text), weights.disclaimers),
        ];

        aggregate(results)
    }

    /// Lower-latency path: only the two veto-relevant checks, for callers
    /// that need the critical signal without the full report.
    pub fn evaluate_critical(
        &self,
        recommendation: &Recommendation,
        context: &UserContext,
    ) -> HeuristicsReport {
        let weights = &self.config.weights;
        let results = vec![
            (
                calculations::check(
                    &recommendation.calculations,
                    self.config.calculation_tolerance,
                ),
                weights.calculation,
            ),
            (
                risk::check(&recommendation.text, context, &self.vocab),
                weights.risk,
            ),
        ];

        aggregate(results)
    }
}

/// Weighted aggregation over (result, weight) pairs. Weights are
/// renormalized so partial check sets still land in [0, 1].
fn aggregate(weighted: Vec<(HeuristicResult, f64)>) -> HeuristicsReport {
    let weight_total: f64 = weighted.iter().map(|(_, w)| w).sum();

    let aggregated_score = if weight_total > 0.0 {
        weighted
            .iter()
            .map(|(r, w)| r.score * w)
            .sum::<f64>()
            / weight_total
    } else {
        0.0
    }
    .clamp(0.0, 1.0);

    let results: Vec<HeuristicResult> = weighted.into_iter().map(|(r, _)| r).collect();

    let critical_failed = results.iter().any(|r| r.is_critical && !r.passed);
    let issues = results
        .iter()
        .filter(|r| !r.passed)
        .map(|r| format!("{}: {}", r.name, r.message))
        .collect();

    HeuristicsReport {
        results,
        aggregated_score,
        critical_failed,
        issues,
    }
}
