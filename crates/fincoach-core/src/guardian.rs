//! Guardian: the veto-capable gate over heuristic and judge evidence.
//!
//! Acceptance and veto semantics are decided here and nowhere else. The
//! sub-evaluators only contribute evidence; neither can reject a
//! recommendation on its own.

use chrono::Utc;

use crate::config::GuardianConfig;
use crate::types::{GuardianVerdict, HeuristicsReport, JudgeReport};

/// Judge raw scores at or below this contribute a rejection reason.
const LOW_JUDGE_SCORE: u8 = 2;

/// Combines a [`HeuristicsReport`] and a [`JudgeReport`] into one
/// accept/reject decision.
#[derive(Debug, Clone, Default)]
pub struct GuardianAggregator {
    config: GuardianConfig,
}

impl GuardianAggregator {
    pub fn new(config: GuardianConfig) -> Self {
        Self { config }
    }

    /// Decide whether a recommendation may be shown to the user.
    ///
    /// A failed critical heuristic vetoes regardless of the blended score;
    /// otherwise acceptance requires the blend of heuristic and judge
    /// scores to clear the configured threshold.
    pub fn decide(&self, heuristics: HeuristicsReport, judge: JudgeReport) -> GuardianVerdict {
        let vetoed = heuristics.critical_failed;

        let alpha = self.config.alpha;
        let final_score =
            (alpha * heuristics.aggregated_score + (1.0 - alpha) * judge.aggregated_score)
                .clamp(0.0, 1.0);

        let accepted = !vetoed && final_score >= self.config.acceptance_threshold;

        let mut reasons: Vec<String> = heuristics.issues.clone();
        for result in &judge.results {
            if result.raw_score <= LOW_JUDGE_SCORE {
                reasons.push(format!(
                    "judge scored {} {}/5: {}",
                    result.criterion, result.raw_score, result.reasoning
                ));
            }
        }

        if vetoed {
            tracing::warn!(
                final_score,
                reasons = reasons.len(),
                "recommendation vetoed by critical heuristic failure"
            );
        } else if !accepted {
            tracing::info!(
                final_score,
                threshold = self.config.acceptance_threshold,
                "recommendation below acceptance threshold"
            );
        }

        GuardianVerdict {
            accepted,
            vetoed,
            final_score,
            heuristics,
            judge,
            reasons,
            evaluated_at: Utc::now(),
        }
    }
}
