//! Agent invocation collaborator traits.
//!
//! The agents that actually write recommendation text live outside this
//! crate. The orchestrator reaches them through [`AgentInvoker`]; the
//! always-available deterministic layer sits behind
//! [`AlgorithmicProvider`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use fincoach_core::types::{Recommendation, UserContext};

use crate::tabs::TabType;

/// Errors from agent invocation.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("agent '{agent_id}' failed: {reason}")]
    Failed { agent_id: String, reason: String },

    #[error("agent '{agent_id}' timed out after {elapsed:?}")]
    Timeout { agent_id: String, elapsed: Duration },

    #[error("algorithmic provider failed: {0}")]
    Algorithmic(String),
}

/// A coaching request as the decision core sees it. Transport framing is
/// the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachingRequest {
    pub tab: TabType,

    /// Stable subject identifier (drives sampling and bucketing upstream).
    pub subject_id: String,

    #[serde(default)]
    pub user: UserContext,

    /// The user's question or the tab's standing prompt.
    pub query: String,
}

/// Invokes a recommendation-generating agent.
///
/// Implementations may fail or hang; the orchestrator bounds every call
/// with its level's timeout budget and cascades on failure.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(
        &self,
        tab: TabType,
        agent_id: &str,
        request: &CoachingRequest,
    ) -> Result<Recommendation, AgentError>;
}

/// Computes a recommendation from deterministic domain algorithms only.
///
/// Contractually non-failing and always available; the error path exists
/// so a broken implementation still degrades to the static floor instead
/// of taking the cascade down.
pub trait AlgorithmicProvider: Send + Sync {
    fn compute(&self, request: &CoachingRequest) -> Result<Recommendation, AgentError>;
}

/// Merge a primary recommendation with surviving secondary contributions.
///
/// Secondary text is appended after the primary; calculations accumulate
/// in agent order so the validator sees every claim.
pub fn merge_outputs(primary: Recommendation, secondaries: Vec<Recommendation>) -> Recommendation {
    let mut text = primary.text;
    let mut calculations = primary.calculations;

    for secondary in secondaries {
        if !secondary.text.is_empty() {
            text.push_str("\n\n");
            text.push_str(&secondary.text);
        }
        calculations.extend(secondary.calculations);
    }

    Recommendation { text, calculations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fincoach_core::types::CalculationClaim;

    #[test]
    fn test_merge_appends_text_and_claims() {
        let primary = Recommendation {
            text: "Cut subscriptions.".to_string(),
            calculations: vec![CalculationClaim::Margin {
                income: 1000.0,
                expenses: 900.0,
                claimed: 100.0,
            }],
        };
        let secondary = Recommendation {
            text: "Groceries ran 12% over budget.".to_string(),
            calculations: vec![],
        };

        let merged = merge_outputs(primary, vec![secondary]);
        assert!(merged.text.starts_with("Cut subscriptions."));
        assert!(merged.text.contains("Groceries"));
        assert_eq!(merged.calculations.len(), 1);
    }

    #[test]
    fn test_merge_skips_empty_secondary_text() {
        let primary = Recommendation::text("Primary.");
        let merged = merge_outputs(primary, vec![Recommendation::text("")]);
        assert_eq!(merged.text, "Primary.");
    }
}
