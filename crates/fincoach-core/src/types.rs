//! Shared data model for the advice gate.
//!
//! Everything here is created fresh per evaluation, immutable once built,
//! and never persisted by this crate. Persistence of traces and feedback
//! belongs to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A numeric claim embedded in a recommendation, to be re-derived and
/// checked against the canonical formula for its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalculationClaim {
    /// Monthly margin: income minus expenses.
    Margin {
        income: f64,
        expenses: f64,
        claimed: f64,
    },

    /// Linear savings projection: initial balance plus margin accrued
    /// over a number of months.
    Projection {
        initial: f64,
        margin: f64,
        months: f64,
        claimed: f64,
    },

    /// Compound interest: P * (1 + r/n)^(n*t).
    CompoundInterest {
        principal: f64,
        annual_rate: f64,
        compounds_per_year: f64,
        years: f64,
        claimed: f64,
    },

    /// Months to pay off a loan at a fixed monthly payment. Infinite when
    /// the payment never exceeds the monthly interest accrual.
    LoanPayoff {
        principal: f64,
        annual_rate: f64,
        monthly_payment: f64,
        claimed_months: f64,
    },
}

/// A candidate recommendation submitted to the gate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recommendation {
    /// The advice text shown to the user if accepted.
    pub text: String,

    /// Numeric claims the text relies on.
    #[serde(default)]
    pub calculations: Vec<CalculationClaim>,
}

impl Recommendation {
    /// Create a recommendation from bare text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            calculations: Vec::new(),
        }
    }
}

/// The user's financial situation, as seen by the risk scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialSituation {
    Surplus,
    #[default]
    Balanced,
    /// Expenses exceed income; risky advice escalates.
    Deficit,
}

/// Situational flags the heuristics consult. Built by the caller from its
/// subject-metadata collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(default)]
    pub situation: FinancialSituation,

    /// Whether the user currently holds any debt.
    #[serde(default)]
    pub has_debt: bool,
}

/// Outcome of a single heuristic check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicResult {
    /// Stable check name, e.g. "calculation_validator".
    pub name: String,

    pub passed: bool,

    /// Quality score in [0, 1]; higher is better.
    pub score: f64,

    /// A failing critical check vetoes the whole recommendation
    /// regardless of the aggregate score.
    pub is_critical: bool,

    /// Human-readable summary of what the check found.
    pub message: String,

    /// Check-specific detail lines.
    #[serde(default)]
    pub details: Vec<String>,
}

/// Ordered results of all heuristic checks plus their aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicsReport {
    pub results: Vec<HeuristicResult>,

    /// Weighted average of check scores, in [0, 1].
    pub aggregated_score: f64,

    /// True iff any critical check failed. Always derived from `results`.
    pub critical_failed: bool,

    /// Messages of every failing check, flattened for the verdict.
    pub issues: Vec<String>,
}

/// One scoring criterion in the judge rubric. Static configuration;
/// weights across the active set sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeCriterion {
    pub name: String,
    pub description: String,
    /// Rubric text inserted into the judge prompt.
    pub rubric: String,
    pub weight: f64,
}

/// The judge's verdict on a single criterion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeCriterionResult {
    pub criterion: String,

    /// Raw rubric score, 1..=5.
    pub raw_score: u8,

    /// (raw_score - 1) / 4, in [0, 1].
    pub normalized_score: f64,

    /// Judge's self-reported confidence, in [0, 1].
    pub confidence: f64,

    pub reasoning: String,
}

impl JudgeCriterionResult {
    /// Neutral placeholder for a criterion the judge failed to score.
    pub fn placeholder(criterion: impl Into<String>) -> Self {
        Self {
            criterion: criterion.into(),
            raw_score: 3,
            normalized_score: 0.5,
            confidence: 0.5,
            reasoning: "not evaluated".to_string(),
        }
    }
}

/// Per-criterion results plus their aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeReport {
    pub results: Vec<JudgeCriterionResult>,

    /// Weight-blended normalized score, in [0, 1].
    pub aggregated_score: f64,

    /// Unweighted mean of per-criterion confidences.
    pub average_confidence: f64,

    pub overall_reasoning: String,
}

/// The gate's final decision on a recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardianVerdict {
    pub accepted: bool,

    /// True when a critical check forced rejection. Implies `!accepted`.
    pub vetoed: bool,

    /// Blended heuristics/judge score, in [0, 1].
    pub final_score: f64,

    pub heuristics: HeuristicsReport,
    pub judge: JudgeReport,

    /// Failing-check messages and low-scoring judge criteria.
    pub reasons: Vec<String>,

    pub evaluated_at: DateTime<Utc>,
}

/// How degraded the serving path was for a response. Strictly ordered;
/// the orchestrator only ever moves to a higher level within one request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FallbackLevel {
    /// Full multi-agent pipeline.
    FullPipeline = 0,
    /// Primary agent only.
    SingleAgent = 1,
    /// Deterministic domain algorithms, no LLM.
    Algorithmic = 2,
    /// Fixed pre-approved message.
    Static = 3,
}

impl FallbackLevel {
    /// Numeric tier, 0 (full) through 3 (static).
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// The next, more degraded level. `None` at the static floor.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::FullPipeline => Some(Self::SingleAgent),
            Self::SingleAgent => Some(Self::Algorithmic),
            Self::Algorithmic => Some(Self::Static),
            Self::Static => None,
        }
    }
}

/// Everything the sampler needs to decide whether to record a trace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplingContext {
    /// Stable subject identifier; drives the deterministic draw.
    pub subject_id: String,

    /// Operator override: always trace.
    #[serde(default)]
    pub force_trace: bool,

    /// A known error occurred while serving the request.
    #[serde(default)]
    pub has_error: bool,

    /// Fallback level the response was served at, if known.
    #[serde(default)]
    pub fallback_level: Option<FallbackLevel>,

    /// User feedback is present or expected for this request.
    #[serde(default)]
    pub has_feedback: bool,

    /// Days since the subject's account was created.
    #[serde(default)]
    pub account_age_days: Option<i64>,

    /// Experiments the subject is enrolled in.
    #[serde(default)]
    pub experiment_ids: Vec<String>,
}

/// Why a trace was (or was not) recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingDecision {
    pub should_trace: bool,

    /// Stable reason tag: "forced", "error", "fallback", "feedback",
    /// "new_user", "experiment", "sampled_in", "sampled_out".
    pub reason: String,

    /// Effective sampling rate applied by the winning rule.
    pub applied_rate: f64,
}

/// Facts learned after the original sampling decision was made.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PostFacts {
    #[serde(default)]
    pub error_occurred: bool,

    #[serde(default)]
    pub fallback_triggered: bool,

    #[serde(default)]
    pub feedback_received: bool,
}

/// An experiment definition: variants and their traffic split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub name: String,

    pub variant_ids: Vec<String>,

    /// Fraction of traffic per variant; must sum to 1.0 and match
    /// `variant_ids` in length.
    pub traffic_split: Vec<f64>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// A subject's computed (or overridden) variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAssignment {
    pub experiment: String,
    pub variant_id: String,
}
