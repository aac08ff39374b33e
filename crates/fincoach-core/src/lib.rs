//! # fincoach-core
//!
//! Deterministic decision core for the Fincoach advice-quality gate.
//!
//! This crate answers, without any LLM call of its own:
//! - Is this recommendation numerically and behaviorally safe to show?
//! - How should judge evidence be parsed, repaired, and blended in?
//! - Should this request's trace be recorded?
//! - Which experiment variant does this subject see?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same input always produces the same output
//! 2. **No LLM calls**: judging happens elsewhere; only parsing lives here
//! 3. **Veto-capable**: a critical check failure rejects regardless of score
//! 4. **Isolated state**: the only mutable state is the per-instance
//!    variant override table
//!
//! ## Example
//!
//! ```rust,ignore
//! use fincoach_core::{CoachConfig, GuardianAggregator, HeuristicsEngine, Recommendation};
//!
//! let config = CoachConfig::default();
//! let engine = HeuristicsEngine::new(config.heuristics.clone(), config.risk.clone());
//! let guardian = GuardianAggregator::new(config.guardian.clone());
//!
//! let heuristics = engine.evaluate(&recommendation, &user_context);
//! let judge = fincoach_core::judge::parse_batch(&model_response, &config.judge.criteria);
//! let verdict = guardian.decide(heuristics, judge);
//! ```

pub mod bucketing;
pub mod config;
pub mod guardian;
pub mod heuristics;
pub mod judge;
pub mod sampling;
pub mod types;

// Re-export main types at crate root
pub use bucketing::VariantBucketer;
pub use config::{
    CoachConfig, ConfigError, GuardianConfig, HeuristicsConfig, JudgeConfig, RiskConfig,
    SamplerConfig, TimeoutConfig, validate_experiment,
};
pub use guardian::GuardianAggregator;
pub use heuristics::{HeuristicsEngine, RiskLevel};
pub use sampling::{SamplingContextBuilder, TraceSampler};
pub use types::{
    CalculationClaim, ExperimentConfig, FallbackLevel, FinancialSituation, GuardianVerdict,
    HeuristicResult, HeuristicsReport, JudgeCriterion, JudgeCriterionResult, JudgeReport,
    PostFacts, Recommendation, SamplingContext, SamplingDecision, UserContext, VariantAssignment,
};
