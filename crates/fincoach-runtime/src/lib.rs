//! # fincoach-runtime
//!
//! Agent cascade and LLM-judge runtime for the Fincoach advice gate.
//!
//! `fincoach-core` decides; this crate coordinates. It owns everything
//! that suspends — agent invocations and judge generations — and the
//! policies around them: per-level timeout budgets, concurrent secondary
//! fan-out, judge-report caching, and the monotonic fallback cascade.
//!
//! The long-running collaborators are injected:
//! - [`AgentInvoker`] produces recommendation text (may fail or hang)
//! - [`TextGenerator`] backs the judge (may fail or hang)
//! - [`AlgorithmicProvider`] is the deterministic, always-available tier
//!
//! ## Example
//!
//! ```rust,ignore
//! use fincoach_runtime::{CoachingRequest, FallbackOrchestrator, TabType};
//!
//! let orchestrator = FallbackOrchestrator::builder()
//!     .invoker(agents)
//!     .algorithmic(rules_engine)
//!     .generator(llm)
//!     .config(config)
//!     .build()?;
//!
//! let served = orchestrator.run(&request).await;
//! tracing::info!(level = ?served.fallback_level, "served");
//! ```

pub mod agents;
pub mod cache;
pub mod generator;
pub mod judge;
pub mod orchestrator;
pub mod prompts;
pub mod tabs;

// Re-export main types at crate root
pub use agents::{AgentError, AgentInvoker, AlgorithmicProvider, CoachingRequest};
pub use cache::{JudgeCache, JudgeCacheKey};
pub use generator::{GenerationError, TextGenerator};
pub use judge::{JudgeEvaluator, JudgeMode};
pub use orchestrator::{
    FallbackOrchestrator, FallbackOrchestratorBuilder, OrchestratorError, ServedRecommendation,
};
pub use tabs::{TabStrategy, TabType};
