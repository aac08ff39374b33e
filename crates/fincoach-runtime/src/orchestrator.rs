//! Fallback orchestrator: selects an agent tier, gates its output, and
//! degrades through cheaper tiers on timeout, failure, or rejection.
//!
//! The cascade is strictly monotonic — level 0 through level 3, never
//! backwards — and each level runs under its own fresh timeout budget, so
//! worst-case latency is the sum of the budgets, not their product. On
//! expiry the in-flight call is abandoned (dropping the future is the
//! best-effort cancellation) and the next level starts immediately.
//!
//! `run` never returns an error: ordinary agent failures and judge parse
//! failures surface only as the served response's `fallback_level`.

use std::sync::Arc;
use thiserror::Error;
use tokio::time::timeout;

use fincoach_core::types::{FallbackLevel, GuardianVerdict, Recommendation};
use fincoach_core::{CoachConfig, GuardianAggregator, HeuristicsEngine};
use futures::future::join_all;

use crate::agents::{merge_outputs, AgentError, AgentInvoker, AlgorithmicProvider, CoachingRequest};
use crate::generator::TextGenerator;
use crate::judge::JudgeEvaluator;
use crate::tabs::TabStrategy;

/// Errors from orchestrator construction. Runtime failures never surface
/// as errors; they degrade.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("collaborator not configured: {0}")]
    NotConfigured(&'static str),
}

/// A response the orchestrator is prepared to serve.
#[derive(Debug, Clone)]
pub struct ServedRecommendation {
    pub text: String,

    /// Tier the response was ultimately served from.
    pub fallback_level: FallbackLevel,

    /// Agents whose output made it into the served text.
    pub agents_used: Vec<String>,

    /// Verdict for the served text, when it went through the gate.
    /// Algorithmic and static tiers carry no LLM-authored text to vet.
    pub verdict: Option<GuardianVerdict>,
}

/// Coordinates agents, judge, and Guardian across the fallback cascade.
pub struct FallbackOrchestrator {
    invoker: Arc<dyn AgentInvoker>,
    algorithmic: Arc<dyn AlgorithmicProvider>,
    judge: JudgeEvaluator,
    guardian: GuardianAggregator,
    config: CoachConfig,
}

impl FallbackOrchestrator {
    pub fn builder() -> FallbackOrchestratorBuilder {
        FallbackOrchestratorBuilder::new()
    }

    /// Serve a coaching request. Infallible: the static floor always
    /// produces a response.
    pub async fn run(&self, request: &CoachingRequest) -> ServedRecommendation {
        let strategy = request.tab.strategy();

        // Level 0: full multi-agent pipeline.
        match timeout(
            self.config.timeouts.full_pipeline,
            self.invoke_full(request, &strategy),
        )
        .await
        {
            Ok(Ok((recommendation, agents))) => {
                let verdict = self.gate(&recommendation, request, &strategy).await;
                if verdict.accepted {
                    return ServedRecommendation {
                        text: recommendation.text,
                        fallback_level: FallbackLevel::FullPipeline,
                        agents_used: agents,
                        verdict: Some(verdict),
                    };
                }
                tracing::warn!(
                    reasons = ?verdict.reasons,
                    "full pipeline output rejected; degrading to single agent"
                );
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "full pipeline failed; degrading to single agent");
            }
            Err(_) => {
                tracing::warn!(
                    budget = ?self.config.timeouts.full_pipeline,
                    "full pipeline timed out; degrading to single agent"
                );
            }
        }

        // Level 1: primary agent only, shorter budget.
        match timeout(
            self.config.timeouts.single_agent,
            self.invoker
                .invoke(request.tab, strategy.primary_agent, request),
        )
        .await
        {
            Ok(Ok(recommendation)) => {
                let verdict = self.gate(&recommendation, request, &strategy).await;
                if verdict.accepted {
                    return ServedRecommendation {
                        text: recommendation.text,
                        fallback_level: FallbackLevel::SingleAgent,
                        agents_used: vec![strategy.primary_agent.to_string()],
                        verdict: Some(verdict),
                    };
                }
                tracing::warn!(
                    reasons = ?verdict.reasons,
                    "single-agent output rejected; degrading to algorithmic"
                );
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "single agent failed; degrading to algorithmic");
            }
            Err(_) => {
                tracing::warn!(
                    budget = ?self.config.timeouts.single_agent,
                    "single agent timed out; degrading to algorithmic"
                );
            }
        }

        // Level 2: deterministic algorithms, no LLM text to vet.
        match self.algorithmic.compute(request) {
            Ok(recommendation) => {
                return ServedRecommendation {
                    text: recommendation.text,
                    fallback_level: FallbackLevel::Algorithmic,
                    agents_used: vec![],
                    verdict: None,
                };
            }
            Err(e) => {
                tracing::error!(error = %e, "algorithmic provider failed; serving static message");
            }
        }

        // Level 3: the pre-approved floor. Never fails.
        ServedRecommendation {
            text: strategy.static_fallback.to_string(),
            fallback_level: FallbackLevel::Static,
            agents_used: vec![],
            verdict: None,
        }
    }

    /// Invoke the primary agent and the tab's secondaries concurrently.
    ///
    /// Primary failure fails the level; a failing secondary only loses its
    /// contribution.
    async fn invoke_full(
        &self,
        request: &CoachingRequest,
        strategy: &TabStrategy,
    ) -> Result<(Recommendation, Vec<String>), AgentError> {
        let primary_call = self
            .invoker
            .invoke(request.tab, strategy.primary_agent, request);

        let secondary_calls =
            join_all(strategy.secondary_agents.iter().map(|&agent_id| async move {
                (agent_id, self.invoker.invoke(request.tab, agent_id, request).await)
            }));

        let (primary, secondary_results) = tokio::join!(primary_call, secondary_calls);
        let primary = primary?;

        let mut agents = vec![strategy.primary_agent.to_string()];
        let mut secondaries = Vec::new();
        for (agent_id, result) in secondary_results {
            match result {
                Ok(recommendation) => {
                    agents.push(agent_id.to_string());
                    secondaries.push(recommendation);
                }
                Err(e) => {
                    tracing::warn!(
                        agent = agent_id,
                        error = %e,
                        "secondary agent failed; contribution omitted"
                    );
                }
            }
        }

        Ok((merge_outputs(primary, secondaries), agents))
    }

    /// Run both evaluators and hand their reports to the Guardian.
    /// Heuristics and judge complete before the decision is made.
    async fn gate(
        &self,
        recommendation: &Recommendation,
        request: &CoachingRequest,
        strategy: &TabStrategy,
    ) -> GuardianVerdict {
        let heuristics = self
            .heuristics_for(strategy)
            .evaluate(recommendation, &request.user);

        let judge = self
            .judge
            .evaluate(&recommendation.text, &strategy.format_context(&request.user))
            .await;

        self.guardian.decide(heuristics, judge)
    }

    /// Build a heuristics engine whose risk vocabulary includes the tab's
    /// extra terms.
    fn heuristics_for(&self, strategy: &TabStrategy) -> HeuristicsEngine {
        let mut vocab = self.config.risk.clone();
        vocab
            .high_risk_terms
            .extend(strategy.extra_risk_terms.iter().map(|t| t.to_string()));

        HeuristicsEngine::new(self.config.heuristics.clone(), vocab)
    }
}

/// Builder for [`FallbackOrchestrator`].
pub struct FallbackOrchestratorBuilder {
    invoker: Option<Arc<dyn AgentInvoker>>,
    algorithmic: Option<Arc<dyn AlgorithmicProvider>>,
    generator: Option<Arc<dyn TextGenerator>>,
    config: CoachConfig,
}

impl FallbackOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            invoker: None,
            algorithmic: None,
            generator: None,
            config: CoachConfig::default(),
        }
    }

    pub fn invoker(mut self, invoker: Arc<dyn AgentInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    pub fn algorithmic(mut self, provider: Arc<dyn AlgorithmicProvider>) -> Self {
        self.algorithmic = Some(provider);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn config(mut self, config: CoachConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<FallbackOrchestrator, OrchestratorError> {
        let invoker = self
            .invoker
            .ok_or(OrchestratorError::NotConfigured("agent invoker"))?;
        let algorithmic = self
            .algorithmic
            .ok_or(OrchestratorError::NotConfigured("algorithmic provider"))?;
        let generator = self
            .generator
            .ok_or(OrchestratorError::NotConfigured("text generator"))?;

        let judge = JudgeEvaluator::new(generator, self.config.judge.clone());
        let guardian = GuardianAggregator::new(self.config.guardian.clone());

        Ok(FallbackOrchestrator {
            invoker,
            algorithmic,
            judge,
            guardian,
            config: self.config,
        })
    }
}

impl Default for FallbackOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GenerationError;
    use crate::tabs::TabType;
    use async_trait::async_trait;
    use fincoach_core::types::{CalculationClaim, UserContext};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    const APPROVING_BATCH: &str = r#"{
        "evaluations": [
            {"criterion": "appropriateness", "score": 5, "confidence": 0.9, "reasoning": "fits"},
            {"criterion": "safety", "score": 5, "confidence": 0.9, "reasoning": "safe"},
            {"criterion": "coherence", "score": 5, "confidence": 0.9, "reasoning": "clear"},
            {"criterion": "actionability", "score": 5, "confidence": 0.9, "reasoning": "concrete"}
        ]
    }"#;

    struct ApprovingGenerator;

    #[async_trait]
    impl TextGenerator for ApprovingGenerator {
        async fn generate(&self, _: &str, _: &str) -> Result<String, GenerationError> {
            Ok(APPROVING_BATCH.to_string())
        }

        fn name(&self) -> &str {
            "approving"
        }
    }

    fn good_recommendation() -> Recommendation {
        Recommendation {
            text: "You have 200 left each month. Move 100 to a savings account each payday. \
                   Small steps add up."
                .to_string(),
            calculations: vec![CalculationClaim::Margin {
                income: 1200.0,
                expenses: 1000.0,
                claimed: 200.0,
            }],
        }
    }

    fn vetoed_recommendation() -> Recommendation {
        Recommendation {
            text: "Your margin is -250 a month.".to_string(),
            calculations: vec![CalculationClaim::Margin {
                income: 1200.0,
                expenses: 1500.0,
                claimed: -250.0,
            }],
        }
    }

    /// Invoker that misbehaves for its first `bad_calls` invocations, then
    /// returns a clean recommendation.
    struct ScriptedInvoker {
        bad_calls: u32,
        mode: BadMode,
        calls: AtomicU32,
    }

    enum BadMode {
        Fail,
        Veto,
        Hang,
    }

    impl ScriptedInvoker {
        fn new(bad_calls: u32, mode: BadMode) -> Self {
            Self {
                bad_calls,
                mode,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl AgentInvoker for ScriptedInvoker {
        async fn invoke(
            &self,
            _tab: TabType,
            agent_id: &str,
            _request: &CoachingRequest,
        ) -> Result<Recommendation, AgentError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.bad_calls {
                return match self.mode {
                    BadMode::Fail => Err(AgentError::Failed {
                        agent_id: agent_id.to_string(),
                        reason: "scripted failure".to_string(),
                    }),
                    BadMode::Veto => Ok(vetoed_recommendation()),
                    BadMode::Hang => {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        unreachable!("sleep outlives every test budget")
                    }
                };
            }
            Ok(good_recommendation())
        }
    }

    struct GoodAlgorithmic;

    impl AlgorithmicProvider for GoodAlgorithmic {
        fn compute(&self, _request: &CoachingRequest) -> Result<Recommendation, AgentError> {
            Ok(Recommendation::text(
                "Based on your numbers, set aside 50 a month.",
            ))
        }
    }

    struct BrokenAlgorithmic;

    impl AlgorithmicProvider for BrokenAlgorithmic {
        fn compute(&self, _request: &CoachingRequest) -> Result<Recommendation, AgentError> {
            Err(AgentError::Algorithmic("scripted breakage".to_string()))
        }
    }

    fn request() -> CoachingRequest {
        CoachingRequest {
            tab: TabType::Budget,
            subject_id: "user-1".to_string(),
            user: UserContext::default(),
            query: "How do I save more?".to_string(),
        }
    }

    fn short_timeouts() -> CoachConfig {
        let mut config = CoachConfig::default();
        config.timeouts.full_pipeline = Duration::from_millis(100);
        config.timeouts.single_agent = Duration::from_millis(100);
        config
    }

    fn orchestrator(
        invoker: Arc<dyn AgentInvoker>,
        algorithmic: Arc<dyn AlgorithmicProvider>,
    ) -> FallbackOrchestrator {
        FallbackOrchestrator::builder()
            .invoker(invoker)
            .algorithmic(algorithmic)
            .generator(Arc::new(ApprovingGenerator))
            .config(short_timeouts())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_healthy_pipeline_serves_level_zero() {
        let orch = orchestrator(
            Arc::new(ScriptedInvoker::new(0, BadMode::Fail)),
            Arc::new(GoodAlgorithmic),
        );

        let served = orch.run(&request()).await;
        assert_eq!(served.fallback_level, FallbackLevel::FullPipeline);
        // Budget tab: primary plus one secondary.
        assert_eq!(served.agents_used.len(), 2);
        assert!(served.verdict.unwrap().accepted);
    }

    #[tokio::test]
    async fn test_primary_failure_degrades_to_at_least_level_one() {
        // Level 0's two calls fail; level 1's primary succeeds.
        let orch = orchestrator(
            Arc::new(ScriptedInvoker::new(2, BadMode::Fail)),
            Arc::new(GoodAlgorithmic),
        );

        let served = orch.run(&request()).await;
        assert!(served.fallback_level >= FallbackLevel::SingleAgent);
        assert_eq!(served.fallback_level, FallbackLevel::SingleAgent);
        assert_eq!(served.agents_used, vec!["budget-coach".to_string()]);
    }

    #[tokio::test]
    async fn test_secondary_failure_is_omitted_not_fatal() {
        // One bad call: the concurrent level-0 fan-out loses whichever
        // agent drew it, and the merged output still serves at level 0.
        let orch = orchestrator(
            Arc::new(ScriptedInvoker::new(1, BadMode::Fail)),
            Arc::new(GoodAlgorithmic),
        );

        let served = orch.run(&request()).await;
        // Either the secondary failed (level 0 with one agent) or the
        // primary failed and level 1 served.
        assert!(served.fallback_level <= FallbackLevel::SingleAgent);
        assert_eq!(served.agents_used.len(), 1);
    }

    #[tokio::test]
    async fn test_vetoed_output_cascades() {
        // Both level 0 and level 1 produce a vetoed recommendation; the
        // algorithmic tier serves.
        let orch = orchestrator(
            Arc::new(ScriptedInvoker::new(3, BadMode::Veto)),
            Arc::new(GoodAlgorithmic),
        );

        let served = orch.run(&request()).await;
        assert_eq!(served.fallback_level, FallbackLevel::Algorithmic);
        assert!(served.verdict.is_none());
        assert!(served.agents_used.is_empty());
    }

    #[tokio::test]
    async fn test_hanging_agents_hit_both_budgets_then_algorithmic() {
        let orch = orchestrator(
            Arc::new(ScriptedInvoker::new(u32::MAX, BadMode::Hang)),
            Arc::new(GoodAlgorithmic),
        );

        let served = orch.run(&request()).await;
        assert_eq!(served.fallback_level, FallbackLevel::Algorithmic);
    }

    #[tokio::test]
    async fn test_every_tier_failing_serves_static_and_never_throws() {
        let orch = orchestrator(
            Arc::new(ScriptedInvoker::new(u32::MAX, BadMode::Fail)),
            Arc::new(BrokenAlgorithmic),
        );

        let served = orch.run(&request()).await;
        assert_eq!(served.fallback_level, FallbackLevel::Static);
        assert_eq!(served.text, TabType::Budget.strategy().static_fallback);
        assert!(served.verdict.is_none());
    }

    #[tokio::test]
    async fn test_builder_requires_collaborators() {
        let result = FallbackOrchestrator::builder().build();
        assert!(matches!(result, Err(OrchestratorError::NotConfigured(_))));
    }
}
