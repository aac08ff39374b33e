//! LLM-judge evaluator.
//!
//! Drives an injected [`TextGenerator`] through the rubric and hands the
//! raw responses to the core parser. Every failure mode — generator error,
//! garbage response, missing criterion — degrades to neutral placeholder
//! evidence; this evaluator never returns an error.

use std::sync::Arc;

use fincoach_core::judge::{build_report, fallback_report, parse_batch, parse_single};
use fincoach_core::types::{JudgeCriterion, JudgeReport};
use fincoach_core::JudgeConfig;
use futures::future::join_all;

use crate::cache::{JudgeCache, JudgeCacheKey};
use crate::generator::TextGenerator;
use crate::prompts::{batch_user_prompt, single_user_prompt, JUDGE_SYSTEM_PROMPT};

/// How the rubric is put to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JudgeMode {
    /// One call scoring every criterion. Cheapest; the default.
    #[default]
    Batch,

    /// One call per criterion. Strictly more calls, higher fidelity.
    Individual,
}

/// Scores recommendations against the configured criteria set.
pub struct JudgeEvaluator {
    generator: Arc<dyn TextGenerator>,
    criteria: Vec<JudgeCriterion>,
    mode: JudgeMode,
    cache: Option<JudgeCache>,
}

impl JudgeEvaluator {
    pub fn new(generator: Arc<dyn TextGenerator>, config: JudgeConfig) -> Self {
        Self {
            generator,
            criteria: config.criteria,
            mode: JudgeMode::default(),
            cache: None,
        }
    }

    pub fn with_mode(mut self, mode: JudgeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Cache reports keyed by text + criteria to avoid re-judging
    /// identical recommendations.
    pub fn with_cache(mut self, cache: JudgeCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn criteria(&self) -> &[JudgeCriterion] {
        &self.criteria
    }

    /// Evaluate a recommendation. Infallible: the worst case is a report
    /// of neutral placeholders with depressed confidence.
    pub async fn evaluate(&self, recommendation_text: &str, context_summary: &str) -> JudgeReport {
        let key = JudgeCacheKey::new(recommendation_text, &self.criteria);
        if let Some(cache) = &self.cache {
            if let Some(report) = cache.get(&key).await {
                tracing::debug!("judge cache hit");
                return report;
            }
        }

        let report = match self.mode {
            JudgeMode::Batch => self.evaluate_batch(recommendation_text, context_summary).await,
            JudgeMode::Individual => {
                self.evaluate_individual(recommendation_text, context_summary)
                    .await
            }
        };

        if let Some(cache) = &self.cache {
            cache.insert(key, report.clone()).await;
        }

        report
    }

    async fn evaluate_batch(&self, recommendation_text: &str, context_summary: &str) -> JudgeReport {
        let user_prompt = batch_user_prompt(recommendation_text, context_summary, &self.criteria);

        match self
            .generator
            .generate(JUDGE_SYSTEM_PROMPT, &user_prompt)
            .await
        {
            Ok(response) => parse_batch(&response, &self.criteria),
            Err(e) => {
                tracing::warn!(
                    generator = self.generator.name(),
                    error = %e,
                    "judge generation failed; using fallback report"
                );
                fallback_report(&self.criteria, &format!("judge unavailable: {e}"))
            }
        }
    }

    async fn evaluate_individual(
        &self,
        recommendation_text: &str,
        context_summary: &str,
    ) -> JudgeReport {
        let calls = self.criteria.iter().map(|criterion| {
            let user_prompt = single_user_prompt(recommendation_text, context_summary, criterion);
            async move {
                match self
                    .generator
                    .generate(JUDGE_SYSTEM_PROMPT, &user_prompt)
                    .await
                {
                    Ok(response) => parse_single(&response, criterion),
                    Err(e) => {
                        tracing::warn!(
                            criterion = %criterion.name,
                            error = %e,
                            "per-criterion generation failed; placeholder used"
                        );
                        fincoach_core::types::JudgeCriterionResult::placeholder(&criterion.name)
                    }
                }
            }
        });

        let results = join_all(calls).await;
        build_report(results, &self.criteria, String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GenerationError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Generator double returning a fixed response and counting calls.
    struct FixedGenerator {
        response: Result<String, ()>,
        calls: AtomicU32,
    }

    impl FixedGenerator {
        fn ok(response: &str) -> Self {
            Self {
                response: Ok(response.to_string()),
                calls: AtomicU32::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err(()),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
        ) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response
                .clone()
                .map_err(|_| GenerationError::RequestFailed("backend down".to_string()))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    const GOOD_BATCH: &str = r#"{
        "evaluations": [
            {"criterion": "appropriateness", "score": 4, "confidence": 0.9, "reasoning": "fits"},
            {"criterion": "safety", "score": 5, "confidence": 0.9, "reasoning": "safe"},
            {"criterion": "coherence", "score": 4, "confidence": 0.8, "reasoning": "clear"},
            {"criterion": "actionability", "score": 4, "confidence": 0.8, "reasoning": "concrete"}
        ],
        "overall_reasoning": "good advice"
    }"#;

    #[tokio::test]
    async fn test_batch_mode_single_call() {
        let generator = Arc::new(FixedGenerator::ok(GOOD_BATCH));
        let evaluator = JudgeEvaluator::new(generator.clone(), JudgeConfig::default());

        let report = evaluator.evaluate("Save more.", "balanced").await;
        assert_eq!(report.results.len(), 4);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.overall_reasoning, "good advice");
    }

    #[tokio::test]
    async fn test_individual_mode_one_call_per_criterion() {
        let generator = Arc::new(FixedGenerator::ok(
            r#"{"score": 4, "confidence": 0.8, "reasoning": "fine"}"#,
        ));
        let evaluator = JudgeEvaluator::new(generator.clone(), JudgeConfig::default())
            .with_mode(JudgeMode::Individual);

        let report = evaluator.evaluate("Save more.", "balanced").await;
        assert_eq!(report.results.len(), 4);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 4);
        assert!(report.results.iter().all(|r| r.raw_score == 4));
    }

    #[tokio::test]
    async fn test_generator_failure_yields_fallback_report() {
        let generator = Arc::new(FixedGenerator::failing());
        let evaluator = JudgeEvaluator::new(generator, JudgeConfig::default());

        let report = evaluator.evaluate("Save more.", "balanced").await;
        assert_eq!(report.average_confidence, 0.3);
        assert!(report.overall_reasoning.contains("judge unavailable"));
        assert!(report.results.iter().all(|r| r.raw_score == 3));
    }

    #[tokio::test]
    async fn test_cache_skips_second_generation() {
        let generator = Arc::new(FixedGenerator::ok(GOOD_BATCH));
        let evaluator = JudgeEvaluator::new(generator.clone(), JudgeConfig::default())
            .with_cache(JudgeCache::default());

        evaluator.evaluate("Save more.", "balanced").await;
        evaluator.evaluate("Save more.", "balanced").await;
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }
}
