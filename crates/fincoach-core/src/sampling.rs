//! Trace sampling: decides whether a request's observability trace is
//! recorded.
//!
//! `decide` is a pure function of the context — fixed priority order,
//! first matching rule wins, and the residual draw is deterministic in the
//! subject identifier. `upgrade` can turn a skip into a trace after the
//! fact but never the reverse: traces, once started, are not discarded.

use chrono::{DateTime, Utc};

use crate::bucketing::{stable_hash64, unit_interval};
use crate::config::SamplerConfig;
use crate::types::{FallbackLevel, PostFacts, SamplingContext, SamplingDecision};

/// Evaluates sampling rules against a [`SamplingContext`].
#[derive(Debug, Clone, Default)]
pub struct TraceSampler {
    config: SamplerConfig,
}

impl TraceSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    /// Decide whether to record a trace. Rules in priority order; the
    /// first match wins.
    pub fn decide(&self, context: &SamplingContext) -> SamplingDecision {
        if context.force_trace {
            return traced("forced");
        }

        if context.has_error {
            return traced("error");
        }

        if context
            .fallback_level
            .is_some_and(|level| level > FallbackLevel::FullPipeline)
        {
            return traced("fallback");
        }

        if context.has_feedback {
            return traced("feedback");
        }

        if context
            .account_age_days
            .is_some_and(|days| days < self.config.new_user_window_days)
        {
            return traced("new_user");
        }

        if !context.experiment_ids.is_empty() {
            return traced("experiment");
        }

        let draw = unit_interval(stable_hash64(&context.subject_id));
        if draw < self.config.base_rate {
            SamplingDecision {
                should_trace: true,
                reason: "sampled_in".to_string(),
                applied_rate: self.config.base_rate,
            }
        } else {
            SamplingDecision {
                should_trace: false,
                reason: "sampled_out".to_string(),
                applied_rate: self.config.base_rate,
            }
        }
    }

    /// Re-evaluate a prior decision against facts learned afterwards.
    ///
    /// Only the error/fallback/feedback rules re-run; a decision that was
    /// already a trace passes through untouched.
    pub fn upgrade(&self, decision: &SamplingDecision, facts: &PostFacts) -> SamplingDecision {
        if decision.should_trace {
            return decision.clone();
        }

        if facts.error_occurred {
            return traced("error");
        }
        if facts.fallback_triggered {
            return traced("fallback");
        }
        if facts.feedback_received {
            return traced("feedback");
        }

        decision.clone()
    }
}

fn traced(reason: &str) -> SamplingDecision {
    SamplingDecision {
        should_trace: true,
        reason: reason.to_string(),
        applied_rate: 1.0,
    }
}

/// Builder that derives sampler-relevant fields from subject metadata.
#[derive(Debug, Clone, Default)]
pub struct SamplingContextBuilder {
    context: SamplingContext,
}

impl SamplingContextBuilder {
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            context: SamplingContext {
                subject_id: subject_id.into(),
                ..Default::default()
            },
        }
    }

    pub fn force_trace(mut self, force: bool) -> Self {
        self.context.force_trace = force;
        self
    }

    pub fn error(mut self, has_error: bool) -> Self {
        self.context.has_error = has_error;
        self
    }

    pub fn fallback_level(mut self, level: FallbackLevel) -> Self {
        self.context.fallback_level = Some(level);
        self
    }

    pub fn feedback(mut self, has_feedback: bool) -> Self {
        self.context.has_feedback = has_feedback;
        self
    }

    /// Derive the account age from its creation timestamp.
    pub fn account_created_at(mut self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        self.context.account_age_days = Some((now - created_at).num_days());
        self
    }

    pub fn experiments(mut self, experiment_ids: Vec<String>) -> Self {
        self.context.experiment_ids = experiment_ids;
        self
    }

    pub fn build(self) -> SamplingContext {
        self.context
    }
}
