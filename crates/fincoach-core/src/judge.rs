//! Judge report parsing and aggregation.
//!
//! The LLM judge produces EVIDENCE, not verdicts, and its output is never
//! trusted to be well-formed. Parsing is two-stage (fenced JSON, then a
//! permissive brace scan), every field is range-validated, and any failure
//! degrades to a neutral placeholder instead of an error. A parse failure
//! must never take the gate down.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::types::{JudgeCriterion, JudgeCriterionResult, JudgeReport};

/// Confidence reported when the whole response was unusable.
const FALLBACK_CONFIDENCE: f64 = 0.3;

lazy_static! {
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fence regex");
}

/// Wire shape of a batch judge response.
#[derive(Debug, Deserialize)]
struct RawBatchResponse {
    evaluations: Vec<RawCriterionScore>,
    #[serde(default)]
    overall_reasoning: Option<String>,
}

/// Wire shape of one criterion score; also the whole body in individual
/// mode, where `criterion` is implied by the prompt.
#[derive(Debug, Deserialize)]
struct RawCriterionScore {
    #[serde(default)]
    criterion: Option<String>,
    score: Option<serde_json::Value>,
    confidence: Option<f64>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Pull a JSON object out of a model response: fenced block first, then
/// the outermost brace pair.
pub fn extract_json(response: &str) -> Option<String> {
    if let Some(caps) = CODE_FENCE.captures(response) {
        return Some(caps[1].to_string());
    }

    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end > start {
        Some(response[start..=end].to_string())
    } else {
        None
    }
}

/// Validate a raw score into a criterion result; `None` means the caller
/// substitutes a placeholder.
fn validate_score(raw: &RawCriterionScore, criterion: &str) -> Option<JudgeCriterionResult> {
    let score = raw.score.as_ref()?.as_i64()?;
    if !(1..=5).contains(&score) {
        return None;
    }

    let confidence = raw.confidence?;
    if !(0.0..=1.0).contains(&confidence) {
        return None;
    }

    Some(JudgeCriterionResult {
        criterion: criterion.to_string(),
        raw_score: score as u8,
        normalized_score: (score as f64 - 1.0) / 4.0,
        confidence,
        reasoning: raw.reasoning.clone().unwrap_or_default(),
    })
}

/// Parse a batch response scoring all `criteria` at once.
///
/// Criteria the response misses or mangles become placeholders; a response
/// with no parseable JSON at all yields the whole-report fallback.
pub fn parse_batch(response: &str, criteria: &[JudgeCriterion]) -> JudgeReport {
    let parsed: Option<RawBatchResponse> = extract_json(response)
        .and_then(|json| serde_json::from_str(&json).ok());

    let Some(batch) = parsed else {
        tracing::warn!("judge batch response had no parseable JSON; using fallback report");
        return fallback_report(criteria, "judge response could not be parsed");
    };

    let results: Vec<JudgeCriterionResult> = criteria
        .iter()
        .map(|criterion| {
            batch
                .evaluations
                .iter()
                .find(|raw| {
                    raw.criterion
                        .as_deref()
                        .is_some_and(|name| name.eq_ignore_ascii_case(&criterion.name))
                })
                .and_then(|raw| validate_score(raw, &criterion.name))
                .unwrap_or_else(|| {
                    tracing::debug!(criterion = %criterion.name, "criterion missing or invalid; placeholder used");
                    JudgeCriterionResult::placeholder(&criterion.name)
                })
        })
        .collect();

    let overall = batch.overall_reasoning.unwrap_or_default();
    build_report(results, criteria, overall)
}

/// Parse a single-criterion response (individual mode).
pub fn parse_single(response: &str, criterion: &JudgeCriterion) -> JudgeCriterionResult {
    extract_json(response)
        .and_then(|json| serde_json::from_str::<RawCriterionScore>(&json).ok())
        .and_then(|raw| validate_score(&raw, &criterion.name))
        .unwrap_or_else(|| JudgeCriterionResult::placeholder(&criterion.name))
}

/// Assemble a report from per-criterion results.
///
/// The aggregate weights each normalized score by its configured weight
/// (weights sum to 1.0 by config validation); confidence is an unweighted
/// mean.
pub fn build_report(
    results: Vec<JudgeCriterionResult>,
    criteria: &[JudgeCriterion],
    overall_reasoning: String,
) -> JudgeReport {
    let aggregated_score = results
        .iter()
        .map(|r| {
            let weight = criteria
                .iter()
                .find(|c| c.name == r.criterion)
                .map(|c| c.weight)
                .unwrap_or(0.0);
            r.normalized_score * weight
        })
        .sum::<f64>()
        .clamp(0.0, 1.0);

    let average_confidence = if results.is_empty() {
        0.0
    } else {
        results.iter().map(|r| r.confidence).sum::<f64>() / results.len() as f64
    };

    JudgeReport {
        results,
        aggregated_score,
        average_confidence,
        overall_reasoning,
    }
}

/// Whole-report fallback: every criterion neutral, depressed confidence,
/// the parse error recorded for observability.
pub fn fallback_report(criteria: &[JudgeCriterion], error: &str) -> JudgeReport {
    let results: Vec<JudgeCriterionResult> = criteria
        .iter()
        .map(|c| JudgeCriterionResult::placeholder(&c.name))
        .collect();

    let mut report = build_report(results, criteria, error.to_string());
    report.average_confidence = FALLBACK_CONFIDENCE;
    report
}
