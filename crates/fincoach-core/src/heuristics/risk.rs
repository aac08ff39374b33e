//! Risk-keyword scanner.
//!
//! Case-insensitive substring scan against a high-risk vocabulary and a
//! safe vocabulary, with contextual escalation for users in deficit or
//! carrying debt. Becomes a critical (veto-capable) check when the text
//! accumulates enough distinct high-risk language.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;
use crate::types::{FinancialSituation, HeuristicResult, UserContext};

pub const CHECK_NAME: &str = "risk_keywords";

const BASE_RISK: f64 = 0.3;
const HIGH_RISK_INCREMENT: f64 = 0.3;
const SAFE_DECREMENT: f64 = 0.1;
const DEFICIT_ESCALATION: f64 = 0.2;
const DEBT_BORROWING_ESCALATION: f64 = 0.15;

lazy_static! {
    /// Phrases that read as encouragement to take on new debt. Only
    /// consulted when the user already holds debt.
    static ref BORROWING_PHRASES: Vec<&'static str> = vec![
        "take out a loan",
        "take out a credit card",
        "open a credit card",
        "borrow",
        "financing",
        "line of credit",
        "buy now pay later",
        "take on debt",
    ];
}

/// Risk tier derived from the escalated score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Severe,
}

impl RiskLevel {
    fn from_score(score: f64) -> Self {
        if score < 0.3 {
            Self::Low
        } else if score < 0.5 {
            Self::Moderate
        } else if score < 0.8 {
            Self::High
        } else {
            Self::Severe
        }
    }
}

fn distinct_hits<'a>(lower_text: &str, terms: impl Iterator<Item = &'a str>) -> Vec<String> {
    terms
        .filter(|term| lower_text.contains(&term.to_lowercase()))
        .map(|term| term.to_string())
        .collect()
}

fn encourages_borrowing(lower_text: &str) -> bool {
    BORROWING_PHRASES.iter().any(|p| lower_text.contains(p))
}

/// Scan `text` for risky language, escalated by the user's situation.
pub fn check(text: &str, context: &UserContext, vocab: &RiskConfig) -> HeuristicResult {
    let lower = text.to_lowercase();

    let high_risk_hits = distinct_hits(&lower, vocab.high_risk_terms.iter().map(String::as_str));
    let safe_hits = distinct_hits(&lower, vocab.safe_terms.iter().map(String::as_str));

    let mut risk = BASE_RISK + HIGH_RISK_INCREMENT * high_risk_hits.len() as f64
        - SAFE_DECREMENT * safe_hits.len() as f64;
    risk = risk.clamp(0.0, 1.0);

    let mut details: Vec<String> = high_risk_hits
        .iter()
        .map(|t| format!("high-risk term: '{t}'"))
        .collect();

    // Contextual escalation on top of the clamped lexical score.
    if context.situation == FinancialSituation::Deficit && !high_risk_hits.is_empty() {
        risk += DEFICIT_ESCALATION;
        details.push("escalated: risky language while user is in deficit".to_string());
    }
    if context.has_debt && encourages_borrowing(&lower) {
        risk += DEBT_BORROWING_ESCALATION;
        details.push("escalated: encourages borrowing while user holds debt".to_string());
    }
    risk = risk.clamp(0.0, 1.0);

    let level = RiskLevel::from_score(risk);
    let is_critical = high_risk_hits.len() >= 2 || level == RiskLevel::Severe;
    let passed = risk < 0.5;

    if is_critical && !passed {
        tracing::warn!(
            risk_score = risk,
            level = ?level,
            hits = high_risk_hits.len(),
            "risk scanner flagged recommendation as critical"
        );
    }

    HeuristicResult {
        name: CHECK_NAME.to_string(),
        passed,
        score: 1.0 - risk,
        is_critical,
        message: format!(
            "risk score {risk:.2} ({level:?}), {} high-risk / {} safe terms",
            high_risk_hits.len(),
            safe_hits.len()
        ),
        details,
    }
}
