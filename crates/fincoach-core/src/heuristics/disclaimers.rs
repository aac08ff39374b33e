//! Disclaimer check: recommendations touching credit, investment, or debt
//! must carry appropriate caveats. Non-critical.

use lazy_static::lazy_static;

use crate::types::HeuristicResult;

pub const CHECK_NAME: &str = "disclaimers";

lazy_static! {
    static ref SENSITIVE_TOPICS: Vec<(&'static str, Vec<&'static str>)> = vec![
        ("credit", vec!["credit score", "credit card", "credit history", "credit limit"]),
        ("investment", vec!["invest", "stock", "etf", "index fund", "portfolio", "returns"]),
        ("debt", vec!["loan", "debt", "interest rate", "refinanc", "repayment"]),
    ];

    static ref CAVEAT_PHRASES: Vec<&'static str> = vec![
        "not financial advice",
        "consider consulting",
        "speak with a",
        "talk to a",
        "results may vary",
        "your situation may differ",
        "no guarantee",
        "past performance",
        "depends on your",
    ];
}

/// Which sensitive topics appear in the text.
fn detected_topics(lower_text: &str) -> Vec<&'static str> {
    SENSITIVE_TOPICS
        .iter()
        .filter(|(_, markers)| markers.iter().any(|m| lower_text.contains(m)))
        .map(|(topic, _)| *topic)
        .collect()
}

fn has_caveat(lower_text: &str) -> bool {
    CAVEAT_PHRASES.iter().any(|p| lower_text.contains(p))
}

/// Pass when the text carries no sensitive topic, or carries one alongside
/// caveat language.
pub fn check(text: &str) -> HeuristicResult {
    let lower = text.to_lowercase();
    let topics = detected_topics(&lower);

    if topics.is_empty() {
        return HeuristicResult {
            name: CHECK_NAME.to_string(),
            passed: true,
            score: 1.0,
            is_critical: false,
            message: "no sensitive topics; no disclaimer required".to_string(),
            details: vec![],
        };
    }

    let caveated = has_caveat(&lower);

    HeuristicResult {
        name: CHECK_NAME.to_string(),
        passed: caveated,
        score: if caveated { 1.0 } else { 0.3 },
        is_critical: false,
        message: if caveated {
            format!("sensitive topics ({}) carry caveats", topics.join(", "))
        } else {
            format!("sensitive topics ({}) lack caveats", topics.join(", "))
        },
        details: topics.iter().map(|t| format!("topic: {t}")).collect(),
    }
}
