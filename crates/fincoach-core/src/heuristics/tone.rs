//! Tone check: lexical scan for harshness and condescension.
//!
//! Advice that blames or talks down to the user erodes trust even when the
//! numbers are right. Non-critical.

use lazy_static::lazy_static;

use crate::types::HeuristicResult;

pub const CHECK_NAME: &str = "tone";

lazy_static! {
    static ref HARSH_PHRASES: Vec<&'static str> = vec![
        "you failed",
        "your fault",
        "irresponsible",
        "reckless",
        "stupid",
        "lazy",
        "you should have known",
        "you wasted",
        "terrible decision",
    ];

    static ref CONDESCENDING_PHRASES: Vec<&'static str> = vec![
        "obviously",
        "everyone knows",
        "as you should know",
        "it's simple, just",
        "simply stop",
        "basic common sense",
        "even a child",
    ];
}

/// Scan `text` for harsh or condescending phrasing. Each distinct hit
/// costs a quarter of the score.
pub fn check(text: &str) -> HeuristicResult {
    let lower = text.to_lowercase();

    let mut details = Vec::new();
    for phrase in HARSH_PHRASES.iter() {
        if lower.contains(phrase) {
            details.push(format!("harsh phrasing: '{phrase}'"));
        }
    }
    for phrase in CONDESCENDING_PHRASES.iter() {
        if lower.contains(phrase) {
            details.push(format!("condescending phrasing: '{phrase}'"));
        }
    }

    let hits = details.len();
    let passed = hits == 0;

    HeuristicResult {
        name: CHECK_NAME.to_string(),
        passed,
        score: (1.0 - 0.25 * hits as f64).clamp(0.0, 1.0),
        is_critical: false,
        message: if passed {
            "tone is supportive".to_string()
        } else {
            format!("{hits} tone issue(s) detected")
        },
        details,
    }
}
