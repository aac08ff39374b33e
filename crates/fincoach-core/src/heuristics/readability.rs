//! Readability check: Flesch reading ease against a configured floor.
//!
//! Coaching copy for students should sit in plain-language territory.
//! Non-critical; a dense paragraph lowers the aggregate but cannot veto.

use crate::types::HeuristicResult;

pub const CHECK_NAME: &str = "readability";

/// Count syllables with the usual vowel-group heuristic: contiguous vowel
/// runs, minus a silent trailing 'e', floor of one per word.
fn syllables(word: &str) -> usize {
    let lower: Vec<char> = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();
    if lower.is_empty() {
        return 0;
    }

    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');

    let mut count = 0usize;
    let mut prev_vowel = false;
    for &c in &lower {
        let vowel = is_vowel(c);
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }

    if count > 1 && lower.ends_with(&['e']) && !lower.ends_with(&['l', 'e']) {
        count -= 1;
    }

    count.max(1)
}

fn sentence_count(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|s| s.chars().any(|c| c.is_alphanumeric()))
        .count()
        .max(1)
}

/// Flesch reading ease for `text`. Unbounded above/below per the formula;
/// typical prose lands in [0, 100].
pub fn reading_ease(text: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }

    let word_count = words.len() as f64;
    let sentence_total = sentence_count(text) as f64;
    let syllable_total: usize = words.iter().map(|w| syllables(w)).sum();

    206.835 - 1.015 * (word_count / sentence_total) - 84.6 * (syllable_total as f64 / word_count)
}

/// Fails below `floor`; score is the ease scaled into [0, 1].
pub fn check(text: &str, floor: f64) -> HeuristicResult {
    let ease = reading_ease(text);
    let passed = ease >= floor;

    HeuristicResult {
        name: CHECK_NAME.to_string(),
        passed,
        score: (ease / 100.0).clamp(0.0, 1.0),
        is_critical: false,
        message: if passed {
            format!("reading ease {ease:.1} meets floor {floor:.1}")
        } else {
            format!("reading ease {ease:.1} below floor {floor:.1}")
        },
        details: vec![],
    }
}
