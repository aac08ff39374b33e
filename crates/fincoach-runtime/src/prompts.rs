//! Prompts for the LLM judge.
//!
//! Layout follows the cache-friendly split: a static base prompt shared by
//! every call, then the per-call rubric and recommendation text. The base
//! prompt frames the judge as a scorer of pre-defined criteria, not an
//! author or editor.

use fincoach_core::types::JudgeCriterion;

/// Base system prompt for all judge calls.
pub const JUDGE_SYSTEM_PROMPT: &str = r#"
You are a quality judge for a student financial-coaching product.

You score recommendation text against specific, pre-defined criteria.
You do not rewrite the recommendation.
You do not invent criteria.
You do not give financial advice yourself.

## Scoring
For each criterion, give an integer score from 1 to 5:
- 5: fully satisfies the criterion
- 3: partially satisfies it
- 1: clearly fails it

Also report your confidence in each score from 0.0 to 1.0 and one or two
sentences of reasoning grounded in the recommendation text.

## Output Format (JSON only)
{
  "evaluations": [
    {
      "criterion": "string",
      "score": 1-5,
      "confidence": 0.0-1.0,
      "reasoning": "string"
    }
  ],
  "overall_reasoning": "string"
}

Return the JSON object and nothing else.
"#;

/// Build the user prompt for batch mode: all criteria in one call.
pub fn batch_user_prompt(
    recommendation_text: &str,
    context_summary: &str,
    criteria: &[JudgeCriterion],
) -> String {
    let mut prompt = String::from("## Criteria\n");
    for criterion in criteria {
        prompt.push_str(&format!(
            "- {}: {}\n  Rubric: {}\n",
            criterion.name, criterion.description, criterion.rubric
        ));
    }

    prompt.push_str("\n## User Situation\n");
    prompt.push_str(context_summary);

    prompt.push_str("\n\n## Recommendation To Score\n");
    prompt.push_str(recommendation_text);

    prompt.push_str("\n\nScore every criterion listed above.");
    prompt
}

/// Build the user prompt for individual mode: one criterion per call.
pub fn single_user_prompt(
    recommendation_text: &str,
    context_summary: &str,
    criterion: &JudgeCriterion,
) -> String {
    format!(
        "## Criterion\n{}: {}\nRubric: {}\n\n## User Situation\n{}\n\n\
         ## Recommendation To Score\n{}\n\n\
         Return a JSON object with \"score\", \"confidence\", and \"reasoning\" \
         for this one criterion.",
        criterion.name, criterion.description, criterion.rubric, context_summary, recommendation_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fincoach_core::config::JudgeConfig;

    #[test]
    fn test_system_prompt_pins_output_format() {
        assert!(JUDGE_SYSTEM_PROMPT.contains("evaluations"));
        assert!(JUDGE_SYSTEM_PROMPT.contains("JSON"));
        assert!(JUDGE_SYSTEM_PROMPT.contains("1 to 5"));
    }

    #[test]
    fn test_batch_prompt_lists_every_criterion() {
        let criteria = JudgeConfig::default().criteria;
        let prompt = batch_user_prompt("Save more.", "balanced budget", &criteria);

        for criterion in &criteria {
            assert!(prompt.contains(&criterion.name));
        }
        assert!(prompt.contains("Save more."));
    }

    #[test]
    fn test_single_prompt_names_its_criterion() {
        let criteria = JudgeConfig::default().criteria;
        let prompt = single_user_prompt("Save more.", "balanced budget", &criteria[1]);
        assert!(prompt.contains("safety"));
        assert!(!prompt.contains("actionability"));
    }
}
