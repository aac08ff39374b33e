//! Configuration surface for the decision core.
//!
//! Every tunable lives here with a documented default, and every instance
//! is validated once at load time. A malformed configuration aborts
//! startup; nothing in this module is recoverable per-request.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::types::{ExperimentConfig, JudgeCriterion};

/// Tolerance for floating-point weight sums.
const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Errors detected while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{scope} weights sum to {sum}, expected 1.0")]
    WeightSum { scope: &'static str, sum: f64 },

    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("experiment '{name}': {reason}")]
    Experiment { name: String, reason: String },
}

/// Guardian blend and acceptance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardianConfig {
    /// Weight given to heuristic evidence in the blended score; the judge
    /// receives `1 - alpha`. Default 0.5: equal trust in deterministic
    /// checks and LLM judgment.
    pub alpha: f64,

    /// Minimum blended score for acceptance. Default 0.6.
    pub acceptance_threshold: f64,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            acceptance_threshold: 0.6,
        }
    }
}

/// Per-check weights for heuristic aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicWeights {
    pub calculation: f64,
    pub risk: f64,
    pub readability: f64,
    pub tone: f64,
    pub disclaimers: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            calculation: 0.30,
            risk: 0.25,
            readability: 0.15,
            tone: 0.15,
            disclaimers: 0.15,
        }
    }
}

impl HeuristicWeights {
    fn sum(&self) -> f64 {
        self.calculation + self.risk + self.readability + self.tone + self.disclaimers
    }
}

/// Settings for the deterministic heuristic checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicsConfig {
    #[serde(default)]
    pub weights: HeuristicWeights,

    /// Relative tolerance for the calculation validator. Default 1%.
    pub calculation_tolerance: f64,

    /// Flesch reading-ease floor below which the readability check fails.
    pub readability_floor: f64,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            weights: HeuristicWeights::default(),
            calculation_tolerance: 0.01,
            readability_floor: 50.0,
        }
    }
}

/// Risk-keyword vocabularies. Defaults are built in; deployments may
/// extend or replace them wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    pub high_risk_terms: Vec<String>,
    pub safe_terms: Vec<String>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            high_risk_terms: [
                "leverage",
                "leveraged",
                "margin trading",
                "crypto",
                "cryptocurrency",
                "day trading",
                "options trading",
                "guaranteed return",
                "guaranteed profit",
                "risk-free",
                "get rich quick",
                "double your money",
                "payday loan",
                "max out",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            safe_terms: [
                "emergency fund",
                "budget",
                "diversify",
                "diversified",
                "savings account",
                "index fund",
                "long-term",
                "consult a professional",
                "pay down debt",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// The active judge criteria set. Weights must sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    pub criteria: Vec<JudgeCriterion>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            criteria: vec![
                JudgeCriterion {
                    name: "appropriateness".to_string(),
                    description: "Advice fits a student's financial reality".to_string(),
                    rubric: "Score how well the recommendation matches the resources, \
                             income volatility, and time horizon of a student. 5 means \
                             directly applicable; 1 means aimed at a different audience."
                        .to_string(),
                    weight: 0.30,
                },
                JudgeCriterion {
                    name: "safety".to_string(),
                    description: "Advice avoids exposing the user to undue financial risk"
                        .to_string(),
                    rubric: "Score the downside if the user follows this advice exactly. \
                             5 means worst case is mild inconvenience; 1 means plausible \
                             serious harm such as unpayable debt."
                        .to_string(),
                    weight: 0.30,
                },
                JudgeCriterion {
                    name: "coherence".to_string(),
                    description: "Advice is internally consistent and well-structured".to_string(),
                    rubric: "Score logical flow and consistency between the numbers cited \
                             and the conclusions drawn. 5 means every step follows; 1 means \
                             contradictory or incoherent."
                        .to_string(),
                    weight: 0.20,
                },
                JudgeCriterion {
                    name: "actionability".to_string(),
                    description: "The user can act on the advice this week".to_string(),
                    rubric: "Score how concrete the next steps are. 5 means specific \
                             amounts and actions; 1 means vague platitudes."
                        .to_string(),
                    weight: 0.20,
                },
            ],
        }
    }
}

/// Trace-sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Base rate for the deterministic draw when no priority rule fires.
    /// Default 0.10.
    pub base_rate: f64,

    /// Accounts younger than this many days are always traced. Default 7.
    pub new_user_window_days: i64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            base_rate: 0.10,
            new_user_window_days: 7,
        }
    }
}

/// Per-level timeout budgets for the fallback cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Budget for the full multi-agent pipeline. Default 15s.
    #[serde(with = "duration_secs")]
    pub full_pipeline: Duration,

    /// Budget for the single-agent path. Default 8s.
    #[serde(with = "duration_secs")]
    pub single_agent: Duration,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            full_pipeline: Duration::from_secs(15),
            single_agent: Duration::from_secs(8),
        }
    }
}

/// The complete configuration object passed into each component at
/// construction. Replaces process-wide mutable state so tests run in
/// isolation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoachConfig {
    #[serde(default)]
    pub guardian: GuardianConfig,

    #[serde(default)]
    pub heuristics: HeuristicsConfig,

    #[serde(default)]
    pub risk: RiskConfig,

    #[serde(default)]
    pub judge: JudgeConfig,

    #[serde(default)]
    pub sampler: SamplerConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

impl CoachConfig {
    /// Load and validate a configuration from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate weight sums and value ranges. Called once at load; a
    /// failure here aborts startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("guardian.alpha", self.guardian.alpha, 0.0, 1.0)?;
        check_range(
            "guardian.acceptance_threshold",
            self.guardian.acceptance_threshold,
            0.0,
            1.0,
        )?;
        check_range(
            "heuristics.calculation_tolerance",
            self.heuristics.calculation_tolerance,
            0.0,
            1.0,
        )?;
        check_range("sampler.base_rate", self.sampler.base_rate, 0.0, 1.0)?;

        let heuristic_sum = self.heuristics.weights.sum();
        if (heuristic_sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigError::WeightSum {
                scope: "heuristics",
                sum: heuristic_sum,
            });
        }

        let judge_sum: f64 = self.judge.criteria.iter().map(|c| c.weight).sum();
        if (judge_sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigError::WeightSum {
                scope: "judge",
                sum: judge_sum,
            });
        }

        Ok(())
    }
}

/// Validate an experiment definition. Fatal at load time.
pub fn validate_experiment(experiment: &ExperimentConfig) -> Result<(), ConfigError> {
    if experiment.variant_ids.is_empty() {
        return Err(ConfigError::Experiment {
            name: experiment.name.clone(),
            reason: "no variants defined".to_string(),
        });
    }

    if experiment.variant_ids.len() != experiment.traffic_split.len() {
        return Err(ConfigError::Experiment {
            name: experiment.name.clone(),
            reason: format!(
                "{} variants but {} traffic splits",
                experiment.variant_ids.len(),
                experiment.traffic_split.len()
            ),
        });
    }

    if experiment.traffic_split.iter().any(|&s| !(0.0..=1.0).contains(&s)) {
        return Err(ConfigError::Experiment {
            name: experiment.name.clone(),
            reason: "traffic split entries must be within [0, 1]".to_string(),
        });
    }

    let sum: f64 = experiment.traffic_split.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
        return Err(ConfigError::Experiment {
            name: experiment.name.clone(),
            reason: format!("traffic split sums to {sum}, expected 1.0"),
        });
    }

    Ok(())
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value.is_nan() || value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}
