//! `fincoach` — operator CLI for the deterministic decision core.
//!
//! Runs the gate, bucketing, and sampling without an LLM backend, for
//! debugging configurations and recommendation files locally. The judge
//! side of the gate is a neutral placeholder here; production judging
//! happens in `fincoach-runtime`.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use fincoach_core::judge::fallback_report;
use fincoach_core::types::{
    ExperimentConfig, FallbackLevel, FinancialSituation, Recommendation, SamplingContext,
    UserContext,
};
use fincoach_core::{
    validate_experiment, CoachConfig, GuardianAggregator, HeuristicsEngine, TraceSampler,
    VariantBucketer,
};

#[derive(Parser)]
#[command(name = "fincoach", version, about = "Fincoach advice-gate tooling")]
struct Cli {
    /// Path to a CoachConfig YAML; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Gate a recommendation JSON file through the deterministic checks.
    Gate {
        /// Recommendation file: {"text": ..., "calculations": [...]}.
        recommendation: PathBuf,

        /// Treat the user as running a deficit.
        #[arg(long)]
        deficit: bool,

        /// Treat the user as holding debt.
        #[arg(long)]
        has_debt: bool,
    },

    /// Compute a subject's variant for an experiment YAML.
    Assign {
        /// Experiment file: name, variant_ids, traffic_split, enabled.
        experiment: PathBuf,

        #[arg(long)]
        subject: String,
    },

    /// Evaluate a trace-sampling decision for a context given as flags.
    Sample {
        #[arg(long)]
        subject: String,

        #[arg(long)]
        force: bool,

        #[arg(long)]
        error: bool,

        /// Fallback level the response was served at (0-3).
        #[arg(long)]
        fallback_level: Option<u8>,

        #[arg(long)]
        feedback: bool,

        #[arg(long)]
        account_age_days: Option<i64>,

        /// Experiment the subject is enrolled in; repeatable.
        #[arg(long = "experiment")]
        experiments: Vec<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config)?;
    tracing::debug!("configuration loaded");

    match cli.command {
        Command::Gate {
            recommendation,
            deficit,
            has_debt,
        } => {
            let raw = fs::read_to_string(&recommendation)
                .with_context(|| format!("reading {}", recommendation.display()))?;
            let recommendation: Recommendation =
                serde_json::from_str(&raw).context("parsing recommendation JSON")?;

            let user = UserContext {
                situation: if deficit {
                    FinancialSituation::Deficit
                } else {
                    FinancialSituation::Balanced
                },
                has_debt,
            };

            let engine = HeuristicsEngine::new(config.heuristics.clone(), config.risk.clone());
            let guardian = GuardianAggregator::new(config.guardian.clone());

            let heuristics = engine.evaluate(&recommendation, &user);
            // No LLM here: blend against a neutral judge placeholder.
            let judge = fallback_report(&config.judge.criteria, "cli: judge not run");
            let verdict = guardian.decide(heuristics, judge);

            let accepted = verdict.accepted;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
            Ok(if accepted {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Command::Assign {
            experiment,
            subject,
        } => {
            let raw = fs::read_to_string(&experiment)
                .with_context(|| format!("reading {}", experiment.display()))?;
            let experiment: ExperimentConfig =
                serde_yaml::from_str(&raw).context("parsing experiment YAML")?;
            validate_experiment(&experiment).context("invalid experiment")?;

            let assignment = VariantBucketer::new().assign(&subject, &experiment);
            println!("{}", serde_json::to_string_pretty(&assignment)?);
            Ok(ExitCode::SUCCESS)
        }

        Command::Sample {
            subject,
            force,
            error,
            fallback_level,
            feedback,
            account_age_days,
            experiments,
        } => {
            let context = SamplingContext {
                subject_id: subject,
                force_trace: force,
                has_error: error,
                fallback_level: fallback_level.map(parse_level).transpose()?,
                has_feedback: feedback,
                account_age_days,
                experiment_ids: experiments,
            };

            let decision = TraceSampler::new(config.sampler.clone()).decide(&context);
            println!("{}", serde_json::to_string_pretty(&decision)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<CoachConfig> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            CoachConfig::from_yaml(&raw).context("invalid configuration")
        }
        None => Ok(CoachConfig::default()),
    }
}

fn parse_level(ordinal: u8) -> Result<FallbackLevel> {
    Ok(match ordinal {
        0 => FallbackLevel::FullPipeline,
        1 => FallbackLevel::SingleAgent,
        2 => FallbackLevel::Algorithmic,
        3 => FallbackLevel::Static,
        other => anyhow::bail!("fallback level must be 0-3, got {other}"),
    })
}
