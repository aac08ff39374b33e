//! Deterministic experiment bucketing.
//!
//! Same `(subject, experiment)` pair, same variant, forever, in every
//! process, with no coordination. The hash is FNV-1a with a SplitMix64
//! finalizer: cheap, stable across platforms, and not cryptographic —
//! repeatability is the point, not secrecy.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::types::{ExperimentConfig, VariantAssignment};

/// Stable 64-bit hash for bucketing draws.
#[must_use]
pub fn stable_hash64(s: &str) -> u64 {
    let mut h: u64 = 14695981039346656037;
    for b in s.as_bytes() {
        h ^= u64::from(*b);
        h = h.wrapping_mul(1099511628211);
    }
    splitmix64(h)
}

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Map a hash to [0, 1) using the high 53 bits (the full f64 mantissa).
#[must_use]
pub fn unit_interval(hash: u64) -> f64 {
    (hash >> 11) as f64 / (1u64 << 53) as f64
}

/// Assigns subjects to experiment variants.
///
/// The override table is the only mutable state: small, rarely written
/// (debug/testing use), guarded by a read-write lock, and owned by the
/// instance rather than the process.
#[derive(Debug, Default)]
pub struct VariantBucketer {
    overrides: RwLock<HashMap<(String, String), String>>,
}

impl VariantBucketer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a subject to a variant for one experiment. Takes precedence
    /// over the computed assignment.
    pub fn set_override(
        &self,
        subject_id: impl Into<String>,
        experiment: impl Into<String>,
        variant_id: impl Into<String>,
    ) {
        self.overrides
            .write()
            .insert((subject_id.into(), experiment.into()), variant_id.into());
    }

    /// Remove a pinned assignment.
    pub fn clear_override(&self, subject_id: &str, experiment: &str) {
        self.overrides
            .write()
            .remove(&(subject_id.to_string(), experiment.to_string()));
    }

    /// Deterministically assign `subject_id` to a variant of `experiment`.
    ///
    /// `experiment` must have passed [`crate::config::validate_experiment`]
    /// at load time. Disabled experiments pin everyone to the first
    /// variant (control).
    pub fn assign(&self, subject_id: &str, experiment: &ExperimentConfig) -> VariantAssignment {
        if let Some(variant) = self
            .overrides
            .read()
            .get(&(subject_id.to_string(), experiment.name.clone()))
        {
            return VariantAssignment {
                experiment: experiment.name.clone(),
                variant_id: variant.clone(),
            };
        }

        if !experiment.enabled {
            return VariantAssignment {
                experiment: experiment.name.clone(),
                variant_id: experiment.variant_ids[0].clone(),
            };
        }

        let draw = unit_interval(stable_hash64(&format!(
            "{subject_id}:{}",
            experiment.name
        )));

        // Walk cumulative split boundaries; the draw lands in the first
        // bucket whose upper boundary exceeds it. Floating-point slack on
        // the final boundary falls through to the last variant.
        let mut boundary = 0.0;
        for (variant, split) in experiment.variant_ids.iter().zip(&experiment.traffic_split) {
            boundary += split;
            if draw < boundary {
                return VariantAssignment {
                    experiment: experiment.name.clone(),
                    variant_id: variant.clone(),
                };
            }
        }

        VariantAssignment {
            experiment: experiment.name.clone(),
            variant_id: experiment.variant_ids[experiment.variant_ids.len() - 1].clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn experiment(splits: &[f64]) -> ExperimentConfig {
        ExperimentConfig {
            name: "cta_wording".to_string(),
            variant_ids: (0..splits.len()).map(|i| format!("v{i}")).collect(),
            traffic_split: splits.to_vec(),
            enabled: true,
        }
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let bucketer = VariantBucketer::new();
        let exp = experiment(&[0.5, 0.5]);

        let first = bucketer.assign("user-42", &exp);
        let second = bucketer.assign("user-42", &exp);
        assert_eq!(first, second);
    }

    #[test]
    fn test_different_experiments_hash_independently() {
        let bucketer = VariantBucketer::new();
        let a = experiment(&[0.5, 0.5]);
        let mut b = experiment(&[0.5, 0.5]);
        b.name = "other_experiment".to_string();

        // Not a strict requirement for any single subject, but across a
        // population the assignments must not be perfectly correlated.
        let differs = (0..100).any(|i| {
            let id = format!("user-{i}");
            bucketer.assign(&id, &a).variant_id != bucketer.assign(&id, &b).variant_id
        });
        assert!(differs);
    }

    #[test]
    fn test_override_takes_precedence() {
        let bucketer = VariantBucketer::new();
        let exp = experiment(&[0.5, 0.5]);

        bucketer.set_override("user-42", "cta_wording", "v1");
        assert_eq!(bucketer.assign("user-42", &exp).variant_id, "v1");

        bucketer.clear_override("user-42", "cta_wording");
        let computed = bucketer.assign("user-42", &exp);
        assert_eq!(computed, bucketer.assign("user-42", &exp));
    }

    #[test]
    fn test_disabled_experiment_assigns_control() {
        let bucketer = VariantBucketer::new();
        let mut exp = experiment(&[0.1, 0.9]);
        exp.enabled = false;

        for i in 0..50 {
            assert_eq!(bucketer.assign(&format!("u{i}"), &exp).variant_id, "v0");
        }
    }

    #[test]
    fn test_split_proportions_roughly_hold() {
        let bucketer = VariantBucketer::new();
        let exp = experiment(&[0.2, 0.8]);

        let total = 10_000;
        let v0 = (0..total)
            .filter(|i| bucketer.assign(&format!("subject-{i}"), &exp).variant_id == "v0")
            .count();

        let fraction = v0 as f64 / total as f64;
        assert!(
            (fraction - 0.2).abs() < 0.02,
            "v0 fraction {fraction} too far from 0.2"
        );
    }

    #[test]
    fn test_unit_interval_bounds() {
        assert!(unit_interval(0) >= 0.0);
        assert!(unit_interval(u64::MAX) < 1.0);
    }

    proptest! {
        #[test]
        fn prop_assign_is_idempotent(subject in "[a-z0-9-]{1,32}") {
            let bucketer = VariantBucketer::new();
            let exp = experiment(&[0.3, 0.3, 0.4]);
            let first = bucketer.assign(&subject, &exp);
            let second = bucketer.assign(&subject, &exp);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_assigned_variant_exists(subject in "[a-z0-9-]{1,32}") {
            let bucketer = VariantBucketer::new();
            let exp = experiment(&[0.3, 0.3, 0.4]);
            let assignment = bucketer.assign(&subject, &exp);
            prop_assert!(exp.variant_ids.contains(&assignment.variant_id));
        }
    }
}
