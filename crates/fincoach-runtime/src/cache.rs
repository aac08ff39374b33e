//! Caching layer for judge reports.
//!
//! Identical recommendation text scored against an identical criteria set
//! yields an identical report, so re-judging it only burns tokens. Entries
//! are TTL-bounded; the cache never outlives a criteria change because the
//! criteria participate in the key.

use moka::future::Cache;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use fincoach_core::types::{JudgeCriterion, JudgeReport};

/// Cache key for judge evaluations.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JudgeCacheKey {
    text_hash: u64,
    criteria_hash: u64,
}

impl JudgeCacheKey {
    pub fn new(recommendation_text: &str, criteria: &[JudgeCriterion]) -> Self {
        Self {
            text_hash: hash_str(recommendation_text),
            criteria_hash: hash_criteria(criteria),
        }
    }
}

/// Judge-report cache using moka.
pub struct JudgeCache {
    cache: Cache<JudgeCacheKey, JudgeReport>,
}

impl JudgeCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, key: &JudgeCacheKey) -> Option<JudgeReport> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: JudgeCacheKey, report: JudgeReport) {
        self.cache.insert(key, report).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for JudgeCache {
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(3600))
    }
}

// Hash helpers

fn hash_str(s: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

fn hash_criteria(criteria: &[JudgeCriterion]) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    let mut hasher = DefaultHasher::new();
    for criterion in criteria {
        criterion.name.hash(&mut hasher);
        criterion.rubric.hash(&mut hasher);
        criterion.weight.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fincoach_core::config::JudgeConfig;
    use fincoach_core::judge::fallback_report;

    #[tokio::test]
    async fn test_cache_round_trip() {
        let cache = JudgeCache::default();
        let criteria = JudgeConfig::default().criteria;
        let key = JudgeCacheKey::new("Save ten a week.", &criteria);

        assert!(cache.get(&key).await.is_none());

        let report = fallback_report(&criteria, "test");
        cache.insert(key.clone(), report).await;

        let cached = cache.get(&key).await;
        assert!(cached.is_some());
        assert_eq!(cached.unwrap().average_confidence, 0.3);
    }

    #[test]
    fn test_key_varies_with_text_and_criteria() {
        let criteria = JudgeConfig::default().criteria;
        let a = JudgeCacheKey::new("text a", &criteria);
        let b = JudgeCacheKey::new("text b", &criteria);
        assert_ne!(a, b);

        let fewer = &criteria[..2];
        let c = JudgeCacheKey::new("text a", fewer);
        assert_ne!(a, c);
    }
}
