//! Memoized scoring keyed on a content hash of the request

use crate::error::{Result, ScorerError};
use crate::output::report::ScoreReport;
use crate::processing::analyzer::{ScoreRequest, ScoringEngine};
use log::debug;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

pub struct CachedScorer {
    engine: ScoringEngine,
    cache: HashMap<u64, CacheEntry>,
    capacity: usize,
    enable_cache: bool,
    tick: u64,
}

/// The request is kept beside its report so a digest collision is a miss, not a wrong hit.
struct CacheEntry {
    request: ScoreRequest,
    report: ScoreReport,
    last_used: u64,
}

impl CachedScorer {
    pub fn new(engine: ScoringEngine) -> Self {
        let enable_cache = engine.config().scoring.enable_caching;
        let capacity = engine.config().scoring.cache_capacity;
        Self {
            engine,
            cache: HashMap::new(),
            capacity,
            enable_cache,
            tick: 0,
        }
    }

    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        while self.cache.len() > capacity {
            self.evict_least_recent();
        }
        self
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Score through the cache. Validation errors are never cached.
    pub fn score(&mut self, request: &ScoreRequest) -> Result<ScoreReport> {
        if !self.enable_cache || self.capacity == 0 {
            return self.engine.score(request);
        }

        let key = request_key(request)?;
        self.tick += 1;
        if let Some(entry) = self.cache.get_mut(&key) {
            if entry.request == *request {
                debug!("Using cached score for request {:016x}", key);
                entry.last_used = self.tick;
                return Ok(entry.report.clone());
            }
            debug!("Cache key {:016x} collides with a different request", key);
        }

        let report = self.engine.score(request)?;
        if !self.cache.contains_key(&key) && self.cache.len() >= self.capacity {
            self.evict_least_recent();
        }
        self.cache.insert(
            key,
            CacheEntry {
                request: request.clone(),
                report: report.clone(),
                last_used: self.tick,
            },
        );
        Ok(report)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .cache
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| *key);
        if let Some(key) = oldest {
            debug!("Evicting cached score {:016x}", key);
            self.cache.remove(&key);
        }
    }
}

/// Hash of the serialized resume, job description, role, level and as-of month.
pub fn request_key(request: &ScoreRequest) -> Result<u64> {
    let resume = serde_json::to_string(&request.resume)
        .map_err(|e| ScorerError::Processing(format!("Failed to hash resume: {}", e)))?;

    let mut hasher = DefaultHasher::new();
    resume.hash(&mut hasher);
    request.job_description.hash(&mut hasher);
    request.role.trim().to_lowercase().hash(&mut hasher);
    request.level.trim().to_lowercase().hash(&mut hasher);
    request.as_of.hash(&mut hasher);
    Ok(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::processing::document::{ResumeDocument, YearMonth};

    fn request() -> ScoreRequest {
        let resume = ResumeDocument {
            skills: vec!["Python".to_string(), "SQL".to_string()],
            ..Default::default()
        };
        ScoreRequest::new(resume, "data_analyst", "mid", "2024-06".parse().unwrap())
    }

    #[test]
    fn test_cache_hit_returns_same_report() {
        let mut scorer = CachedScorer::new(ScoringEngine::new(&Config::default()).unwrap());
        let first = scorer.score(&request()).unwrap();
        let second = scorer.score(&request()).unwrap();
        assert_eq!(first, second);
        assert_eq!(scorer.cache_size(), 1);

        scorer.score(&request().with_job_description("Requirements: SQL required")).unwrap();
        assert_eq!(scorer.cache_size(), 2);

        scorer.clear_cache();
        assert_eq!(scorer.cache_size(), 0);
    }

    #[test]
    fn test_disabled_cache_and_errors_not_stored() {
        let mut scorer = CachedScorer::new(ScoringEngine::new(&Config::default()).unwrap()).with_cache(false);
        scorer.score(&request()).unwrap();
        assert_eq!(scorer.cache_size(), 0);

        let mut scorer = scorer.with_cache(true);
        let mut bad = request();
        bad.level = "wizard".to_string();
        assert!(scorer.score(&bad).is_err());
        assert_eq!(scorer.cache_size(), 0);
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let mut scorer = CachedScorer::new(ScoringEngine::new(&Config::default()).unwrap()).with_capacity(2);
        let months = ["2024-01", "2024-02", "2024-03"];
        let requests: Vec<ScoreRequest> = months
            .iter()
            .map(|m| {
                let mut r = request();
                r.as_of = m.parse().unwrap();
                r
            })
            .collect();

        scorer.score(&requests[0]).unwrap();
        scorer.score(&requests[1]).unwrap();
        // Touch the first so the second becomes the eviction candidate
        scorer.score(&requests[0]).unwrap();
        scorer.score(&requests[2]).unwrap();
        assert_eq!(scorer.cache_size(), 2);

        let keys: Vec<u64> = requests.iter().map(|r| request_key(r).unwrap()).collect();
        assert!(scorer.cache.contains_key(&keys[0]));
        assert!(!scorer.cache.contains_key(&keys[1]));
        assert!(scorer.cache.contains_key(&keys[2]));

        for month in 1..=12 {
            let mut r = request();
            r.as_of = YearMonth::new(2023, month).unwrap();
            scorer.score(&r).unwrap();
        }
        assert_eq!(scorer.cache_size(), 2);
    }

    #[test]
    fn test_colliding_key_is_not_a_hit() {
        let mut scorer = CachedScorer::new(ScoringEngine::new(&Config::default()).unwrap());
        let original = request();
        let fresh = scorer.score(&original).unwrap();

        // Plant another request's report under this key, as a digest collision would
        let mut other = request();
        other.role = "software_engineer".to_string();
        let other_report = scorer.engine().score(&other).unwrap();
        let key = request_key(&original).unwrap();
        scorer.cache.insert(
            key,
            CacheEntry {
                request: other,
                report: other_report.clone(),
                last_used: 0,
            },
        );

        let again = scorer.score(&original).unwrap();
        assert_eq!(again, fresh);
        assert_ne!(again.role, other_report.role);
        assert_eq!(scorer.cache_size(), 1);
    }

    #[test]
    fn test_key_covers_every_input() {
        let base = request_key(&request()).unwrap();
        assert_eq!(base, request_key(&request()).unwrap());

        let mut other = request();
        other.as_of = "2024-07".parse().unwrap();
        assert_ne!(base, request_key(&other).unwrap());

        let mut other = request();
        other.role = "software_engineer".to_string();
        assert_ne!(base, request_key(&other).unwrap());
    }
}
