//! Resolver-level query statistics (spec section 3/6 `getStats()`),
//! distinct from the cache's own hit/miss counters in `cache::CacheStats`.
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ResolverStats {
    pub total_queries: u64,
    pub successful_queries: u64,
    pub failed_queries: u64,
    total_duration: Duration,
}

impl ResolverStats {
    pub fn record_start(&mut self) {
        self.total_queries += 1;
    }

    pub fn record_success(&mut self, duration: Duration) {
        self.successful_queries += 1;
        self.total_duration += duration;
    }

    pub fn record_failure(&mut self, duration: Duration) {
        self.failed_queries += 1;
        self.total_duration += duration;
    }

    /// `totalDuration / totalQueries` (spec section 6), or 0 when no query
    /// has even started. Note this divides by every started query, including
    /// ones still in flight, not just the ones that have completed.
    pub fn average_duration_millis(&self) -> f64 {
        if self.total_queries == 0 {
            0.0
        } else {
            self.total_duration.as_secs_f64() * 1000.0 / self.total_queries as f64
        }
    }
}
