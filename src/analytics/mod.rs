pub mod aggregator;
pub mod cache;
pub mod filter;
pub mod handler;
pub mod queries;
pub mod types;

use crate::config::AnalyticsConfig;
use crate::storage::executor::QueryExecutor;
use cache::AnalyticsCache;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared state for analytics endpoints. The cache handle is the same one
/// the upload path invalidates.
pub struct AnalyticsState {
    pub executor: QueryExecutor,
    pub cache: Arc<AnalyticsCache>,
    pub ttl: Duration,
    /// Process start, reported as `uptime_seconds` by health.
    pub started_at: Instant,
}

impl AnalyticsState {
    pub fn new(
        executor: QueryExecutor,
        cache: Arc<AnalyticsCache>,
        config: &AnalyticsConfig,
        started_at: Instant,
    ) -> Self {
        Self {
            executor,
            cache,
            ttl: Duration::from_secs(config.cache_ttl_secs),
            started_at,
        }
    }
}
