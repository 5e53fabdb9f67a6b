use crate::analytics::cache::{AnalyticsCache, Cached};
use crate::analytics::filter::DateFilter;
use crate::analytics::queries;
use crate::analytics::types::*;
use crate::analytics::AnalyticsState;
use crate::error::AppResult;
use crate::types::Envelope;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use std::time::Instant;

impl AnalyticsState {
    /// GET /api/analytics/summary
    pub async fn summary(&self, qp: &AnalyticsQueryParams) -> AppResult<Envelope<SummaryData>> {
        let query = qp.summary()?;
        let key = AnalyticsCache::cache_key("summary", &query)?;
        let Cached { cached, data } = self
            .cache
            .get_or_compute(&key, self.ttl, || self.compute_summary(&query.range))
            .await?;
        Ok(data.with_cached(cached))
    }

    /// GET /api/analytics/usage
    pub async fn usage(
        &self,
        qp: &AnalyticsQueryParams,
    ) -> AppResult<Envelope<Page<UsageEntry>>> {
        let query = qp.usage()?;
        let key = AnalyticsCache::cache_key("usage", &query)?;
        let Cached { cached, data } = self
            .cache
            .get_or_compute(&key, self.ttl, || self.compute_usage(&query))
            .await?;
        Ok(data.with_cached(cached))
    }

    /// GET /api/analytics/popular-content
    pub async fn popular_content(
        &self,
        qp: &AnalyticsQueryParams,
    ) -> AppResult<Envelope<Page<PopularEntry>>> {
        let query = qp.popular()?;
        let key = AnalyticsCache::cache_key("popular", &query)?;
        let Cached { cached, data } = self
            .cache
            .get_or_compute(&key, self.ttl, || self.compute_popular(&query))
            .await?;
        Ok(data.with_cached(cached))
    }

    /// GET /api/analytics/health. Never cached.
    pub async fn health(&self) -> AppResult<Envelope<HealthData>> {
        let started = Instant::now();
        self.executor.ping().await?;

        let data = HealthData {
            db: "ok".to_string(),
            uptime_seconds: self.started_at.elapsed().as_secs_f64().round() as u64,
            memory_mb: resident_memory_mb().await.unwrap_or(0),
        };
        Ok(Envelope::new(data, started)
            .with_period("now")
            .with_cached(false))
    }

    async fn compute_summary(&self, range: &DateRange) -> AppResult<Envelope<SummaryData>> {
        let filter = DateFilter::build(range);
        let sql = queries::summary_sql(&filter.clause);
        tracing::debug!(sql = %filter.inline(&sql), "computing summary");

        let started = Instant::now();
        let values = filter.params.clone();
        let data = self
            .executor
            .query(move |conn| {
                conn.query_row(&sql, params_from_iter(values), |row| {
                    Ok(SummaryData {
                        total: row.get(0)?,
                        authors: row.get(1)?,
                        last_upload: row.get(2)?,
                        uploads_7d: row.get(3)?,
                    })
                })
            })
            .await?;

        Ok(Envelope::new(data, started).with_period(filter.label))
    }

    async fn compute_usage(&self, query: &PagedQuery) -> AppResult<Envelope<Page<UsageEntry>>> {
        let filter = DateFilter::build(&query.range);
        let sql = queries::usage_sql(&filter.clause);
        let values = paged_values(&filter, query);
        tracing::debug!(sql = %crate::storage::escape::inline_params(&sql, &values), "computing usage");

        let started = Instant::now();
        let items = self
            .executor
            .query(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params_from_iter(values), |row| {
                    Ok(UsageEntry {
                        day: row.get(0)?,
                        uploads: row.get(1)?,
                    })
                })?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await?;

        let page = Page {
            page: query.page,
            per_page: query.per_page,
            items,
        };
        Ok(Envelope::new(page, started).with_period(filter.label))
    }

    async fn compute_popular(
        &self,
        query: &PagedQuery,
    ) -> AppResult<Envelope<Page<PopularEntry>>> {
        let filter = DateFilter::build(&query.range);
        let sql = queries::popular_sql(&filter.clause);
        let values = paged_values(&filter, query);
        tracing::debug!(sql = %crate::storage::escape::inline_params(&sql, &values), "computing popular content");

        let started = Instant::now();
        let items = self
            .executor
            .query(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params_from_iter(values), |row| {
                    Ok(PopularEntry {
                        author: row.get(0)?,
                        uploads: row.get(1)?,
                    })
                })?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await?;

        let page = Page {
            page: query.page,
            per_page: query.per_page,
            items,
        };
        Ok(Envelope::new(page, started).with_period(filter.label))
    }
}

/// Filter values followed by `LIMIT` and `OFFSET`.
fn paged_values(filter: &DateFilter, query: &PagedQuery) -> Vec<Value> {
    let mut values = filter.params.clone();
    values.push(Value::Integer(query.per_page));
    values.push(Value::Integer(query.offset()));
    values
}

/// Resident set size in MiB, from `/proc/self/status`. `None` off Linux.
async fn resident_memory_mb() -> Option<u64> {
    let status = tokio::fs::read_to_string("/proc/self/status").await.ok()?;
    let kib: f64 = status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))?
        .trim()
        .trim_end_matches("kB")
        .trim()
        .parse()
        .ok()?;
    Some((kib / 1024.0).round() as u64)
}
