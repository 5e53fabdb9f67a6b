use crate::error::{AppError, AppResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const USAGE_DEFAULT_PER_PAGE: i64 = 30;
pub const USAGE_MAX_PER_PAGE: i64 = 200;
pub const POPULAR_DEFAULT_PER_PAGE: i64 = 10;
pub const POPULAR_MAX_PER_PAGE: i64 = 100;

/// Raw query string accepted by every analytics endpoint.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AnalyticsQueryParams {
    pub period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Named relative windows. Anything unrecognised resolves to `Last30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "7d")]
    Last7,
    #[serde(rename = "14d")]
    Last14,
    #[serde(rename = "30d")]
    Last30,
    #[serde(rename = "90d")]
    Last90,
}

impl Period {
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim() {
            "7d" => Period::Last7,
            "14d" => Period::Last14,
            "90d" => Period::Last90,
            _ => Period::Last30,
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            Period::Last7 => 7,
            Period::Last14 => 14,
            Period::Last30 => 30,
            Period::Last90 => 90,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Last7 => "7d",
            Period::Last14 => "14d",
            Period::Last30 => "30d",
            Period::Last90 => "90d",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Window of upload dates an analytics query is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateRange {
    Between { start: NaiveDate, end: NaiveDate },
    Last { period: Period },
}

impl Default for DateRange {
    fn default() -> Self {
        DateRange::Last {
            period: Period::Last30,
        }
    }
}

/// Normalized parameters for the summary endpoint; also the cache-key input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryQuery {
    pub range: DateRange,
}

/// Normalized parameters for paginated endpoints; also the cache-key input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagedQuery {
    pub range: DateRange,
    pub page: i64,
    pub per_page: i64,
}

impl PagedQuery {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(field: &str, value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{field} must be a YYYY-MM-DD date")))
}

impl AnalyticsQueryParams {
    /// Explicit dates win over `period` when both are supplied. A lone
    /// `start_date` or `end_date` is ignored.
    pub fn date_range(&self) -> AppResult<DateRange> {
        if let (Some(start), Some(end)) = (non_empty(&self.start_date), non_empty(&self.end_date)) {
            let start = parse_date("start_date", start)?;
            let end = parse_date("end_date", end)?;
            if start > end {
                return Err(AppError::Validation(
                    "start_date must not be after end_date".to_string(),
                ));
            }
            return Ok(DateRange::Between { start, end });
        }

        let period = non_empty(&self.period)
            .map(Period::from_str_loose)
            .unwrap_or(Period::Last30);
        Ok(DateRange::Last { period })
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self, default: i64, max: i64) -> i64 {
        self.per_page.unwrap_or(default).clamp(1, max)
    }

    pub fn summary(&self) -> AppResult<SummaryQuery> {
        Ok(SummaryQuery {
            range: self.date_range()?,
        })
    }

    pub fn usage(&self) -> AppResult<PagedQuery> {
        Ok(PagedQuery {
            range: self.date_range()?,
            page: self.page(),
            per_page: self.per_page(USAGE_DEFAULT_PER_PAGE, USAGE_MAX_PER_PAGE),
        })
    }

    pub fn popular(&self) -> AppResult<PagedQuery> {
        Ok(PagedQuery {
            range: self.date_range()?,
            page: self.page(),
            per_page: self.per_page(POPULAR_DEFAULT_PER_PAGE, POPULAR_MAX_PER_PAGE),
        })
    }
}

// ── Summary ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryData {
    pub total: i64,
    pub authors: i64,
    #[serde(rename = "lastUpload")]
    pub last_upload: Option<String>,
    #[serde(rename = "uploads7d")]
    pub uploads_7d: i64,
}

// ── Usage ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub day: String,
    pub uploads: i64,
}

// ── Popular content ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularEntry {
    pub author: String,
    pub uploads: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page: i64,
    pub per_page: i64,
    pub items: Vec<T>,
}

// ── Health ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthData {
    pub db: String,
    pub uptime_seconds: u64,
    pub memory_mb: u64,
}
