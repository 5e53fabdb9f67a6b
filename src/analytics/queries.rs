//! Aggregation statements over `data`. Each takes a date filter fragment from
//! [`DateFilter`](crate::analytics::filter::DateFilter) whose values are bound
//! ahead of any trailing `LIMIT ? OFFSET ?`.

/// Totals within the window. `uploads7d` is always the trailing 7 days.
pub fn summary_sql(filter: &str) -> String {
    format!(
        r#"
SELECT
    COUNT(*) AS total,
    COUNT(DISTINCT author) AS authors,
    MAX(date) AS last_upload,
    COALESCE(SUM(date >= datetime('now', '-7 days')), 0) AS uploads_7d
FROM data
WHERE {filter}
"#
    )
}

/// Uploads per calendar day, newest first.
/// Trailing parameters: limit, offset.
pub fn usage_sql(filter: &str) -> String {
    format!(
        r#"
SELECT
    date(date) AS day,
    COUNT(*) AS uploads
FROM data
WHERE {filter}
GROUP BY date(date)
ORDER BY day DESC
LIMIT ? OFFSET ?
"#
    )
}

/// Uploads per author, most active first.
/// Trailing parameters: limit, offset.
pub fn popular_sql(filter: &str) -> String {
    format!(
        r#"
SELECT
    author,
    COUNT(*) AS uploads
FROM data
WHERE {filter}
GROUP BY author
ORDER BY uploads DESC, author ASC
LIMIT ? OFFSET ?
"#
    )
}
