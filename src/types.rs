use serde::{Deserialize, Serialize};

/// A stored upload, one row of the `data` table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub author: String,
    pub path: String,
    pub date: String,
}

impl ImageRecord {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            author: row.get("author")?,
            path: row.get("path")?,
            date: row.get("date")?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Metadata {
    pub generated_in_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
}

/// Uniform `{timestamp, period?, data, metadata}` response body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Envelope<T> {
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    pub data: T,
    pub metadata: Metadata,
}

impl<T> Envelope<T> {
    pub fn new(data: T, started: std::time::Instant) -> Self {
        Self {
            timestamp: now_iso(),
            period: None,
            data,
            metadata: Metadata {
                generated_in_ms: started.elapsed().as_millis() as u64,
                cached: None,
            },
        }
    }

    pub fn with_period(mut self, label: impl Into<String>) -> Self {
        self.period = Some(label.into());
        self
    }

    pub fn with_cached(mut self, cached: bool) -> Self {
        self.metadata.cached = Some(cached);
        self
    }
}

pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[derive(Debug, Serialize)]
pub struct ImageList {
    pub items: Vec<ImageRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct UploadResult {
    #[serde(rename = "fileName")]
    pub file_name: String,
}
