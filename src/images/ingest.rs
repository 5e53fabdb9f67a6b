use crate::error::{AppError, AppResult};
use crate::images::ImageState;
use crate::types::ImageRecord;
use axum::body::Bytes;
use rusqlite::params;
use std::path::Path;

pub const MSG_IMAGE_REQUIRED: &str = "image required";

const INSERT_SQL: &str =
    "INSERT INTO data (name, description, author, path) VALUES (?1, ?2, ?3, ?4)";

/// File part of an upload as received from the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct NewImage {
    pub file: Option<UploadedFile>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
}

/// `.ext` of the client's file name, or empty if it has none. Extensions with
/// anything but ASCII alphanumerics are dropped.
fn extension_of(original_name: Option<&str>) -> String {
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

pub fn generate_file_name(original_name: Option<&str>) -> String {
    format!("{}{}", uuid::Uuid::new_v4(), extension_of(original_name))
}

impl ImageState {
    /// Store the blob, record its metadata, then drop every cached analytics
    /// response. Returns the generated file name.
    ///
    /// The blob is not removed if the insert fails.
    pub async fn save_image(&self, input: NewImage) -> AppResult<String> {
        let file = input
            .file
            .ok_or_else(|| AppError::Validation(MSG_IMAGE_REQUIRED.to_string()))?;

        let file_name = generate_file_name(file.original_name.as_deref());
        self.blobs.put(&file_name, &file.bytes).await?;

        let name = input.name.unwrap_or_default();
        let description = input.description.unwrap_or_default();
        let author = input.author.unwrap_or_default();
        let path = file_name.clone();
        let id = self
            .executor
            .query(move |conn| {
                conn.execute(INSERT_SQL, params![name, description, author, path])?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        self.cache.invalidate_all();
        tracing::info!(
            id,
            file = %file_name,
            bytes = file.bytes.len(),
            "image stored, analytics cache invalidated"
        );
        Ok(file_name)
    }

    pub async fn list_images(&self) -> AppResult<Vec<ImageRecord>> {
        self.executor
            .query(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, description, author, path, date FROM data ORDER BY id",
                )?;
                let rows = stmt.query_map([], ImageRecord::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
    }
}
