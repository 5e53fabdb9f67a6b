use crate::error::{AppError, AppResult, LoggedMultipart};
use crate::images::ingest::{NewImage, UploadedFile};
use crate::images::ImageState;
use crate::types::{Envelope, ImageList, UploadResult};
use axum::extract::State;
use axum::response::Html;
use axum::Json;
use std::sync::Arc;
use std::time::Instant;

pub const IMAGE_FIELD: &str = "image";

/// GET / - index page.
pub async fn index() -> Html<String> {
    Html(include_str!("../index.html").replace("{{version}}", env!("CARGO_PKG_VERSION")))
}

/// GET /all - every stored image record.
pub async fn list_all(
    State(state): State<Arc<ImageState>>,
) -> AppResult<Json<Envelope<ImageList>>> {
    let started = Instant::now();
    let items = state.list_images().await?;
    let total = items.len();
    Ok(Json(Envelope::new(ImageList { items, total }, started)))
}

/// POST /new - multipart upload with an `image` file and optional
/// `name`, `description`, `author` text fields.
pub async fn upload(
    State(state): State<Arc<ImageState>>,
    LoggedMultipart(mut multipart): LoggedMultipart,
) -> AppResult<Json<Envelope<UploadResult>>> {
    let started = Instant::now();
    let mut input = NewImage::default();
    let mut fields = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::from_multipart("multipart error", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            IMAGE_FIELD if field.file_name().is_some() => {
                let original_name = field.file_name().map(|s: &str| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::from_multipart("file read error", e))?;
                input.file = Some(UploadedFile {
                    original_name,
                    bytes,
                });
            }
            "name" | "description" | "author" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::from_multipart(&format!("invalid {name} field"), e))?;
                match name.as_str() {
                    "name" => input.name = Some(text),
                    "description" => input.description = Some(text),
                    _ => input.author = Some(text),
                }
            }
            _ => {}
        }
        fields.push(name);
    }

    tracing::debug!(
        fields = ?fields,
        has_image = input.file.is_some(),
        "upload received"
    );

    let file_name = state.save_image(input).await?;
    Ok(Json(Envelope::new(UploadResult { file_name }, started)))
}
