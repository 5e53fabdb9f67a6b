use crate::images::ingest::MSG_IMAGE_REQUIRED;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::QueryRejection;
use axum::extract::{FromRequest, FromRequestParts, Multipart, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("pool error: {0}")]
    Pool(#[from] deadpool_sqlite::InteractError),

    #[error("database unavailable: {0}")]
    Unavailable(#[from] deadpool_sqlite::PoolError),

    #[error("blob storage error: {0}")]
    Blob(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database error".to_string(),
                )
            }
            AppError::Pool(e) => {
                tracing::error!(error = %e, "pool error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database error".to_string(),
                )
            }
            AppError::Unavailable(e) => {
                tracing::error!(error = %e, "database unavailable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database unavailable".to_string(),
                )
            }
            AppError::Blob(e) => {
                tracing::error!(error = %e, "blob storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to store image".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Query-string extractor that logs rejections and reports them as JSON 400s.
/// Drop-in replacement for `axum::extract::Query<T>`.
pub struct LoggedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for LoggedQuery<T>
where
    axum::extract::Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(LoggedQuery(value)),
            Err(rejection) => {
                tracing::warn!(
                    path = %parts.uri.path(),
                    error = %rejection,
                    "query string rejected"
                );
                Err(AppError::Validation(rejection.body_text()))
            }
        }
    }
}

impl AppError {
    /// Classify a multipart read failure. Bodies over the route limit are 413,
    /// everything else is a malformed request.
    pub fn from_multipart(context: &str, err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(format!("{context}: {}", err.body_text()))
        } else {
            AppError::Validation(format!("{context}: {}", err.body_text()))
        }
    }
}

/// Multipart extractor that reports a missing or malformed multipart body as
/// the upload's JSON 400 instead of axum's plain-text rejection.
pub struct LoggedMultipart(pub Multipart);

impl<S> FromRequest<S> for LoggedMultipart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let path = req.uri().path().to_string();
        match Multipart::from_request(req, state).await {
            Ok(multipart) => Ok(LoggedMultipart(multipart)),
            Err(rejection) => {
                tracing::warn!(
                    path = %path,
                    error = %rejection,
                    "multipart body rejected"
                );
                Err(AppError::Validation(MSG_IMAGE_REQUIRED.to_string()))
            }
        }
    }
}
