use crate::analytics::types::*;
use crate::analytics::AnalyticsState;
use crate::error::{AppResult, LoggedQuery};
use crate::types::Envelope;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

/// GET /api/analytics/summary
pub async fn summary(
    State(state): State<Arc<AnalyticsState>>,
    LoggedQuery(qp): LoggedQuery<AnalyticsQueryParams>,
) -> AppResult<Json<Envelope<SummaryData>>> {
    Ok(Json(state.summary(&qp).await?))
}

/// GET /api/analytics/usage
pub async fn usage(
    State(state): State<Arc<AnalyticsState>>,
    LoggedQuery(qp): LoggedQuery<AnalyticsQueryParams>,
) -> AppResult<Json<Envelope<Page<UsageEntry>>>> {
    Ok(Json(state.usage(&qp).await?))
}

/// GET /api/analytics/popular-content
pub async fn popular_content(
    State(state): State<Arc<AnalyticsState>>,
    LoggedQuery(qp): LoggedQuery<AnalyticsQueryParams>,
) -> AppResult<Json<Envelope<Page<PopularEntry>>>> {
    Ok(Json(state.popular_content(&qp).await?))
}

/// GET /api/analytics/health
pub async fn health(
    State(state): State<Arc<AnalyticsState>>,
) -> AppResult<Json<Envelope<HealthData>>> {
    Ok(Json(state.health().await?))
}
