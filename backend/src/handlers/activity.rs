//! HTTP handlers for the activity feed

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    middleware::CurrentSupplier,
    services::activity_log::{ActivityLogService, ActivityQuery},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

/// Paginated activity feed, filterable by category
pub async fn list_activity(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Query(query): Query<ActivityQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ActivityLogService::new(state.db);
    let page = service.list(user.0.supplier_id, query).await?;
    Ok(Json(page))
}

/// Most recent activity entries
pub async fn recent_activity(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Query(query): Query<RecentQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ActivityLogService::new(state.db);
    let logs = service
        .recent(user.0.supplier_id, query.limit.unwrap_or(10))
        .await?;
    Ok(Json(serde_json::json!({ "logs": logs })))
}
