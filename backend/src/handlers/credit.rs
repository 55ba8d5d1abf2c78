//! HTTP handlers for credit notes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::CurrentSupplier,
    services::credit::{CreditService, ListCreditsQuery},
    AppState,
};
use shared::models::{CreateCreditInput, UpdateCreditInput};

/// Create a credit note
pub async fn create_credit(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Json(input): Json<CreateCreditInput>,
) -> AppResult<impl IntoResponse> {
    let service = CreditService::new(state.db);
    let credit = service
        .create_credit(user.0.supplier_id, &user.0.email, input)
        .await?;
    Ok((StatusCode::CREATED, Json(credit)))
}

/// List credit notes, filterable by status and search text
pub async fn list_credits(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Query(query): Query<ListCreditsQuery>,
) -> AppResult<impl IntoResponse> {
    let service = CreditService::new(state.db);
    let credits = service.list_credits(user.0.supplier_id, query).await?;
    Ok(Json(serde_json::json!({ "credits": credits })))
}

/// List approved credits for a buyer
pub async fn list_credits_for_buyer(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Path(buyer_name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = CreditService::new(state.db);
    let credits = service
        .list_credits_for_buyer(user.0.supplier_id, &buyer_name)
        .await?;
    Ok(Json(serde_json::json!({ "credits": credits })))
}

/// Get a credit note with its application history
pub async fn get_credit(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Path(credit_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = CreditService::new(state.db);
    let credit = service.get_credit(user.0.supplier_id, credit_id).await?;
    Ok(Json(credit))
}

/// Partially update a credit note
pub async fn update_credit(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Path(credit_id): Path<Uuid>,
    Json(input): Json<UpdateCreditInput>,
) -> AppResult<impl IntoResponse> {
    let service = CreditService::new(state.db);
    let credit = service
        .update_credit(user.0.supplier_id, credit_id, &user.0.email, input)
        .await?;
    Ok(Json(credit))
}

/// Delete a credit note
pub async fn delete_credit(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Path(credit_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = CreditService::new(state.db);
    service
        .delete_credit(user.0.supplier_id, credit_id, &user.0.email)
        .await?;
    Ok(Json(serde_json::json!({ "message": "Credit deleted" })))
}
