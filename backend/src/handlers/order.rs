//! HTTP handlers for purchase orders

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
    services::order::{ListOrdersQuery, OrderService},
    AppState,
};
use shared::models::{CreateOrderInput, UpdateOrderInput};

/// Create a purchase order
pub async fn create_order(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<impl IntoResponse> {
    let service = OrderService::new(state.db);
    let order = service
        .create_order(user.0.supplier_id, &user.0.email, input)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List purchase orders, filterable by status and search text
pub async fn list_orders(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Query(query): Query<ListOrdersQuery>,
) -> AppResult<impl IntoResponse> {
    let service = OrderService::new(state.db);
    let orders = service.list_orders(user.0.supplier_id, query).await?;
    Ok(Json(serde_json::json!({ "orders": orders })))
}

/// Get a purchase order with its items
pub async fn get_order(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Path(order_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = OrderService::new(state.db);
    let order = service.get_order(user.0.supplier_id, order_id).await?;
    Ok(Json(order))
}

/// Partially update a purchase order
pub async fn update_order(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateOrderInput>,
) -> AppResult<impl IntoResponse> {
    let service = OrderService::new(state.db);
    let order = service
        .update_order(user.0.supplier_id, order_id, &user.0.email, input)
        .await?;
    Ok(Json(order))
}

/// Transition a purchase order to confirmed
pub async fn confirm_order(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Path(order_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = OrderService::new(state.db);
    let order = service
        .confirm_order(user.0.supplier_id, order_id, &user.0.email)
        .await?;
    Ok(Json(order))
}

/// Delete a purchase order
pub async fn delete_order(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Path(order_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = OrderService::new(state.db);
    service
        .delete_order(user.0.supplier_id, order_id, &user.0.email)
        .await?;
    Ok(Json(serde_json::json!({ "message": "Purchase order deleted" })))
}
