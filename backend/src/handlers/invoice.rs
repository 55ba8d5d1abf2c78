//! HTTP handlers for proforma invoices

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
    services::invoice::{InvoiceService, ListInvoicesQuery},
    AppState,
};
use shared::models::{CreateInvoiceInput, UpdateInvoiceInput};

/// Create a proforma invoice, optionally applying credits
pub async fn create_invoice(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Json(input): Json<CreateInvoiceInput>,
) -> AppResult<impl IntoResponse> {
    let service = InvoiceService::new(state.db);
    let invoice = service
        .create_invoice(user.0.supplier_id, &user.0.email, input)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// List proforma invoices, filterable by status, payment status and search
pub async fn list_invoices(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Query(query): Query<ListInvoicesQuery>,
) -> AppResult<impl IntoResponse> {
    let service = InvoiceService::new(state.db);
    let invoices = service.list_invoices(user.0.supplier_id, query).await?;
    Ok(Json(serde_json::json!({ "invoices": invoices })))
}

/// Get a proforma invoice with items and applied credits
pub async fn get_invoice(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = InvoiceService::new(state.db);
    let invoice = service.get_invoice(user.0.supplier_id, invoice_id).await?;
    Ok(Json(invoice))
}

/// Partially update a proforma invoice
pub async fn update_invoice(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Path(invoice_id): Path<Uuid>,
    Json(input): Json<UpdateInvoiceInput>,
) -> AppResult<impl IntoResponse> {
    let service = InvoiceService::new(state.db);
    let invoice = service
        .update_invoice(user.0.supplier_id, invoice_id, &user.0.email, input)
        .await?;
    Ok(Json(invoice))
}

/// Transition a proforma invoice to sent
pub async fn send_invoice(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = InvoiceService::new(state.db);
    let invoice = service
        .send_invoice(user.0.supplier_id, invoice_id, &user.0.email)
        .await?;
    Ok(Json(invoice))
}

/// Delete a proforma invoice, reversing any applied credits
pub async fn delete_invoice(
    State(state): State<AppState>,
    user: CurrentSupplier,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = InvoiceService::new(state.db);
    service
        .delete_invoice(user.0.supplier_id, invoice_id, &user.0.email)
        .await?;
    Ok(Json(serde_json::json!({ "message": "Proforma invoice deleted" })))
}
