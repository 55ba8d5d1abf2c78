//! API route definitions

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::{activity, credit, invoice, order};
use crate::middleware::auth_middleware;
use crate::AppState;

/// All /api/v1/supplier routes, JWT-protected
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/po", order_routes())
        .nest("/pi", invoice_routes())
        .nest("/credits", credit_routes())
        .nest("/activity", activity_routes())
        .route_layer(middleware::from_fn(auth_middleware))
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(order::list_orders).post(order::create_order))
        .route(
            "/:order_id",
            get(order::get_order)
                .patch(order::update_order)
                .delete(order::delete_order),
        )
        .route("/:order_id/confirm", post(order::confirm_order))
}

fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(invoice::list_invoices).post(invoice::create_invoice))
        .route(
            "/:invoice_id",
            get(invoice::get_invoice)
                .patch(invoice::update_invoice)
                .delete(invoice::delete_invoice),
        )
        .route("/:invoice_id/send", post(invoice::send_invoice))
}

fn credit_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(credit::list_credits).post(credit::create_credit))
        .route("/buyer/:buyer_name", get(credit::list_credits_for_buyer))
        .route(
            "/:credit_id",
            get(credit::get_credit)
                .patch(credit::update_credit)
                .delete(credit::delete_credit),
        )
}

fn activity_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(activity::list_activity))
        .route("/recent", get(activity::recent_activity))
}
