use crate::handlers::common::success_response;
use crate::AppState;
use axum::{
    extract::Path,
    routing::{get, post},
    Router,
};
use serde_json::json;
use uuid::Uuid;

/// Creates the router for order endpoints.
///
/// Orders have no model yet; every handler returns a placeholder so clients
/// can wire navigation before checkout ships.
pub fn orders_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/checkout", post(checkout))
        .route("/:id", get(order_detail))
}

async fn list_orders() -> impl axum::response::IntoResponse {
    success_response(json!({ "message": "Order listing is under development" }))
}

async fn checkout() -> impl axum::response::IntoResponse {
    success_response(json!({ "message": "Checkout is under development" }))
}

async fn order_detail(Path(id): Path<Uuid>) -> impl axum::response::IntoResponse {
    success_response(json!({
        "message": format!("Order {} detail is under development", id)
    }))
}
