use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    errors::ApiError,
    services::carts::{AddItemInput, CreateCartInput},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for cart endpoints
pub fn carts_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_cart))
        .route("/:id", get(get_cart))
        .route("/by-session/:key", get(get_cart_by_session))
        .route("/:id/items", post(add_to_cart))
        .route("/:id/items/:product_id", put(update_cart_item))
        .route("/:id/items/:product_id", delete(remove_cart_item))
        .route("/:id/clear", post(clear_cart))
}

/// Create a new cart
async fn create_cart(
    State(state): State<AppState>,
    Json(payload): Json<CreateCartRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let input = CreateCartInput {
        user_id: payload.user_id,
        session_key: payload.session_key,
    };

    let cart = state
        .services
        .carts
        .create_cart(input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(cart))
}

/// Get cart with items and computed totals
async fn get_cart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart = state
        .services
        .carts
        .get_cart(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart))
}

/// Get the cart attached to an anonymous session key
async fn get_cart_by_session(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart = state
        .services
        .carts
        .get_cart_by_session(&key)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart))
}

/// Add a product to the cart
async fn add_to_cart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = AddItemInput {
        product_id: payload.product_id,
        quantity: payload.quantity,
    };

    let cart = state
        .services
        .carts
        .add_item(id, input)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart))
}

/// Set the quantity of a product already in the cart
async fn update_cart_item(
    State(state): State<AppState>,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let cart = state
        .services
        .carts
        .update_item_quantity(id, product_id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart))
}

/// Remove a product from the cart
async fn remove_cart_item(
    State(state): State<AppState>,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .carts
        .remove_item(id, product_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Remove every item from the cart
async fn clear_cart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .carts
        .clear_cart(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": "Cart cleared successfully"
    })))
}

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct CreateCartRequest {
    pub user_id: Option<Uuid>,
    pub session_key: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 0))]
    pub quantity: i32,
}
