use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    errors::ApiError,
    services::users::{
        AddressInput, LoginInput, RegisterUserInput, UpdateAddressInput, UpdateProfileInput,
    },
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    routing::{delete, get, post, put},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for account endpoints
pub fn accounts_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/:id/profile", get(get_profile))
        .route("/:id/profile", put(update_profile))
        .route("/:id/addresses", get(list_addresses))
        .route("/:id/addresses", post(create_address))
        .route("/:id/addresses/:address_id", put(update_address))
        .route("/:id/addresses/:address_id", delete(delete_address))
        .route("/:id/orders", get(order_history))
}

/// Register a new account
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = RegisterUserInput {
        email: payload.email,
        username: payload.username,
        first_name: payload.first_name,
        last_name: payload.last_name,
        phone: payload.phone,
        password: payload.password,
        birth_date: payload.birth_date,
    };

    let user = state
        .services
        .users
        .register(input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(user))
}

/// Log in with email and password
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let input = LoginInput {
        email: payload.email,
        password: payload.password,
    };

    let output = state
        .services
        .users
        .authenticate(input)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(output))
}

/// Log out. Tokens are stateless, so this is an acknowledgement for clients
/// that want a round trip when discarding credentials.
async fn logout() -> impl axum::response::IntoResponse {
    success_response(json!({ "message": "Logged out" }))
}

/// Get account profile
async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let user = state
        .services
        .users
        .get_user(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(user))
}

/// Update account profile
async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProfileInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let user = state
        .services
        .users
        .update_profile(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(user))
}

/// List the account's addresses
async fn list_addresses(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let addresses = state
        .services
        .users
        .list_addresses(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(addresses))
}

/// Create an address for the account
async fn create_address(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddressInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let address = state
        .services
        .users
        .create_address(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(address))
}

/// Update one of the account's addresses
async fn update_address(
    State(state): State<AppState>,
    Path((id, address_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateAddressInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let address = state
        .services
        .users
        .update_address(id, address_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(address))
}

/// Delete one of the account's addresses
async fn delete_address(
    State(state): State<AppState>,
    Path((id, address_id)): Path<(Uuid, Uuid)>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .users
        .delete_address(id, address_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Order history placeholder; there is no order model yet.
async fn order_history(Path(_id): Path<Uuid>) -> impl axum::response::IntoResponse {
    success_response(json!({ "message": "Order history is under development" }))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    pub phone: Option<String>,
    #[validate(length(min = 8))]
    pub password: String,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}
