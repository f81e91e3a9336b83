use crate::handlers::common::{created_response, map_service_error, success_response};
use crate::{errors::ApiError, services::coupons::CreateCouponInput, AppState};
use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Creates the router for coupon endpoints
pub fn coupons_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_coupon))
        .route("/validate", post(validate_coupon))
        .route("/:code", get(get_coupon))
        .route("/:code/redeem", post(redeem_coupon))
}

/// Create a coupon
async fn create_coupon(
    State(state): State<AppState>,
    Json(payload): Json<CreateCouponInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let coupon = state
        .services
        .coupons
        .create_coupon(payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(coupon))
}

/// Get a coupon by code
async fn get_coupon(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let coupon = state
        .services
        .coupons
        .get_coupon(&code)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(coupon))
}

/// Check a coupon against an order total. Ineligibility is reported in the
/// body (`validity.valid = false`), not as an HTTP error.
async fn validate_coupon(
    State(state): State<AppState>,
    Json(payload): Json<ValidateCouponRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let quote = state
        .services
        .coupons
        .quote(&payload.code, payload.order_total)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(quote))
}

/// Redeem a coupon for an order total, consuming one use
async fn redeem_coupon(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(payload): Json<RedeemCouponRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let quote = state
        .services
        .coupons
        .redeem(&code, payload.order_total)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(quote))
}

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct ValidateCouponRequest {
    pub code: String,
    pub order_total: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct RedeemCouponRequest {
    pub order_total: Decimal,
}
