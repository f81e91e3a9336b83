//! Storefront API Library
//!
//! This crate provides the core functionality for the storefront API
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod services;
pub mod slug;

use axum::{routing::get, Json, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Composes the versioned API surface
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/accounts", handlers::accounts::accounts_routes())
        .nest("/products", handlers::products::products_routes())
        .nest("/categories", handlers::products::categories_routes())
        .nest("/brands", handlers::products::brands_routes())
        .nest("/carts", handlers::carts::carts_routes())
        .nest("/coupons", handlers::coupons::coupons_routes())
        .nest("/orders", handlers::orders::orders_routes())
}

/// Health endpoint: reports process liveness and database reachability
pub async fn health_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<Value> {
    let database = match db::health_check(&state.db).await {
        Ok(()) => "ok",
        Err(_) => "unreachable",
    };

    Json(json!({
        "status": if database == "ok" { "ok" } else { "degraded" },
        "database": database,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Builds the full application router (API, health, docs)
pub fn app_router() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { "storefront-api up" }))
        .route("/health", get(health_handler))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
}

