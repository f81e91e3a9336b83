use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse,
};
use crate::{
    errors::ApiError,
    services::catalog::{
        AddImageInput, CreateBrandInput, CreateCategoryInput, CreateProductInput,
        ProductListQuery, UpdateBrandInput, UpdateCategoryInput, UpdateProductInput,
    },
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for product endpoints.
///
/// The trailing `:id` segment accepts either a product UUID or a slug on
/// reads; writes address products by UUID only.
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/", post(create_product))
        .route("/search", get(search_products))
        .route("/category/:slug", get(products_by_category))
        .route("/brand/:slug", get(products_by_brand))
        .route("/:id", get(product_detail))
        .route("/:id", put(update_product))
        .route("/:id", delete(delete_product))
        .route("/:id/images", post(add_image))
        .route("/:id/images", get(list_images))
        .route("/:id/images/:image_id/main", put(set_main_image))
        .route("/:id/images/:image_id", delete(delete_image))
}

/// Creates the router for category endpoints
pub fn categories_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories))
        .route("/", post(create_category))
        .route("/:id", put(update_category))
        .route("/:id", delete(delete_category))
}

/// Creates the router for brand endpoints
pub fn brands_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_brands))
        .route("/", post(create_brand))
        .route("/:id", put(update_brand))
        .route("/:id", delete(delete_brand))
}

// ---- Products ----

/// List products with optional filters
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let page = state
        .services
        .catalog
        .list_products(query)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        page.products,
        page.page,
        page.per_page,
        page.total,
    )))
}

/// Search products by a free-text term
async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let list_query = ProductListQuery {
        search: Some(query.q),
        active: Some(true),
        page: query.page,
        per_page: query.per_page,
        ..Default::default()
    };

    let page = state
        .services
        .catalog
        .list_products(list_query)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        page.products,
        page.page,
        page.per_page,
        page.total,
    )))
}

/// List active products in a category, looked up by slug
async fn products_by_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(pagination): Query<PageQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let list_query = ProductListQuery {
        category_slug: Some(slug),
        active: Some(true),
        page: pagination.page,
        per_page: pagination.per_page,
        ..Default::default()
    };

    let page = state
        .services
        .catalog
        .list_products(list_query)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        page.products,
        page.page,
        page.per_page,
        page.total,
    )))
}

/// List active products of a brand, looked up by slug
async fn products_by_brand(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(pagination): Query<PageQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let list_query = ProductListQuery {
        brand_slug: Some(slug),
        active: Some(true),
        page: pagination.page,
        per_page: pagination.per_page,
        ..Default::default()
    };

    let page = state
        .services
        .catalog
        .list_products(list_query)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        page.products,
        page.page,
        page.per_page,
        page.total,
    )))
}

/// Product detail with images; storefront pages link by slug, admin tooling
/// by UUID, so both keys resolve here.
async fn product_detail(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let detail = match Uuid::parse_str(&key) {
        Ok(id) => state
            .services
            .catalog
            .get_product_detail(id)
            .await
            .map_err(map_service_error)?,
        Err(_) => state
            .services
            .catalog
            .get_product_by_slug(&key)
            .await
            .map_err(map_service_error)?,
    };

    Ok(success_response(detail))
}

/// Create a product
async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let product = state
        .services
        .catalog
        .create_product(payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(product))
}

/// Update a product
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let product = state
        .services
        .catalog
        .update_product(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

/// Delete a product
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .catalog
        .delete_product(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

// ---- Product images ----

/// Add an image to a product's gallery
async fn add_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddImageRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = AddImageInput {
        url: payload.url,
        alt_text: payload.alt_text,
        is_main: payload.is_main,
        sort_order: payload.sort_order,
    };

    let image = state
        .services
        .catalog
        .add_image(id, input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(image))
}

/// List a product's gallery
async fn list_images(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let images = state
        .services
        .catalog
        .list_images(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(images))
}

/// Promote an image to be the product's main image
async fn set_main_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let image = state
        .services
        .catalog
        .set_main_image(id, image_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(image))
}

/// Delete an image from a product's gallery
async fn delete_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .catalog
        .delete_image(id, image_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

// ---- Categories ----

/// List categories
async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let categories = state
        .services
        .catalog
        .list_categories()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(categories))
}

/// Create a category
async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let category = state
        .services
        .catalog
        .create_category(payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(category))
}

/// Update a category
async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let category = state
        .services
        .catalog
        .update_category(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(category))
}

/// Delete a category
async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .catalog
        .delete_category(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

// ---- Brands ----

/// List brands
async fn list_brands(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let brands = state
        .services
        .catalog
        .list_brands()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(brands))
}

/// Create a brand
async fn create_brand(
    State(state): State<AppState>,
    Json(payload): Json<CreateBrandInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let brand = state
        .services
        .catalog
        .create_brand(payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(brand))
}

/// Update a brand
async fn update_brand(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBrandInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let brand = state
        .services
        .catalog
        .update_brand(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(brand))
}

/// Delete a brand
async fn delete_brand(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .catalog
        .delete_brand(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddImageRequest {
    #[validate(url)]
    pub url: String,
    pub alt_text: Option<String>,
    #[serde(default)]
    pub is_main: bool,
    pub sort_order: Option<i32>,
}
