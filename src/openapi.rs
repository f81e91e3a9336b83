use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::errors::ErrorResponse;

/// OpenAPI document for the storefront API. Handler-level annotations are
/// intentionally sparse for now; the error envelope is the contract every
/// endpoint shares.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "storefront-api",
        description = "E-commerce storefront backend: accounts, catalog, carts, and coupons",
        license(name = "MIT")
    ),
    components(schemas(ErrorResponse)),
    tags(
        (name = "accounts", description = "Registration, login, profile, addresses"),
        (name = "products", description = "Catalog browsing and administration"),
        (name = "carts", description = "Shopping cart operations"),
        (name = "coupons", description = "Discount coupon operations"),
        (name = "orders", description = "Order stubs")
    )
)]
pub struct ApiDoc;

/// Swagger UI router mounted at `/docs`
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
