mod common;

use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use storefront_api::{
    errors::ServiceError,
    services::carts::{AddItemInput, CreateCartInput},
    services::catalog::{CreateBrandInput, CreateCategoryInput, CreateProductInput},
};
use uuid::Uuid;

/// Creates a product priced at `price` (with an optional sale price) and
/// returns its id.
async fn seed_product(
    app: &TestApp,
    sku: &str,
    price: Decimal,
    sale_price: Option<Decimal>,
) -> Uuid {
    let catalog = app.state.services.catalog.clone();

    let category = catalog
        .create_category(CreateCategoryInput {
            name: format!("Category {}", sku),
            slug: None,
            description: None,
            is_active: None,
        })
        .await
        .expect("category should be created");

    let brand = catalog
        .create_brand(CreateBrandInput {
            name: format!("Brand {}", sku),
            slug: None,
            description: None,
            is_active: None,
        })
        .await
        .expect("brand should be created");

    catalog
        .create_product(CreateProductInput {
            name: format!("Product {}", sku),
            slug: None,
            sku: sku.to_string(),
            description: "Test product".to_string(),
            category_id: category.id,
            brand_id: brand.id,
            price,
            sale_price,
            stock_quantity: Some(10),
            weight_kg: None,
            is_active: None,
            is_featured: None,
        })
        .await
        .expect("product should be created")
        .id
}

fn anonymous_cart(session_key: &str) -> CreateCartInput {
    CreateCartInput {
        user_id: None,
        session_key: Some(session_key.to_string()),
    }
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn create_and_fetch_cart_by_session() {
    let app = TestApp::new().await;
    let carts = app.state.services.carts.clone();

    let cart = carts
        .create_cart(anonymous_cart("sess_abc"))
        .await
        .expect("cart should be created");

    assert_eq!(cart.session_key.as_deref(), Some("sess_abc"));
    assert!(cart.user_id.is_none());

    let fetched = carts
        .get_cart_by_session("sess_abc")
        .await
        .expect("cart should be found by session");
    assert_eq!(fetched.cart.id, cart.id);
    assert!(fetched.items.is_empty());
    assert_eq!(fetched.totals.subtotal, Decimal::ZERO);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn adding_the_same_product_twice_merges_quantities() {
    let app = TestApp::new().await;
    let carts = app.state.services.carts.clone();

    let product_id = seed_product(&app, "MERGE-1", dec!(19.99), None).await;
    let cart = carts
        .create_cart(anonymous_cart("sess_merge"))
        .await
        .expect("cart");

    carts
        .add_item(
            cart.id,
            AddItemInput {
                product_id,
                quantity: 2,
            },
        )
        .await
        .expect("first add");

    let view = carts
        .add_item(
            cart.id,
            AddItemInput {
                product_id,
                quantity: 3,
            },
        )
        .await
        .expect("second add");

    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].item.quantity, 5);
    assert_eq!(view.totals.total_items, 5);
    assert_eq!(view.totals.subtotal, dec!(99.95));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn totals_use_the_sale_price_when_present() {
    let app = TestApp::new().await;
    let carts = app.state.services.carts.clone();

    let product_id = seed_product(&app, "SALE-1", dec!(100.00), Some(dec!(80.00))).await;
    let cart = carts
        .create_cart(anonymous_cart("sess_sale"))
        .await
        .expect("cart");

    let view = carts
        .add_item(
            cart.id,
            AddItemInput {
                product_id,
                quantity: 2,
            },
        )
        .await
        .expect("add");

    assert_eq!(view.items[0].unit_price, dec!(80.00));
    assert_eq!(view.items[0].line_total, dec!(160.00));
    assert_eq!(view.totals.subtotal, dec!(160.00));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn zero_quantity_update_removes_the_line() {
    let app = TestApp::new().await;
    let carts = app.state.services.carts.clone();

    let product_id = seed_product(&app, "ZERO-1", dec!(10.00), None).await;
    let cart = carts
        .create_cart(anonymous_cart("sess_zero"))
        .await
        .expect("cart");

    carts
        .add_item(
            cart.id,
            AddItemInput {
                product_id,
                quantity: 1,
            },
        )
        .await
        .expect("add");

    let view = carts
        .update_item_quantity(cart.id, product_id, 0)
        .await
        .expect("update to zero");

    assert!(view.items.is_empty());
    assert_eq!(view.totals.total_items, 0);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn update_quantity_replaces_rather_than_adds() {
    let app = TestApp::new().await;
    let carts = app.state.services.carts.clone();

    let product_id = seed_product(&app, "SET-1", dec!(10.00), None).await;
    let cart = carts
        .create_cart(anonymous_cart("sess_set"))
        .await
        .expect("cart");

    carts
        .add_item(
            cart.id,
            AddItemInput {
                product_id,
                quantity: 5,
            },
        )
        .await
        .expect("add");

    let view = carts
        .update_item_quantity(cart.id, product_id, 2)
        .await
        .expect("update");

    assert_eq!(view.items[0].item.quantity, 2);
    assert_eq!(view.totals.subtotal, dec!(20.00));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn removing_a_product_not_in_the_cart_is_not_found() {
    let app = TestApp::new().await;
    let carts = app.state.services.carts.clone();

    let cart = carts
        .create_cart(anonymous_cart("sess_missing"))
        .await
        .expect("cart");

    let err = carts.remove_item(cart.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn adding_below_one_is_invalid() {
    let app = TestApp::new().await;
    let carts = app.state.services.carts.clone();

    let product_id = seed_product(&app, "MIN-1", dec!(10.00), None).await;
    let cart = carts
        .create_cart(anonymous_cart("sess_min"))
        .await
        .expect("cart");

    let err = carts
        .add_item(
            cart.id,
            AddItemInput {
                product_id,
                quantity: 0,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn clear_cart_removes_every_line() {
    let app = TestApp::new().await;
    let carts = app.state.services.carts.clone();

    let first = seed_product(&app, "CLEAR-1", dec!(10.00), None).await;
    let second = seed_product(&app, "CLEAR-2", dec!(15.00), None).await;
    let cart = carts
        .create_cart(anonymous_cart("sess_clear"))
        .await
        .expect("cart");

    for product_id in [first, second] {
        carts
            .add_item(
                cart.id,
                AddItemInput {
                    product_id,
                    quantity: 1,
                },
            )
            .await
            .expect("add");
    }

    carts.clear_cart(cart.id).await.expect("clear");

    let view = carts.get_cart(cart.id).await.expect("cart still exists");
    assert!(view.items.is_empty());
    assert_eq!(view.totals.subtotal, Decimal::ZERO);
}
