use crate::{
    entities::{cart, cart_item, Cart, CartItem, CartItemModel, CartModel, Product, ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Shopping cart service.
///
/// A cart belongs to a registered user or an anonymous session. Line items
/// are keyed by product: adding a product already in the cart merges into
/// the existing line. Totals are computed from current product prices on
/// every read and never stored.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a new cart for a user and/or anonymous session.
    #[instrument(skip(self))]
    pub async fn create_cart(&self, input: CreateCartInput) -> Result<CartModel, ServiceError> {
        let cart_id = Uuid::new_v4();
        let now = Utc::now();

        let cart = cart::ActiveModel {
            id: Set(cart_id),
            user_id: Set(input.user_id),
            session_key: Set(input.session_key),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let cart = cart.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartCreated(cart_id))
            .await;

        info!("Created cart: {}", cart_id);
        Ok(cart)
    }

    /// Retrieves a cart with its lines and computed totals.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, cart_id: Uuid) -> Result<CartWithItems, ServiceError> {
        let cart = self.get_cart_model(cart_id).await?;
        self.load_cart_contents(cart).await
    }

    /// Retrieves the cart attached to an anonymous session key.
    #[instrument(skip(self))]
    pub async fn get_cart_by_session(
        &self,
        session_key: &str,
    ) -> Result<CartWithItems, ServiceError> {
        let cart = Cart::find()
            .filter(cart::Column::SessionKey.eq(session_key))
            .order_by_desc(cart::Column::CreatedAt)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Cart for session {} not found", session_key))
            })?;

        self.load_cart_contents(cart).await
    }

    /// Retrieves a cart without loading its items.
    pub async fn get_cart_model(&self, cart_id: Uuid) -> Result<CartModel, ServiceError> {
        Cart::find_by_id(cart_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))
    }

    /// Adds a product to the cart, merging into the existing line when the
    /// product is already present.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        cart_id: Uuid,
        input: AddItemInput,
    ) -> Result<CartWithItems, ServiceError> {
        if input.quantity < 1 {
            return Err(ServiceError::InvalidInput(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let cart = Cart::find_by_id(cart_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;

        let product = Product::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        if !product.is_active {
            return Err(ServiceError::InvalidOperation(
                "Product is not available".to_string(),
            ));
        }

        let existing = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(input.product_id))
            .one(&txn)
            .await?;

        if let Some(item) = existing {
            let quantity = item.quantity + input.quantity;
            let mut active: cart_item::ActiveModel = item.into();
            active.quantity = Set(quantity);
            active.update(&txn).await?;
        } else {
            let item = cart_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart_id),
                product_id: Set(input.product_id),
                quantity: Set(input.quantity),
                added_at: Set(Utc::now()),
            };
            item.insert(&txn).await?;
        }

        touch_cart(&txn, &cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id,
                product_id: input.product_id,
            })
            .await;

        info!(
            "Added product {} x{} to cart {}",
            input.product_id, input.quantity, cart_id
        );
        self.get_cart(cart_id).await
    }

    /// Sets the quantity of a cart line. A quantity of zero (or less)
    /// removes the line.
    #[instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartWithItems, ServiceError> {
        if quantity <= 0 {
            self.remove_item(cart_id, product_id).await?;
            return self.get_cart(cart_id).await;
        }

        let txn = self.db.begin().await?;

        let cart = Cart::find_by_id(cart_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;

        let item = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} is not in the cart", product_id))
            })?;

        let mut active: cart_item::ActiveModel = item.into();
        active.quantity = Set(quantity);
        active.update(&txn).await?;

        touch_cart(&txn, &cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemUpdated {
                cart_id,
                product_id,
            })
            .await;

        self.get_cart(cart_id).await
    }

    /// Removes a product's line from the cart.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, cart_id: Uuid, product_id: Uuid) -> Result<(), ServiceError> {
        let cart = self.get_cart_model(cart_id).await?;

        let deleted = CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .exec(&*self.db)
            .await?;

        if deleted.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {} is not in the cart",
                product_id
            )));
        }

        touch_cart(&*self.db, &cart).await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved {
                cart_id,
                product_id,
            })
            .await;

        info!("Removed product {} from cart {}", product_id, cart_id);
        Ok(())
    }

    /// Removes every line from the cart.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, cart_id: Uuid) -> Result<(), ServiceError> {
        let cart = self.get_cart_model(cart_id).await?;

        CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .exec(&*self.db)
            .await?;

        touch_cart(&*self.db, &cart).await?;

        self.event_sender
            .send_or_log(Event::CartCleared(cart_id))
            .await;

        info!("Cleared cart: {}", cart_id);
        Ok(())
    }

    async fn load_cart_contents(&self, cart: CartModel) -> Result<CartWithItems, ServiceError> {
        let rows = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .find_also_related(Product)
            .order_by_asc(cart_item::Column::AddedAt)
            .all(&*self.db)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for (item, product) in rows {
            let product = product.ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Cart item {} references a missing product",
                    item.id
                ))
            })?;

            items.push(CartLine::new(item, product));
        }

        let totals = CartTotals::from_lines(&items);

        Ok(CartWithItems { cart, items, totals })
    }
}

/// Bumps the cart's updated_at so stale-cart sweeps see activity.
async fn touch_cart(
    conn: &impl sea_orm::ConnectionTrait,
    cart: &CartModel,
) -> Result<(), ServiceError> {
    let mut active: cart::ActiveModel = cart.clone().into();
    active.updated_at = Set(Utc::now());
    active.update(conn).await?;
    Ok(())
}

/// Input for creating a cart
#[derive(Debug, Deserialize)]
pub struct CreateCartInput {
    pub user_id: Option<Uuid>,
    pub session_key: Option<String>,
}

/// Input for adding a product to a cart
#[derive(Debug, Deserialize)]
pub struct AddItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// One cart line joined with its product and priced at the product's
/// current price.
#[derive(Debug, Serialize)]
pub struct CartLine {
    pub item: CartItemModel,
    pub product: ProductModel,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl CartLine {
    fn new(item: CartItemModel, product: ProductModel) -> Self {
        let unit_price = product.current_price();
        let line_total = unit_price * Decimal::from(item.quantity);
        Self {
            item,
            product,
            unit_price,
            line_total,
        }
    }
}

/// Computed cart totals
#[derive(Debug, Serialize)]
pub struct CartTotals {
    pub total_items: i32,
    pub subtotal: Decimal,
}

impl CartTotals {
    fn from_lines(lines: &[CartLine]) -> Self {
        Self {
            total_items: lines.iter().map(|line| line.item.quantity).sum(),
            subtotal: lines.iter().map(|line| line.line_total).sum(),
        }
    }
}

/// Cart with lines and totals
#[derive(Debug, Serialize)]
pub struct CartWithItems {
    pub cart: CartModel,
    pub items: Vec<CartLine>,
    pub totals: CartTotals,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(price: Decimal, sale_price: Option<Decimal>, quantity: i32) -> CartLine {
        let now = Utc::now();
        let product = ProductModel {
            id: Uuid::new_v4(),
            name: "Kettlebell 16kg".to_string(),
            slug: "kettlebell-16kg".to_string(),
            sku: format!("KB-{}", quantity),
            description: "Cast iron kettlebell".to_string(),
            category_id: Uuid::new_v4(),
            brand_id: Uuid::new_v4(),
            price,
            sale_price,
            stock_quantity: 10,
            weight_kg: None,
            is_active: true,
            is_featured: false,
            created_at: now,
            updated_at: now,
        };
        let item = CartItemModel {
            id: Uuid::new_v4(),
            cart_id: Uuid::new_v4(),
            product_id: product.id,
            quantity,
            added_at: now,
        };
        CartLine::new(item, product)
    }

    #[test]
    fn line_total_uses_current_price() {
        let regular = line(dec!(25.50), None, 3);
        assert_eq!(regular.unit_price, dec!(25.50));
        assert_eq!(regular.line_total, dec!(76.50));

        let on_sale = line(dec!(25.50), Some(dec!(20.00)), 3);
        assert_eq!(on_sale.unit_price, dec!(20.00));
        assert_eq!(on_sale.line_total, dec!(60.00));
    }

    #[test]
    fn totals_aggregate_lines() {
        let lines = vec![
            line(dec!(10.00), None, 2),
            line(dec!(5.00), Some(dec!(4.00)), 1),
        ];

        let totals = CartTotals::from_lines(&lines);
        assert_eq!(totals.total_items, 3);
        assert_eq!(totals.subtotal, dec!(24.00));
    }

    #[test]
    fn empty_cart_has_zero_totals() {
        let totals = CartTotals::from_lines(&[]);
        assert_eq!(totals.total_items, 0);
        assert_eq!(totals.subtotal, Decimal::ZERO);
    }
}
