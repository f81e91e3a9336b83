use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog product entity.
///
/// Pricing and stock expose derived accessors (`current_price`, `is_on_sale`,
/// `discount_percentage`, `is_in_stock`) rather than stored columns.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(unique)]
    pub sku: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category_id: Uuid,
    pub brand_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub sale_price: Option<Decimal>,
    pub stock_quantity: i32,
    #[sea_orm(column_type = "Decimal(Some((5, 3)))", nullable)]
    pub weight_kg: Option<Decimal>,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::brand::Entity",
        from = "Column::BrandId",
        to = "super::brand::Column::Id"
    )]
    Brand,
    #[sea_orm(has_many = "super::product_image::Entity")]
    Images,
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::brand::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brand.def()
    }
}

impl Related<super::product_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Effective selling price: the sale price when one is set, otherwise the
    /// regular price. A zero sale price counts as unset.
    pub fn current_price(&self) -> Decimal {
        self.sale_price
            .filter(|p| !p.is_zero())
            .unwrap_or(self.price)
    }

    /// Whether the product currently sells below its regular price.
    pub fn is_on_sale(&self) -> bool {
        matches!(self.sale_price, Some(sale) if !sale.is_zero() && sale < self.price)
    }

    /// Discount relative to the regular price, truncated to whole percent.
    pub fn discount_percentage(&self) -> i32 {
        if !self.is_on_sale() || self.price.is_zero() {
            return 0;
        }
        let sale = self.current_price();
        ((self.price - sale) / self.price * Decimal::from(100))
            .trunc()
            .to_i32()
            .unwrap_or(0)
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock_quantity > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_product(price: Decimal, sale_price: Option<Decimal>, stock: i32) -> Model {
        Model {
            id: Uuid::new_v4(),
            name: "Adjustable Dumbbell".to_string(),
            slug: "adjustable-dumbbell".to_string(),
            sku: "DMB-001".to_string(),
            description: "Adjustable dumbbell, 2-24kg".to_string(),
            category_id: Uuid::new_v4(),
            brand_id: Uuid::new_v4(),
            price,
            sale_price,
            stock_quantity: stock,
            weight_kg: None,
            is_active: true,
            is_featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn current_price_prefers_sale_price() {
        let product = sample_product(dec!(100.00), Some(dec!(80.00)), 5);
        assert_eq!(product.current_price(), dec!(80.00));
        assert!(product.is_on_sale());
        assert_eq!(product.discount_percentage(), 20);
    }

    #[test]
    fn current_price_without_sale_price() {
        let product = sample_product(dec!(100.00), None, 5);
        assert_eq!(product.current_price(), dec!(100.00));
        assert!(!product.is_on_sale());
        assert_eq!(product.discount_percentage(), 0);
    }

    #[test]
    fn zero_sale_price_counts_as_unset() {
        let product = sample_product(dec!(49.90), Some(Decimal::ZERO), 5);
        assert_eq!(product.current_price(), dec!(49.90));
        assert!(!product.is_on_sale());
    }

    #[test]
    fn sale_price_above_regular_is_not_a_sale() {
        let product = sample_product(dec!(50.00), Some(dec!(60.00)), 5);
        assert!(!product.is_on_sale());
        assert_eq!(product.discount_percentage(), 0);
        // The sale price still wins as the effective price.
        assert_eq!(product.current_price(), dec!(60.00));
    }

    #[test]
    fn discount_percentage_truncates() {
        // 1/3 off -> 33.33..% -> 33
        let product = sample_product(dec!(30.00), Some(dec!(20.00)), 5);
        assert_eq!(product.discount_percentage(), 33);
    }

    #[test]
    fn stock_flag() {
        assert!(sample_product(dec!(10.00), None, 1).is_in_stock());
        assert!(!sample_product(dec!(10.00), None, 0).is_in_stock());
    }
}
