use crate::{
    entities::{coupon, Coupon, CouponModel, CouponValidity, DiscountType},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Coupon service: creation, eligibility checks, discount quoting, and
/// redemption. Eligibility follows the fixed check order documented on
/// [`coupon::Model::validate`]; an ineligible coupon is a quote with
/// `valid = false`, not an error.
#[derive(Clone)]
pub struct CouponService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CouponService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a coupon. Codes are stored uppercase and must be unique.
    #[instrument(skip(self, input))]
    pub async fn create_coupon(
        &self,
        input: CreateCouponInput,
    ) -> Result<CouponModel, ServiceError> {
        if input.valid_until < input.valid_from {
            return Err(ServiceError::InvalidInput(
                "valid_until must not precede valid_from".to_string(),
            ));
        }
        if input.discount_value <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "discount_value must be positive".to_string(),
            ));
        }

        let code = input.code.trim().to_uppercase();
        self.ensure_unique_code(&code).await?;

        let coupon = coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            description: Set(input.description),
            discount_type: Set(input.discount_type),
            discount_value: Set(input.discount_value),
            minimum_amount: Set(input.minimum_amount.unwrap_or(Decimal::ZERO)),
            usage_limit: Set(input.usage_limit),
            used_count: Set(0),
            is_active: Set(input.is_active.unwrap_or(true)),
            valid_from: Set(input.valid_from),
            valid_until: Set(input.valid_until),
            created_at: Set(Utc::now()),
        };

        let coupon = coupon.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CouponCreated(coupon.id))
            .await;

        info!("Created coupon: {}", coupon.code);
        Ok(coupon)
    }

    /// Fetches a coupon by its code (case-insensitive).
    pub async fn get_coupon(&self, code: &str) -> Result<CouponModel, ServiceError> {
        let code = code.trim().to_uppercase();
        Coupon::find()
            .filter(coupon::Column::Code.eq(&code))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {} not found", code)))
    }

    /// Quotes a coupon against an order total: eligibility plus the discount
    /// it would grant. The discount is zero when the coupon is ineligible.
    #[instrument(skip(self))]
    pub async fn quote(&self, code: &str, order_total: Decimal) -> Result<CouponQuote, ServiceError> {
        let coupon = self.get_coupon(code).await?;
        Ok(quote_coupon(&coupon, order_total, Utc::now()))
    }

    /// Redeems a coupon for an order total: re-validates, then increments the
    /// usage counter in the same transaction. Returns the granted discount.
    #[instrument(skip(self))]
    pub async fn redeem(&self, code: &str, order_total: Decimal) -> Result<CouponQuote, ServiceError> {
        let txn = self.db.begin().await?;

        let code = code.trim().to_uppercase();
        let coupon = Coupon::find()
            .filter(coupon::Column::Code.eq(&code))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {} not found", code)))?;

        let quote = quote_coupon(&coupon, order_total, Utc::now());
        if !quote.validity.valid {
            return Err(ServiceError::InvalidOperation(format!(
                "Coupon {} cannot be redeemed: {}",
                code, quote.validity.reason
            )));
        }

        let coupon_id = coupon.id;
        let used_count = coupon.used_count + 1;
        let mut active: coupon::ActiveModel = coupon.into();
        active.used_count = Set(used_count);
        active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CouponRedeemed {
                coupon_id,
                discount: quote.discount_amount,
            })
            .await;

        info!(
            "Redeemed coupon {} for a discount of {}",
            code, quote.discount_amount
        );
        Ok(quote)
    }

    async fn ensure_unique_code(&self, code: &str) -> Result<(), ServiceError> {
        let existing = Coupon::find()
            .filter(coupon::Column::Code.eq(code))
            .one(&*self.db)
            .await?;

        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Coupon code '{}' already exists",
                code
            )));
        }
        Ok(())
    }
}

fn quote_coupon(coupon: &CouponModel, order_total: Decimal, now: DateTime<Utc>) -> CouponQuote {
    let validity = coupon.validate(order_total, now);
    let discount_amount = if validity.valid {
        coupon.discount_for(order_total)
    } else {
        Decimal::ZERO
    };

    CouponQuote {
        code: coupon.code.clone(),
        validity,
        discount_amount,
    }
}

/// Input for creating a coupon
#[derive(Debug, Deserialize)]
pub struct CreateCouponInput {
    pub code: String,
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub minimum_amount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub is_active: Option<bool>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

/// Eligibility and discount for a coupon against an order total
#[derive(Debug, Serialize)]
pub struct CouponQuote {
    pub code: String,
    pub validity: CouponValidity,
    pub discount_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn sample_coupon() -> CouponModel {
        let now = Utc::now();
        CouponModel {
            id: Uuid::new_v4(),
            code: "SAVE20".to_string(),
            description: "Twenty percent off".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: dec!(20),
            minimum_amount: dec!(100.00),
            usage_limit: Some(10),
            used_count: 0,
            is_active: true,
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(1),
            created_at: now,
        }
    }

    #[test]
    fn quote_for_eligible_coupon_includes_discount() {
        let quote = quote_coupon(&sample_coupon(), dec!(200.00), Utc::now());
        assert!(quote.validity.valid);
        assert_eq!(quote.discount_amount, dec!(40.00));
        assert_eq!(quote.code, "SAVE20");
    }

    #[test]
    fn quote_for_ineligible_coupon_has_zero_discount() {
        let quote = quote_coupon(&sample_coupon(), dec!(50.00), Utc::now());
        assert!(!quote.validity.valid);
        assert_eq!(quote.discount_amount, Decimal::ZERO);
    }
}
