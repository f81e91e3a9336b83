use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Discount coupon entity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub description: String,
    pub discount_type: DiscountType,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub discount_value: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub minimum_amount: Decimal,
    #[sea_orm(nullable)]
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub is_active: bool,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Coupon discount type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[sea_orm(string_value = "percentage")]
    Percentage,
    #[sea_orm(string_value = "fixed")]
    Fixed,
}

/// Outcome of a coupon eligibility check. Ineligibility is reported as data
/// for caller-side display, not as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponValidity {
    pub valid: bool,
    pub reason: String,
}

impl CouponValidity {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: "valid".to_string(),
        }
    }

    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: reason.into(),
        }
    }
}

impl Model {
    /// Checks whether the coupon can be applied to an order of `order_total`
    /// at instant `now`. Checks run in a fixed order and the first failure
    /// wins: active flag, validity window, usage limit, minimum amount.
    ///
    /// A usage limit of zero means unlimited use.
    pub fn validate(&self, order_total: Decimal, now: DateTime<Utc>) -> CouponValidity {
        if !self.is_active {
            return CouponValidity::rejected("inactive");
        }

        if now < self.valid_from || now > self.valid_until {
            return CouponValidity::rejected("outside validity period");
        }

        if let Some(limit) = self.usage_limit.filter(|limit| *limit > 0) {
            if self.used_count >= limit {
                return CouponValidity::rejected("usage limit reached");
            }
        }

        if order_total < self.minimum_amount {
            return CouponValidity::rejected(format!(
                "minimum order amount of {} not met",
                self.minimum_amount
            ));
        }

        CouponValidity::ok()
    }

    /// Discount amount for an order of `order_total`. Percentage coupons take
    /// a fraction of the total; fixed coupons are capped at the total so the
    /// discount never exceeds the order value.
    pub fn discount_for(&self, order_total: Decimal) -> Decimal {
        match self.discount_type {
            DiscountType::Percentage => order_total * self.discount_value / Decimal::from(100),
            DiscountType::Fixed => self.discount_value.min(order_total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn sample_coupon(discount_type: DiscountType, value: Decimal) -> Model {
        let now = Utc::now();
        Model {
            id: Uuid::new_v4(),
            code: "WELCOME10".to_string(),
            description: "Welcome discount".to_string(),
            discount_type,
            discount_value: value,
            minimum_amount: Decimal::ZERO,
            usage_limit: None,
            used_count: 0,
            is_active: true,
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(1),
            created_at: now,
        }
    }

    #[test]
    fn inactive_coupon_is_rejected_first() {
        let mut coupon = sample_coupon(DiscountType::Percentage, dec!(10));
        coupon.is_active = false;
        // Even an otherwise-exhausted coupon reports "inactive" first.
        coupon.usage_limit = Some(1);
        coupon.used_count = 1;

        let validity = coupon.validate(dec!(500.00), Utc::now());
        assert!(!validity.valid);
        assert_eq!(validity.reason, "inactive");
    }

    #[test]
    fn coupon_outside_window_is_rejected() {
        let coupon = sample_coupon(DiscountType::Percentage, dec!(10));

        let before = coupon.valid_from - Duration::hours(1);
        let validity = coupon.validate(dec!(100.00), before);
        assert!(!validity.valid);
        assert_eq!(validity.reason, "outside validity period");

        let after = coupon.valid_until + Duration::hours(1);
        let validity = coupon.validate(dec!(100.00), after);
        assert!(!validity.valid);
        assert_eq!(validity.reason, "outside validity period");
    }

    #[test]
    fn exhausted_coupon_is_rejected() {
        let mut coupon = sample_coupon(DiscountType::Fixed, dec!(5.00));
        coupon.usage_limit = Some(3);
        coupon.used_count = 3;

        let validity = coupon.validate(dec!(100.00), Utc::now());
        assert!(!validity.valid);
        assert_eq!(validity.reason, "usage limit reached");
    }

    #[test]
    fn zero_usage_limit_means_unlimited() {
        let mut coupon = sample_coupon(DiscountType::Fixed, dec!(5.00));
        coupon.usage_limit = Some(0);
        coupon.used_count = 1_000;

        assert!(coupon.validate(dec!(100.00), Utc::now()).valid);
    }

    #[test]
    fn minimum_amount_is_enforced() {
        let mut coupon = sample_coupon(DiscountType::Percentage, dec!(10));
        coupon.minimum_amount = dec!(50.00);

        let validity = coupon.validate(dec!(49.99), Utc::now());
        assert!(!validity.valid);
        assert_eq!(validity.reason, "minimum order amount of 50.00 not met");

        assert!(coupon.validate(dec!(50.00), Utc::now()).valid);
    }

    #[test]
    fn percentage_discount() {
        let coupon = sample_coupon(DiscountType::Percentage, dec!(10));
        assert_eq!(coupon.discount_for(dec!(200.00)), dec!(20.00));
    }

    #[test]
    fn fixed_discount_is_capped_at_order_total() {
        let coupon = sample_coupon(DiscountType::Fixed, dec!(50.00));
        assert_eq!(coupon.discount_for(dec!(30.00)), dec!(30.00));
        assert_eq!(coupon.discount_for(dec!(80.00)), dec!(50.00));
    }
}
