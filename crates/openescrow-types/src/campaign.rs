//! Discount campaign model — a time-boxed reduced-price offer bound to
//! exactly one product.
//!
//! The campaign record itself is plain data; the live stock counter is
//! owned by the inventory ledger, which enforces
//! `stock_consumed ≤ stock_limit` under concurrency. The `stock_consumed`
//! field here is a snapshot taken at read time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CampaignId, OpenescrowError, ProductId, Result};

/// A time-boxed discounted-stock campaign for one product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountCampaign {
    pub id: CampaignId,
    pub product_id: ProductId,
    pub original_price: Decimal,
    pub discounted_price: Decimal,
    /// Derived at construction: percentage off the original price,
    /// rounded to two decimal places.
    pub discount_percent: Decimal,
    /// Hard cap on discounted units.
    pub stock_limit: u32,
    /// Units consumed so far (snapshot; the ledger owns the live counter).
    pub stock_consumed: u32,
    pub active: bool,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl DiscountCampaign {
    /// Validated constructor. The discount map is typed and checked here,
    /// at the boundary — malformed campaigns never enter the core.
    pub fn new(
        product_id: ProductId,
        original_price: Decimal,
        discounted_price: Decimal,
        stock_limit: u32,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<Self> {
        if original_price <= Decimal::ZERO {
            return Err(OpenescrowError::Configuration(format!(
                "campaign original price must be positive, got {original_price}"
            )));
        }
        if discounted_price <= Decimal::ZERO || discounted_price >= original_price {
            return Err(OpenescrowError::Configuration(format!(
                "campaign discounted price must be in (0, {original_price}), got {discounted_price}"
            )));
        }
        if stock_limit == 0 {
            return Err(OpenescrowError::Configuration(
                "campaign stock limit must be > 0".into(),
            ));
        }
        if ends_at <= starts_at {
            return Err(OpenescrowError::Configuration(format!(
                "campaign window is empty: [{starts_at}, {ends_at})"
            )));
        }

        let discount_percent = ((Decimal::ONE - discounted_price / original_price)
            * Decimal::new(100, 0))
        .round_dp(2);

        Ok(Self {
            id: CampaignId::new(),
            product_id,
            original_price,
            discounted_price,
            discount_percent,
            stock_limit,
            stock_consumed: 0,
            active: true,
            starts_at,
            ends_at,
        })
    }

    /// A campaign is live only while `active` and inside `[starts_at, ends_at)`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active && now >= self.starts_at && now < self.ends_at
    }

    /// Remaining discounted units in this snapshot.
    #[must_use]
    pub fn stock_remaining(&self) -> u32 {
        self.stock_limit.saturating_sub(self.stock_consumed)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl DiscountCampaign {
    /// A live campaign around the current instant.
    pub fn dummy_live(product_id: ProductId, stock_limit: u32) -> Self {
        Self::new(
            product_id,
            Decimal::new(2000, 2), // 20.00
            Decimal::new(1500, 2), // 15.00
            stock_limit,
            Utc::now() - chrono::Duration::hours(1),
            Utc::now() + chrono::Duration::hours(1),
        )
        .expect("dummy campaign is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn derives_discount_percent() {
        let c = DiscountCampaign::dummy_live(ProductId::new(), 10);
        assert_eq!(c.discount_percent, Decimal::new(2500, 2)); // 25.00%
    }

    #[test]
    fn rejects_discount_not_below_original() {
        let err = DiscountCampaign::new(
            ProductId::new(),
            Decimal::new(1000, 2),
            Decimal::new(1000, 2),
            5,
            Utc::now(),
            Utc::now() + Duration::hours(1),
        )
        .unwrap_err();
        assert!(matches!(err, OpenescrowError::Configuration(_)));
    }

    #[test]
    fn rejects_zero_stock_limit() {
        let err = DiscountCampaign::new(
            ProductId::new(),
            Decimal::new(1000, 2),
            Decimal::new(500, 2),
            0,
            Utc::now(),
            Utc::now() + Duration::hours(1),
        )
        .unwrap_err();
        assert!(matches!(err, OpenescrowError::Configuration(_)));
    }

    #[test]
    fn rejects_empty_window() {
        let now = Utc::now();
        let err = DiscountCampaign::new(
            ProductId::new(),
            Decimal::new(1000, 2),
            Decimal::new(500, 2),
            5,
            now,
            now,
        )
        .unwrap_err();
        assert!(matches!(err, OpenescrowError::Configuration(_)));
    }

    #[test]
    fn live_window_is_half_open() {
        let c = DiscountCampaign::dummy_live(ProductId::new(), 10);
        assert!(c.is_live(c.starts_at));
        assert!(!c.is_live(c.ends_at));
        assert!(c.is_live(c.ends_at - Duration::seconds(1)));
        assert!(!c.is_live(c.starts_at - Duration::seconds(1)));
    }

    #[test]
    fn inactive_campaign_is_not_live() {
        let mut c = DiscountCampaign::dummy_live(ProductId::new(), 10);
        c.active = false;
        assert!(!c.is_live(Utc::now()));
    }

    #[test]
    fn stock_remaining_saturates() {
        let mut c = DiscountCampaign::dummy_live(ProductId::new(), 3);
        c.stock_consumed = 3;
        assert_eq!(c.stock_remaining(), 0);
        c.stock_consumed = 5; // snapshot ahead of limit must not underflow
        assert_eq!(c.stock_remaining(), 0);
    }
}
