//! Checkout flow: quote → reserve discounted stock → create the order
//! with the frozen price.
//!
//! The reservation happens *before* order creation, so a rejected
//! reservation can never leave an order priced against stock that was
//! never actually consumed. Order creation itself cannot fail, which
//! makes the reserve-then-create pair atomic from the outside: either
//! both happen or neither does.

use chrono::Utc;
use openescrow_types::{
    AuthContext, CampaignId, FlashSalePolicy, FulfillmentKind, OpenescrowError, Order, ProductId,
    Result,
};
use rust_decimal::Decimal;

use crate::coordinator::EscrowCoordinator;

impl EscrowCoordinator {
    /// Create an order for `quantity` units of a product on behalf of
    /// the buyer in `ctx`. The effective unit price is decided here,
    /// once, and frozen into the order's amount.
    ///
    /// When a live campaign covers the product, its stock is reserved
    /// with one conditional increment. A rejected reservation follows
    /// the configured [`FlashSalePolicy`]: degrade to the base price, or
    /// fail the checkout with `StockExhausted`.
    ///
    /// # Errors
    /// - `InvalidRequest` for a zero quantity
    /// - `ProductNotFound` for an unknown product
    /// - `StockExhausted` under the `RejectOrder` policy
    pub fn checkout(
        &self,
        ctx: &AuthContext,
        product_id: ProductId,
        quantity: u32,
        fulfillment: FulfillmentKind,
    ) -> Result<Order> {
        if quantity == 0 {
            return Err(OpenescrowError::InvalidRequest {
                reason: "quantity must be at least 1".into(),
            });
        }

        let product = self.catalog.get(product_id)?;
        let quote = self
            .inventory
            .price_for(product_id, product.base_price, Utc::now());

        let (unit_price, campaign_id) = match quote.campaign_id {
            Some(campaign_id) => {
                self.reserve_or_fall_back(campaign_id, quantity, quote.unit_price, &product)?
            }
            None => (product.base_price, None),
        };

        let total = unit_price * Decimal::from(quantity);
        let order = self.store.create_order(
            ctx.acting_party,
            product.seller_id,
            product_id,
            total,
            fulfillment,
            campaign_id,
        );
        tracing::info!(
            order_id = %order.id,
            product_id = %product_id,
            total = %total,
            discounted = campaign_id.is_some(),
            "checkout complete"
        );
        Ok(order)
    }

    fn reserve_or_fall_back(
        &self,
        campaign_id: CampaignId,
        quantity: u32,
        discounted_price: Decimal,
        product: &crate::catalog::Product,
    ) -> Result<(Decimal, Option<CampaignId>)> {
        match self.inventory.reserve(campaign_id, quantity) {
            Ok(()) => Ok((discounted_price, Some(campaign_id))),
            Err(
                err @ (OpenescrowError::StockExhausted { .. }
                | OpenescrowError::CampaignNotLive(_)),
            ) => match self.config.flash_sale_policy {
                FlashSalePolicy::FallbackToBasePrice => {
                    tracing::debug!(campaign_id = %campaign_id, "reservation lost, base price");
                    Ok((product.base_price, None))
                }
                FlashSalePolicy::RejectOrder => Err(err),
            },
            Err(err) => Err(err),
        }
    }
}
