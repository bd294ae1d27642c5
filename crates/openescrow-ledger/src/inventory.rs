//! Inventory ledger — campaign stock under contention.
//!
//! A live campaign may sell at most `stock_limit` units no matter how
//! many buyers reserve concurrently. The consumed counter is an atomic;
//! [`InventoryLedger::reserve`] is one conditional increment — *add N
//! where consumed + N ≤ limit* — implemented with `fetch_update`, never
//! read-then-compare-then-write.
//!
//! Pricing is computed once at order-creation time and frozen into the
//! order's amount; later campaign changes never retroactively affect
//! already-created orders.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use openescrow_types::{
    CampaignId, DiscountCampaign, OpenescrowError, ProductId, Result,
};
use rust_decimal::Decimal;

/// The price decision for one checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub unit_price: Decimal,
    /// Set when a live campaign with remaining stock covers the product;
    /// the caller must `reserve` against it before creating the order.
    pub campaign_id: Option<CampaignId>,
}

/// A registered campaign: immutable descriptor plus live counters.
#[derive(Debug)]
struct CampaignEntry {
    campaign: DiscountCampaign,
    consumed: AtomicU32,
    active: AtomicBool,
}

impl CampaignEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active.load(Ordering::SeqCst)
            && now >= self.campaign.starts_at
            && now < self.campaign.ends_at
    }
}

#[derive(Debug, Default)]
struct Registry {
    by_id: HashMap<CampaignId, Arc<CampaignEntry>>,
    by_product: HashMap<ProductId, CampaignId>,
}

/// Tracks discounted stock per campaign and quotes the effective price.
#[derive(Debug, Default)]
pub struct InventoryLedger {
    registry: Mutex<Registry>,
}

impl InventoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().expect("inventory registry lock poisoned")
    }

    /// Register a campaign. At most one campaign per product may be
    /// registered at a time.
    ///
    /// # Errors
    /// `Configuration` if the product already has a registered campaign.
    pub fn register(&self, campaign: DiscountCampaign) -> Result<CampaignId> {
        let mut registry = self.registry();
        if registry.by_product.contains_key(&campaign.product_id) {
            return Err(OpenescrowError::Configuration(format!(
                "product {} already has a registered campaign",
                campaign.product_id
            )));
        }

        let id = campaign.id;
        registry.by_product.insert(campaign.product_id, id);
        registry.by_id.insert(
            id,
            Arc::new(CampaignEntry {
                consumed: AtomicU32::new(campaign.stock_consumed),
                active: AtomicBool::new(campaign.active),
                campaign,
            }),
        );
        Ok(id)
    }

    /// Deactivate a campaign. Orders already priced against it keep
    /// their frozen amount.
    pub fn deactivate(&self, campaign_id: CampaignId) -> Result<()> {
        let entry = self.entry(campaign_id)?;
        entry.active.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// The effective unit price for a product at `now`.
    ///
    /// Returns the discounted price and campaign ID only if the campaign
    /// is live and stock remains in this snapshot. The remaining-stock
    /// read here is advisory — `reserve` re-checks inside the atomic
    /// increment, which is the only check that counts.
    #[must_use]
    pub fn price_for(
        &self,
        product_id: ProductId,
        base_price: Decimal,
        now: DateTime<Utc>,
    ) -> Quote {
        let entry = {
            let registry = self.registry();
            registry
                .by_product
                .get(&product_id)
                .and_then(|id| registry.by_id.get(id))
                .cloned()
        };

        match entry {
            Some(entry)
                if entry.is_live(now)
                    && entry.consumed.load(Ordering::SeqCst) < entry.campaign.stock_limit =>
            {
                Quote {
                    unit_price: entry.campaign.discounted_price,
                    campaign_id: Some(entry.campaign.id),
                }
            }
            _ => Quote {
                unit_price: base_price,
                campaign_id: None,
            },
        }
    }

    /// Atomically consume `quantity` units: *add N where consumed + N ≤
    /// limit*. On rejection the caller falls back to the undiscounted
    /// price path or fails the order — the limit is never exceeded.
    ///
    /// # Errors
    /// - `CampaignNotFound` for an unknown campaign
    /// - `CampaignNotLive` outside the window or after deactivation
    /// - `StockExhausted` when the increment would exceed the limit
    pub fn reserve(&self, campaign_id: CampaignId, quantity: u32) -> Result<()> {
        self.reserve_at(campaign_id, quantity, Utc::now())
    }

    /// `reserve` against an explicit clock.
    pub fn reserve_at(
        &self,
        campaign_id: CampaignId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let entry = self.entry(campaign_id)?;
        if !entry.is_live(now) {
            return Err(OpenescrowError::CampaignNotLive(campaign_id));
        }

        let limit = entry.campaign.stock_limit;
        entry
            .consumed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |consumed| {
                let next = consumed.checked_add(quantity)?;
                (next <= limit).then_some(next)
            })
            .map(|_| ())
            .map_err(|_| OpenescrowError::StockExhausted { campaign_id })
    }

    /// Live units consumed for a campaign.
    pub fn stock_consumed(&self, campaign_id: CampaignId) -> Result<u32> {
        Ok(self.entry(campaign_id)?.consumed.load(Ordering::SeqCst))
    }

    /// Snapshot of the campaign record with live counters filled in.
    pub fn snapshot(&self, campaign_id: CampaignId) -> Result<DiscountCampaign> {
        let entry = self.entry(campaign_id)?;
        let mut campaign = entry.campaign.clone();
        campaign.stock_consumed = entry.consumed.load(Ordering::SeqCst);
        campaign.active = entry.active.load(Ordering::SeqCst);
        Ok(campaign)
    }

    fn entry(&self, campaign_id: CampaignId) -> Result<Arc<CampaignEntry>> {
        self.registry()
            .by_id
            .get(&campaign_id)
            .cloned()
            .ok_or(OpenescrowError::CampaignNotFound(campaign_id))
    }
}
