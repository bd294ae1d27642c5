//! The coordinator wiring plus the courier- and seller-facing
//! progression operations. The checkout, payment, and delivery flows
//! live in their own modules.

use std::sync::Arc;

use openescrow_ledger::{claim, ClaimBroker, ClaimReceipt, InventoryLedger, OrderStore};
use openescrow_token::TokenCodec;
use openescrow_types::constants::TOKEN_SECRET_LEN;
use openescrow_types::{
    AuthContext, EscrowConfig, OpenescrowError, Order, OrderId, Result, Role,
};

use crate::catalog::ProductCatalog;
use crate::external::{Notifier, PaymentProvider};
use crate::reconcile::{EscrowReconciler, ReconcileReport};

/// Sequences the token codec, order store, claim broker, and inventory
/// ledger into the user-facing flows. Owns no invariants of its own.
pub struct EscrowCoordinator {
    pub(crate) config: EscrowConfig,
    pub(crate) catalog: ProductCatalog,
    pub(crate) store: Arc<OrderStore>,
    pub(crate) inventory: Arc<InventoryLedger>,
    pub(crate) broker: ClaimBroker,
    pub(crate) codec: TokenCodec,
    pub(crate) payments: Arc<dyn PaymentProvider>,
    pub(crate) notifier: Arc<dyn Notifier>,
}

impl EscrowCoordinator {
    /// Wire up a coordinator over fresh ledgers.
    ///
    /// # Errors
    /// `Configuration` if the token secret is rejected.
    pub fn new(
        config: EscrowConfig,
        token_secret: &[u8; TOKEN_SECRET_LEN],
        payments: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let store = Arc::new(OrderStore::new());
        Ok(Self {
            config,
            catalog: ProductCatalog::new(),
            broker: ClaimBroker::new(Arc::clone(&store)),
            store,
            inventory: Arc::new(InventoryLedger::new()),
            codec: TokenCodec::new(token_secret)?,
            payments,
            notifier,
        })
    }

    #[must_use]
    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn inventory(&self) -> &InventoryLedger {
        &self.inventory
    }

    #[must_use]
    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    #[must_use]
    pub fn broker(&self) -> &ClaimBroker {
        &self.broker
    }

    /// Courier claims a delivery order. Exactly one concurrent caller
    /// wins; the rest see `ClaimConflict`.
    ///
    /// # Errors
    /// `Forbidden` unless the context carries the courier role, plus
    /// everything [`ClaimBroker::claim`] reports.
    pub fn claim(&self, ctx: &AuthContext, order_id: OrderId) -> Result<ClaimReceipt> {
        if ctx.role != Role::Courier {
            return Err(OpenescrowError::Forbidden {
                reason: format!("role {} may not claim missions", ctx.role),
            });
        }
        self.broker.claim(order_id, ctx.acting_party)
    }

    /// Seller starts preparing the goods.
    pub fn mark_preparing(&self, ctx: &AuthContext, order_id: OrderId) -> Result<Order> {
        self.require_seller(ctx, order_id)?;
        self.store.mark_preparing(order_id)
    }

    /// Seller signals the goods are ready for handoff.
    pub fn mark_ready(&self, ctx: &AuthContext, order_id: OrderId) -> Result<Order> {
        self.require_seller(ctx, order_id)?;
        self.store.mark_ready(order_id)
    }

    /// Record the handoff: the claimed courier collects the goods, or the
    /// seller departs on a self-delivery. Generates and stores the
    /// release key, and advances (lazily creating, for self-delivery)
    /// the mission.
    pub fn mark_picked_up(&self, ctx: &AuthContext, order_id: OrderId) -> Result<Order> {
        let order = self.store.get(order_id)?;
        let is_assigned_courier = order.courier_id == Some(ctx.acting_party);
        let is_self_delivery = order.courier_id.is_none() && ctx.is_seller_on(&order);
        if !is_assigned_courier && !is_self_delivery {
            return Err(OpenescrowError::Forbidden {
                reason: format!(
                    "party {} may not record pickup on order {order_id}",
                    ctx.acting_party
                ),
            });
        }

        let release_key = claim::numeric_code(self.config.release_key_digits);
        let updated = self.store.mark_picked_up(order_id, release_key)?;

        self.broker.missions().assign(order_id, ctx.acting_party);
        self.broker.missions().mark_picked_up(order_id)?;
        Ok(updated)
    }

    /// Cancel an order on behalf of the buyer or an admin. When escrow is
    /// held the cancellation records a refund; a claimed courier is
    /// released as part of the same logical operation.
    pub fn cancel_order(&self, ctx: &AuthContext, order_id: OrderId) -> Result<Order> {
        let outcome = self.store.cancel(order_id, ctx)?;
        if let Some(courier) = outcome.released_courier {
            self.broker.restore_after_cancel(order_id, courier);
        }
        tracing::info!(order_id = %order_id, escrow = %outcome.order.escrow, "order cancelled");
        Ok(outcome.order)
    }

    /// Escrow conservation sweep over every order row.
    pub fn reconcile(&self) -> Result<ReconcileReport> {
        EscrowReconciler::new(Arc::clone(&self.store)).verify()
    }

    /// Completion bookkeeping shared by both delivery-proof paths:
    /// mission to DELIVERED, courier availability restored, buyer
    /// notified. Notification failures are logged and swallowed.
    pub(crate) fn finish_completion(&self, order: &Order) {
        if self.broker.missions().get(order.id).is_ok() {
            if let Err(err) = self.broker.missions().mark_delivered(order.id) {
                tracing::warn!(order_id = %order.id, %err, "mission not advanced to delivered");
            }
        }
        if let Some(courier) = order.courier_id {
            self.broker.roster().restore(courier);
        }
        if let Err(err) = self.notifier.order_completed(order.buyer_id, order.id) {
            tracing::warn!(order_id = %order.id, %err, "completion notification failed");
        }
    }

    fn require_seller(&self, ctx: &AuthContext, order_id: OrderId) -> Result<()> {
        let order = self.store.get(order_id)?;
        if !ctx.is_seller_on(&order) && !ctx.is_admin() {
            return Err(OpenescrowError::Forbidden {
                reason: format!("party {} is not the seller on {order_id}", ctx.acting_party),
            });
        }
        Ok(())
    }
}
