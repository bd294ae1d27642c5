//! The authoritative order store.
//!
//! Every transition checks its precondition and applies its mutation
//! inside one critical section against the row — the in-memory analogue
//! of a one-statement conditional `UPDATE`. Two legitimate actors racing
//! on the same order (buyer cancelling while the seller releases, a
//! duplicate payment webhook, two couriers claiming) are arbitrated here
//! and nowhere else: the loser gets `InvalidState`/`Conflict`, never a
//! silent overwrite.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use openescrow_types::{
    AuthContext, CampaignId, EscrowStatus, FulfillmentKind, OpenescrowError, Order, OrderId,
    OrderStatus, PartyId, ProductId, Result,
};
use rust_decimal::Decimal;

/// Result of a cancellation: the terminal row plus the courier whose
/// claim must now be released, if one was assigned.
#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub order: Order,
    pub released_courier: Option<PartyId>,
}

/// Persist and transition [`Order`] rows with compare-and-swap semantics.
#[derive(Debug, Default)]
pub struct OrderStore {
    orders: Mutex<HashMap<OrderId, Order>>,
}

impl OrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> MutexGuard<'_, HashMap<OrderId, Order>> {
        self.orders.lock().expect("order store lock poisoned")
    }

    /// Create a new order. Always succeeds: status `Pending`, escrow
    /// `Pending`, price frozen at the given amount.
    pub fn create_order(
        &self,
        buyer_id: PartyId,
        seller_id: PartyId,
        product_id: ProductId,
        amount: Decimal,
        fulfillment: FulfillmentKind,
        campaign_id: Option<CampaignId>,
    ) -> Order {
        let order = Order::new(
            buyer_id,
            seller_id,
            product_id,
            amount,
            fulfillment,
            campaign_id,
        );
        self.rows().insert(order.id, order.clone());
        tracing::debug!(order_id = %order.id, amount = %order.amount, "order created");
        order
    }

    /// Read-only snapshot of one row.
    pub fn get(&self, order_id: OrderId) -> Result<Order> {
        self.rows()
            .get(&order_id)
            .cloned()
            .ok_or(OpenescrowError::OrderNotFound(order_id))
    }

    /// Confirm payment: escrow `Pending → Held`, status `Paid`, token
    /// stored, `paid_at` stamped.
    ///
    /// **Idempotent**: if escrow is already `Held`, the stored row is
    /// returned unchanged — a duplicate payment-confirmation call must
    /// not double-process, and the stored token stays authoritative.
    ///
    /// # Errors
    /// `InvalidEscrowState` if escrow is already `Released` or `Refunded`.
    pub fn mark_paid(&self, order_id: OrderId, proof_token: String) -> Result<Order> {
        let mut rows = self.rows();
        let row = rows
            .get_mut(&order_id)
            .ok_or(OpenescrowError::OrderNotFound(order_id))?;

        match row.escrow {
            EscrowStatus::Pending => {
                row.escrow = EscrowStatus::Held;
                row.status = OrderStatus::Paid;
                row.proof_token = Some(proof_token);
                row.paid_at = Some(Utc::now());
                tracing::info!(order_id = %order_id, "escrow held");
                Ok(row.clone())
            }
            EscrowStatus::Held => Ok(row.clone()),
            current @ (EscrowStatus::Released | EscrowStatus::Refunded) => {
                Err(OpenescrowError::InvalidEscrowState { order_id, current })
            }
        }
    }

    /// Seller signals the goods are being prepared: `Paid → Preparing`.
    pub fn mark_preparing(&self, order_id: OrderId) -> Result<Order> {
        self.transition_status(order_id, OrderStatus::Preparing)
    }

    /// Seller signals the goods are ready for handoff: `Paid | Preparing
    /// → Ready`.
    pub fn mark_ready(&self, order_id: OrderId) -> Result<Order> {
        self.transition_status(order_id, OrderStatus::Ready)
    }

    /// The goods left the seller: `Ready → PickedUp`. Stores the release
    /// key for scan-free completion. Strict precondition — there is no
    /// loose pickup path.
    pub fn mark_picked_up(&self, order_id: OrderId, release_key: String) -> Result<Order> {
        let mut rows = self.rows();
        let row = rows
            .get_mut(&order_id)
            .ok_or(OpenescrowError::OrderNotFound(order_id))?;

        if row.status != OrderStatus::Ready {
            return Err(OpenescrowError::InvalidOrderState {
                order_id,
                current: row.status,
            });
        }
        row.status = OrderStatus::PickedUp;
        if row.release_key.is_none() {
            row.release_key = Some(release_key);
        }
        Ok(row.clone())
    }

    /// Pay out to the seller: escrow `Held → Released`, status
    /// `Completed`, `delivered_at` stamped.
    ///
    /// Escrow status is the sole precondition; the caller has already
    /// verified the delivery proof.
    ///
    /// # Errors
    /// `InvalidEscrowState` unless escrow is `Held`.
    pub fn release_escrow(&self, order_id: OrderId) -> Result<Order> {
        let mut rows = self.rows();
        let row = rows
            .get_mut(&order_id)
            .ok_or(OpenescrowError::OrderNotFound(order_id))?;

        if row.escrow != EscrowStatus::Held {
            return Err(OpenescrowError::InvalidEscrowState {
                order_id,
                current: row.escrow,
            });
        }
        row.escrow = EscrowStatus::Released;
        row.status = OrderStatus::Completed;
        row.delivered_at = Some(Utc::now());
        tracing::info!(order_id = %order_id, amount = %row.amount, "escrow released");
        Ok(row.clone())
    }

    /// Return funds to the buyer: escrow `Held → Refunded`, status
    /// `Cancelled`. When escrow is still `Pending` the order is cancelled
    /// without a refund side effect — no funds were ever captured.
    ///
    /// # Errors
    /// `InvalidEscrowState` if escrow is already terminal.
    pub fn refund_escrow(&self, order_id: OrderId) -> Result<Order> {
        let mut rows = self.rows();
        let row = rows
            .get_mut(&order_id)
            .ok_or(OpenescrowError::OrderNotFound(order_id))?;

        match row.escrow {
            EscrowStatus::Held => {
                row.escrow = EscrowStatus::Refunded;
                row.status = OrderStatus::Cancelled;
                tracing::info!(order_id = %order_id, amount = %row.amount, "escrow refunded");
                Ok(row.clone())
            }
            EscrowStatus::Pending => {
                row.status = OrderStatus::Cancelled;
                Ok(row.clone())
            }
            current @ (EscrowStatus::Released | EscrowStatus::Refunded) => {
                Err(OpenescrowError::InvalidEscrowState { order_id, current })
            }
        }
    }

    /// Cancel an order on behalf of `ctx`.
    ///
    /// Authorization and state checks happen inside the same critical
    /// section as the mutation. The assigned courier (if any) is cleared
    /// from the row here; the caller releases the claim with the returned
    /// courier ID.
    ///
    /// # Errors
    /// - `Forbidden` unless `ctx` is the order's buyer or an admin
    /// - `InvalidOrderState` if the status is already terminal
    pub fn cancel(&self, order_id: OrderId, ctx: &AuthContext) -> Result<CancelOutcome> {
        let mut rows = self.rows();
        let row = rows
            .get_mut(&order_id)
            .ok_or(OpenescrowError::OrderNotFound(order_id))?;

        if !ctx.may_cancel(row) {
            return Err(OpenescrowError::Forbidden {
                reason: format!("party {} may not cancel order {order_id}", ctx.acting_party),
            });
        }
        if row.status.is_terminal() {
            return Err(OpenescrowError::InvalidOrderState {
                order_id,
                current: row.status,
            });
        }

        match row.escrow {
            EscrowStatus::Held => {
                row.escrow = EscrowStatus::Refunded;
                tracing::info!(order_id = %order_id, amount = %row.amount, "escrow refunded");
            }
            EscrowStatus::Pending => {}
            // Released implies status Completed, which is terminal and
            // already rejected above; Refunded likewise implies Cancelled.
            current @ (EscrowStatus::Released | EscrowStatus::Refunded) => {
                return Err(OpenescrowError::InvalidEscrowState { order_id, current });
            }
        }
        row.status = OrderStatus::Cancelled;
        let released_courier = row.courier_id.take();

        Ok(CancelOutcome {
            order: row.clone(),
            released_courier,
        })
    }

    /// System failure path: `Pending | Paid | Preparing | Ready → Failed`.
    ///
    /// # Errors
    /// `InvalidEscrowState` while escrow is `Held` — refund first, a row
    /// must never fail with funds captured.
    pub fn mark_failed(&self, order_id: OrderId) -> Result<Order> {
        let mut rows = self.rows();
        let row = rows
            .get_mut(&order_id)
            .ok_or(OpenescrowError::OrderNotFound(order_id))?;

        if row.escrow == EscrowStatus::Held {
            return Err(OpenescrowError::InvalidEscrowState {
                order_id,
                current: row.escrow,
            });
        }
        if !row.status.can_transition_to(OrderStatus::Failed) {
            return Err(OpenescrowError::InvalidOrderState {
                order_id,
                current: row.status,
            });
        }
        row.status = OrderStatus::Failed;
        Ok(row.clone())
    }

    /// The claim protocol's conditional write: *set `courier_id` and
    /// `pickup_code` where `courier_id IS NULL` and the order is
    /// delivery-kind*. Returns the number of rows modified (0 or 1).
    ///
    /// This is the sole arbiter of who wins a claim race. Callers must
    /// not pre-read the courier field to decide whether to call this —
    /// that pattern reintroduces the race this method exists to
    /// eliminate.
    pub fn try_assign_courier(
        &self,
        order_id: OrderId,
        courier_id: PartyId,
        pickup_code: String,
    ) -> usize {
        let mut rows = self.rows();
        match rows.get_mut(&order_id) {
            Some(row)
                if row.courier_id.is_none() && row.fulfillment == FulfillmentKind::Delivery =>
            {
                row.courier_id = Some(courier_id);
                row.pickup_code = Some(pickup_code);
                1
            }
            _ => 0,
        }
    }

    /// Unconditionally clear the courier slot (cancellation after claim,
    /// or courier abandonment). No race to prevent here: only one actor
    /// can ever hold the claim. Returns the row and the courier that was
    /// cleared.
    pub fn clear_courier(&self, order_id: OrderId) -> Result<(Order, Option<PartyId>)> {
        let mut rows = self.rows();
        let row = rows
            .get_mut(&order_id)
            .ok_or(OpenescrowError::OrderNotFound(order_id))?;
        let cleared = row.courier_id.take();
        row.pickup_code = None;
        Ok((row.clone(), cleared))
    }

    /// Snapshot of every row, for reconciliation.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Order> {
        self.rows().values().cloned().collect()
    }

    /// Number of orders stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    fn transition_status(&self, order_id: OrderId, target: OrderStatus) -> Result<Order> {
        let mut rows = self.rows();
        let row = rows
            .get_mut(&order_id)
            .ok_or(OpenescrowError::OrderNotFound(order_id))?;

        if !row.status.can_transition_to(target) {
            return Err(OpenescrowError::InvalidOrderState {
                order_id,
                current: row.status,
            });
        }
        row.status = target;
        Ok(row.clone())
    }
}
