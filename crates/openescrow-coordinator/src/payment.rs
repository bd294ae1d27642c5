//! Payment-confirmation flow: provider check → mint proof token →
//! `mark_paid`.
//!
//! Webhook-style providers redeliver confirmations, so the flow is
//! idempotent end to end: a duplicate call finds escrow already held and
//! returns the stored order — the stored token stays authoritative and
//! nothing is double-credited. If minting fails, `mark_paid` is never
//! called.

use openescrow_types::{EscrowStatus, OpenescrowError, Order, Result};

use crate::coordinator::EscrowCoordinator;

impl EscrowCoordinator {
    /// Confirm a payment by provider reference: escrow `Pending → Held`,
    /// proof token minted and stored.
    ///
    /// # Errors
    /// - `ExternalDependency` if the provider call fails — fatal, funds
    ///   were not confirmed
    /// - `PaymentRejected` if the provider reports unpaid, or the
    ///   captured amount does not match the order
    /// - `InvalidEscrowState` if escrow is already terminal
    pub fn confirm_payment(&self, reference: &str) -> Result<Order> {
        let confirmation = self.payments.confirm(reference)?;
        if !confirmation.paid {
            return Err(OpenescrowError::PaymentRejected {
                reference: reference.to_string(),
            });
        }

        let order = self.store.get(confirmation.order_id)?;
        if confirmation.amount_captured != order.amount {
            tracing::warn!(
                order_id = %order.id,
                captured = %confirmation.amount_captured,
                expected = %order.amount,
                "captured amount mismatch"
            );
            return Err(OpenescrowError::PaymentRejected {
                reference: reference.to_string(),
            });
        }

        // Duplicate webhook: escrow already held, nothing left to do.
        // mark_paid would arbitrate this too; checking here just skips a
        // pointless mint.
        if order.escrow == EscrowStatus::Held {
            return Ok(order);
        }

        let token = self
            .codec
            .mint(order.id, order.amount, order.seller_id, order.buyer_id)?;
        self.store.mark_paid(order.id, token)
    }
}
