//! Escrow conservation sweep.
//!
//! Invariant checked over every order row:
//!
//! ```text
//! ∀ order: amount sits in exactly one bucket — pending, held, released,
//!          or refunded — and escrow status agrees with order status.
//! ```
//!
//! If any row disagrees, something has gone catastrophically wrong and
//! the sweep reports [`EscrowImbalance`]. This is the safety net behind
//! every flow, run by an operator job rather than inline.
//!
//! [`EscrowImbalance`]: OpenescrowError::EscrowImbalance

use std::sync::Arc;

use openescrow_ledger::OrderStore;
use openescrow_types::{
    EscrowStatus, FulfillmentKind, OpenescrowError, Order, OrderStatus, Result,
};
use rust_decimal::Decimal;

/// Per-bucket totals from one sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub orders_checked: usize,
    pub pending_total: Decimal,
    pub held_total: Decimal,
    pub released_total: Decimal,
    pub refunded_total: Decimal,
}

impl ReconcileReport {
    /// Sum across all buckets — every order's amount, counted once.
    #[must_use]
    pub fn grand_total(&self) -> Decimal {
        self.pending_total + self.held_total + self.released_total + self.refunded_total
    }
}

/// Sweeps the order store and validates escrow/status coherence.
pub struct EscrowReconciler {
    store: Arc<OrderStore>,
}

impl EscrowReconciler {
    #[must_use]
    pub fn new(store: Arc<OrderStore>) -> Self {
        Self { store }
    }

    /// Run the sweep.
    ///
    /// # Errors
    /// [`OpenescrowError::EscrowImbalance`] naming the first row that
    /// violates coherence.
    pub fn verify(&self) -> Result<ReconcileReport> {
        let orders = self.store.snapshot();
        let mut report = ReconcileReport {
            orders_checked: orders.len(),
            pending_total: Decimal::ZERO,
            held_total: Decimal::ZERO,
            released_total: Decimal::ZERO,
            refunded_total: Decimal::ZERO,
        };

        for order in &orders {
            Self::check_row(order)?;
            match order.escrow {
                EscrowStatus::Pending => report.pending_total += order.amount,
                EscrowStatus::Held => report.held_total += order.amount,
                EscrowStatus::Released => report.released_total += order.amount,
                EscrowStatus::Refunded => report.refunded_total += order.amount,
            }
        }

        tracing::debug!(
            checked = report.orders_checked,
            held = %report.held_total,
            released = %report.released_total,
            "reconcile sweep clean"
        );
        Ok(report)
    }

    fn check_row(order: &Order) -> Result<()> {
        let fail = |reason: String| {
            Err(OpenescrowError::EscrowImbalance {
                reason: format!("order {}: {reason}", order.id),
            })
        };

        if !order.proof_invariant_holds() {
            return fail(format!(
                "proof token presence disagrees with escrow {}",
                order.escrow
            ));
        }
        if order.courier_id.is_some() && order.fulfillment != FulfillmentKind::Delivery {
            return fail("courier assigned to a non-delivery order".into());
        }

        let coherent = match order.escrow {
            EscrowStatus::Released => order.status == OrderStatus::Completed,
            EscrowStatus::Refunded => order.status == OrderStatus::Cancelled,
            // Held funds must sit on an in-flight order.
            EscrowStatus::Held => matches!(
                order.status,
                OrderStatus::Paid | OrderStatus::Preparing | OrderStatus::Ready | OrderStatus::PickedUp
            ),
            EscrowStatus::Pending => !matches!(order.status, OrderStatus::Completed),
        };
        if !coherent {
            return fail(format!(
                "escrow {} does not cohere with status {}",
                order.escrow, order.status
            ));
        }
        Ok(())
    }
}
