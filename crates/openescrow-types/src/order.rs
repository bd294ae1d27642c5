//! Order types for the OpenEscrow engine.
//!
//! An order is the authoritative record of one purchase: status, escrow
//! status, amount, parties, and the delivery-proof material. Orders are
//! never deleted — cancellation and refund are terminal statuses.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CampaignId, OrderId, PartyId, ProductId};

/// How the goods reach the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum FulfillmentKind {
    /// Buyer collects from the seller; no courier slot exists.
    Pickup,
    /// A courier (or the seller self-delivering) brings the goods.
    Delivery,
}

impl std::fmt::Display for FulfillmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pickup => write!(f, "PICKUP"),
            Self::Delivery => write!(f, "DELIVERY"),
        }
    }
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Paid,
    Preparing,
    Ready,
    PickedUp,
    Completed,
    Cancelled,
    Failed,
}

impl OrderStatus {
    /// Terminal statuses admit no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Can this status transition to the given target?
    ///
    /// The forward path is `Pending → Paid → Preparing → Ready → PickedUp
    /// → Completed` (with `Preparing` skippable). Any non-terminal status
    /// may transition to `Cancelled`; statuses before pickup may
    /// transition to `Failed`.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        match (self, target) {
            (Self::Pending, Self::Paid)
            | (Self::Paid, Self::Preparing | Self::Ready)
            | (Self::Preparing, Self::Ready)
            | (Self::Ready, Self::PickedUp)
            | (Self::PickedUp, Self::Completed) => true,
            (from, Self::Cancelled) => !from.is_terminal(),
            (
                Self::Pending | Self::Paid | Self::Preparing | Self::Ready,
                Self::Failed,
            ) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Paid => write!(f, "PAID"),
            Self::Preparing => write!(f, "PREPARING"),
            Self::Ready => write!(f, "READY"),
            Self::PickedUp => write!(f, "PICKED_UP"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Where the buyer's money currently sits.
///
/// Transitions are **monotonic**: `Pending → Held → {Released | Refunded}`.
/// The refund path from `Held` is the only branch; nothing ever moves
/// backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum EscrowStatus {
    /// No funds captured yet.
    Pending,
    /// Funds captured, not yet released.
    Held,
    /// Funds paid out to the seller. **Irreversible.**
    Released,
    /// Funds returned to the buyer. **Irreversible.**
    Refunded,
}

impl EscrowStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released | Self::Refunded)
    }

    /// Can this escrow status transition to the given target?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Held) | (Self::Held, Self::Released | Self::Refunded)
        )
    }
}

impl std::fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Held => write!(f, "HELD"),
            Self::Released => write!(f, "RELEASED"),
            Self::Refunded => write!(f, "REFUNDED"),
        }
    }
}

/// The authoritative record of one purchase.
///
/// Row invariants (enforced by the order store, asserted here):
/// - `courier_id` is set iff this is a claimed delivery order
/// - `proof_token` is set iff `escrow ∈ {Held, Released}`
/// - the price in `amount` was frozen at creation time; campaign changes
///   never retroactively affect it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: PartyId,
    pub seller_id: PartyId,
    /// Absent until a courier wins the claim. At most one actor ever
    /// holds this slot.
    pub courier_id: Option<PartyId>,
    pub product_id: ProductId,
    /// Monetary amount in the system's single currency unit.
    pub amount: Decimal,
    pub fulfillment: FulfillmentKind,
    pub status: OrderStatus,
    pub escrow: EscrowStatus,
    /// The current delivery-proof bearer token. Derived data cached on
    /// the row for comparison; re-minting supersedes the old value.
    pub proof_token: Option<String>,
    /// 6-digit human handshake code, set when a courier claims.
    pub pickup_code: Option<String>,
    /// Numeric key for scan-free completion, set at pickup time.
    pub release_key: Option<String>,
    /// The campaign whose stock funded a discounted price, if any.
    pub campaign_id: Option<CampaignId>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// A fresh order as produced by checkout: nothing paid, nothing claimed.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        buyer_id: PartyId,
        seller_id: PartyId,
        product_id: ProductId,
        amount: Decimal,
        fulfillment: FulfillmentKind,
        campaign_id: Option<CampaignId>,
    ) -> Self {
        Self {
            id: OrderId::new(),
            buyer_id,
            seller_id,
            courier_id: None,
            product_id,
            amount,
            fulfillment,
            status: OrderStatus::Pending,
            escrow: EscrowStatus::Pending,
            proof_token: None,
            pickup_code: None,
            release_key: None,
            campaign_id,
            created_at: Utc::now(),
            paid_at: None,
            delivered_at: None,
        }
    }

    /// `true` once a courier holds the slot.
    #[must_use]
    pub fn is_claimed(&self) -> bool {
        self.courier_id.is_some()
    }

    /// `true` while the order can still be cancelled.
    #[must_use]
    pub fn is_cancellable(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Is the given party the buyer or the seller on this order?
    #[must_use]
    pub fn is_counterpart(&self, party: PartyId) -> bool {
        self.buyer_id == party || self.seller_id == party
    }

    /// Check the proof-token ⇔ escrow invariant for this row.
    #[must_use]
    pub fn proof_invariant_holds(&self) -> bool {
        match self.escrow {
            EscrowStatus::Held | EscrowStatus::Released => self.proof_token.is_some(),
            EscrowStatus::Pending => self.proof_token.is_none(),
            // A refunded order keeps the token it held — it is dead weight
            // but harmless, and the row is never mutated again.
            EscrowStatus::Refunded => true,
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy_delivery(buyer: PartyId, seller: PartyId, amount: Decimal) -> Self {
        Self::new(
            buyer,
            seller,
            ProductId::new(),
            amount,
            FulfillmentKind::Delivery,
            None,
        )
    }

    pub fn dummy_pickup(buyer: PartyId, seller: PartyId, amount: Decimal) -> Self {
        Self::new(
            buyer,
            seller,
            ProductId::new(),
            amount,
            FulfillmentKind::Pickup,
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fulfillment_display() {
        assert_eq!(format!("{}", FulfillmentKind::Pickup), "PICKUP");
        assert_eq!(format!("{}", FulfillmentKind::Delivery), "DELIVERY");
    }

    #[test]
    fn status_forward_path() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Ready));
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Preparing));
        assert!(OrderStatus::Preparing.can_transition_to(OrderStatus::Ready));
        assert!(OrderStatus::Ready.can_transition_to(OrderStatus::PickedUp));
        assert!(OrderStatus::PickedUp.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn status_no_skipping_pickup() {
        assert!(!OrderStatus::Ready.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::PickedUp));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Ready));
    }

    #[test]
    fn any_non_terminal_cancellable() {
        for s in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::PickedUp,
        ] {
            assert!(s.can_transition_to(OrderStatus::Cancelled), "{s}");
        }
        for s in [
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            OrderStatus::Failed,
        ] {
            assert!(!s.can_transition_to(OrderStatus::Cancelled), "{s}");
        }
    }

    #[test]
    fn picked_up_cannot_fail() {
        assert!(!OrderStatus::PickedUp.can_transition_to(OrderStatus::Failed));
        assert!(OrderStatus::Ready.can_transition_to(OrderStatus::Failed));
    }

    #[test]
    fn escrow_transitions_monotonic() {
        assert!(EscrowStatus::Pending.can_transition_to(EscrowStatus::Held));
        assert!(EscrowStatus::Held.can_transition_to(EscrowStatus::Released));
        assert!(EscrowStatus::Held.can_transition_to(EscrowStatus::Refunded));

        assert!(!EscrowStatus::Held.can_transition_to(EscrowStatus::Pending));
        assert!(!EscrowStatus::Released.can_transition_to(EscrowStatus::Refunded));
        assert!(!EscrowStatus::Refunded.can_transition_to(EscrowStatus::Held));
        assert!(!EscrowStatus::Pending.can_transition_to(EscrowStatus::Released));
    }

    #[test]
    fn escrow_display() {
        assert_eq!(format!("{}", EscrowStatus::Held), "HELD");
        assert_eq!(format!("{}", EscrowStatus::Refunded), "REFUNDED");
    }

    #[test]
    fn new_order_starts_pending() {
        let order = Order::dummy_delivery(PartyId::new(), PartyId::new(), Decimal::new(2000, 2));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.escrow, EscrowStatus::Pending);
        assert!(!order.is_claimed());
        assert!(order.proof_invariant_holds());
    }

    #[test]
    fn counterpart_check() {
        let buyer = PartyId::new();
        let seller = PartyId::new();
        let order = Order::dummy_delivery(buyer, seller, Decimal::ONE);
        assert!(order.is_counterpart(buyer));
        assert!(order.is_counterpart(seller));
        assert!(!order.is_counterpart(PartyId::new()));
    }

    #[test]
    fn serde_roundtrip() {
        let order = Order::dummy_delivery(PartyId::new(), PartyId::new(), Decimal::new(999, 2));
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order.id, back.id);
        assert_eq!(order.amount, back.amount);
        assert_eq!(order.status, back.status);
        assert_eq!(order.escrow, back.escrow);
    }
}
