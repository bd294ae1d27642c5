//! Delivery-proof flow — two alternate paths to the same terminal state.
//!
//! **Token-scan path**: either counterpart submits the bearer token from
//! the QR handshake. The capsule must decrypt, be within its TTL, and be
//! byte-identical to the order's stored current token — a token that
//! decrypts but matches a different (or superseded) stored value is a
//! replay and is rejected as `TokenMismatch`.
//!
//! **Release-key path**: the seller submits the numeric key stamped at
//! pickup time. Exists for self-delivery, where no independent courier
//! performs a scan handshake.
//!
//! Both paths are authorization-then-single-transition; neither performs
//! partial releases.

use chrono::Utc;
use openescrow_types::{AuthContext, OpenescrowError, Order, OrderId, Result};

use crate::coordinator::EscrowCoordinator;

impl EscrowCoordinator {
    /// Verify a delivery-proof token and release escrow to the seller.
    ///
    /// # Errors
    /// - `TokenMalformed` / `TokenWrongKey` / `TokenExpired` from decoding
    /// - `TokenMismatch` if the token is not the order's stored current one
    /// - `Forbidden` unless the caller is buyer or seller on the order
    /// - `InvalidEscrowState` unless escrow is held
    pub fn verify_delivery(&self, ctx: &AuthContext, token: &str) -> Result<Order> {
        let payload = self.codec.decode(token, Utc::now())?;
        let order = self.store.get(payload.order_id)?;

        // Compare against the stored current token, not merely the
        // decoded order id — this rejects superseded mints and tokens
        // replayed against a different, still-open order.
        if order.proof_token.as_deref() != Some(token) {
            return Err(OpenescrowError::TokenMismatch { order_id: order.id });
        }
        if !ctx.is_counterpart_on(&order) {
            return Err(OpenescrowError::Forbidden {
                reason: format!(
                    "party {} is not a counterpart on order {}",
                    ctx.acting_party, order.id
                ),
            });
        }

        let released = self.store.release_escrow(order.id)?;
        self.finish_completion(&released);
        Ok(released)
    }

    /// Seller-initiated completion without a scan: exact match against
    /// the release key stamped at pickup time.
    ///
    /// # Errors
    /// - `Forbidden` unless the caller is the seller, or the key differs
    /// - `InvalidOrderState` if no key exists yet (nothing was picked up)
    /// - `InvalidEscrowState` unless escrow is held
    pub fn confirm_with_release_key(
        &self,
        ctx: &AuthContext,
        order_id: OrderId,
        release_key: &str,
    ) -> Result<Order> {
        let order = self.store.get(order_id)?;
        if !ctx.is_seller_on(&order) {
            return Err(OpenescrowError::Forbidden {
                reason: format!("party {} is not the seller on {order_id}", ctx.acting_party),
            });
        }

        let Some(stored) = order.release_key.as_deref() else {
            return Err(OpenescrowError::InvalidOrderState {
                order_id,
                current: order.status,
            });
        };
        if stored != release_key {
            return Err(OpenescrowError::Forbidden {
                reason: "release key mismatch".into(),
            });
        }

        let released = self.store.release_escrow(order_id)?;
        self.finish_completion(&released);
        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use openescrow_types::{
        EscrowConfig, EscrowStatus, FulfillmentKind, MissionStatus, OrderStatus, PartyId,
    };
    use rust_decimal::Decimal;

    use crate::catalog::Product;
    use crate::external::testing::{StubNotifier, StubPaymentProvider};

    use super::*;

    struct Rig {
        coordinator: EscrowCoordinator,
        payments: Arc<StubPaymentProvider>,
        notifier: Arc<StubNotifier>,
        buyer: AuthContext,
        seller: AuthContext,
    }

    fn rig() -> Rig {
        let payments = Arc::new(StubPaymentProvider::new());
        let notifier = Arc::new(StubNotifier::new());
        let coordinator = EscrowCoordinator::new(
            EscrowConfig::default(),
            &[3u8; 32],
            Arc::clone(&payments) as Arc<dyn crate::external::PaymentProvider>,
            Arc::clone(&notifier) as Arc<dyn crate::external::Notifier>,
        )
        .unwrap();
        Rig {
            coordinator,
            payments,
            notifier,
            buyer: AuthContext::buyer(PartyId::new()),
            seller: AuthContext::seller(PartyId::new()),
        }
    }

    /// Checkout + payment, returning the held order.
    fn paid_order(rig: &Rig, reference: &str) -> Order {
        let product = Product::new(
            rig.seller.acting_party,
            "Walnut chess set",
            Decimal::new(2000, 2),
        );
        rig.coordinator.catalog().register(product.clone());
        let order = rig
            .coordinator
            .checkout(&rig.buyer, product.id, 1, FulfillmentKind::Delivery)
            .unwrap();
        rig.payments.capture(reference, order.id, order.amount);
        rig.coordinator.confirm_payment(reference).unwrap()
    }

    #[test]
    fn token_scan_releases_escrow() {
        let rig = rig();
        let order = paid_order(&rig, "ref-1");
        let token = order.proof_token.clone().unwrap();

        let released = rig.coordinator.verify_delivery(&rig.buyer, &token).unwrap();
        assert_eq!(released.escrow, EscrowStatus::Released);
        assert_eq!(released.status, OrderStatus::Completed);
        assert!(released.delivered_at.is_some());

        // Buyer was notified, fire-and-forget.
        assert_eq!(rig.notifier.sent(), vec![(order.buyer_id, order.id)]);
    }

    #[test]
    fn seller_may_also_scan() {
        let rig = rig();
        let order = paid_order(&rig, "ref-1");
        let token = order.proof_token.clone().unwrap();

        let released = rig.coordinator.verify_delivery(&rig.seller, &token).unwrap();
        assert_eq!(released.escrow, EscrowStatus::Released);
    }

    #[test]
    fn stranger_scan_is_forbidden() {
        let rig = rig();
        let order = paid_order(&rig, "ref-1");
        let token = order.proof_token.clone().unwrap();

        let stranger = AuthContext::buyer(PartyId::new());
        let err = rig.coordinator.verify_delivery(&stranger, &token).unwrap_err();
        assert!(matches!(err, OpenescrowError::Forbidden { .. }));

        // Escrow untouched by the failed attempt.
        let row = rig.coordinator.store().get(order.id).unwrap();
        assert_eq!(row.escrow, EscrowStatus::Held);
    }

    #[test]
    fn token_from_another_order_is_mismatch() {
        // Same buyer and seller, two open orders: order A's token must
        // not complete order B — and it also must not complete A when
        // submitted against B's verify call, because the decoded order id
        // routes back to A where it *does* match. What must fail is a
        // token that decrypts fine but is not the stored current token.
        let rig = rig();
        let order_a = paid_order(&rig, "ref-a");

        // Re-mint for order A directly through the codec, simulating a
        // superseded capsule still floating around.
        let stale = rig
            .coordinator
            .codec
            .mint(
                order_a.id,
                order_a.amount,
                order_a.seller_id,
                order_a.buyer_id,
            )
            .unwrap();

        let err = rig.coordinator.verify_delivery(&rig.buyer, &stale).unwrap_err();
        assert!(matches!(
            err,
            OpenescrowError::TokenMismatch { order_id } if order_id == order_a.id
        ));

        // The stored token still works.
        let token = order_a.proof_token.clone().unwrap();
        assert!(rig.coordinator.verify_delivery(&rig.buyer, &token).is_ok());
    }

    #[test]
    fn garbage_token_is_malformed() {
        let rig = rig();
        paid_order(&rig, "ref-1");
        let err = rig
            .coordinator
            .verify_delivery(&rig.buyer, "AAAA not a token")
            .unwrap_err();
        assert!(matches!(err, OpenescrowError::TokenMalformed));
    }

    #[test]
    fn double_scan_reports_invalid_state_with_actual_escrow() {
        let rig = rig();
        let order = paid_order(&rig, "ref-1");
        let token = order.proof_token.clone().unwrap();

        rig.coordinator.verify_delivery(&rig.buyer, &token).unwrap();
        let err = rig.coordinator.verify_delivery(&rig.buyer, &token).unwrap_err();
        assert!(matches!(
            err,
            OpenescrowError::InvalidEscrowState {
                current: EscrowStatus::Released,
                ..
            }
        ));
    }

    #[test]
    fn release_key_path_completes_self_delivery() {
        let rig = rig();
        let order = paid_order(&rig, "ref-1");

        rig.coordinator.mark_ready(&rig.seller, order.id).unwrap();
        let picked = rig.coordinator.mark_picked_up(&rig.seller, order.id).unwrap();
        let key = picked.release_key.clone().unwrap();
        assert_eq!(key.len(), 6);

        let released = rig
            .coordinator
            .confirm_with_release_key(&rig.seller, order.id, &key)
            .unwrap();
        assert_eq!(released.escrow, EscrowStatus::Released);
        assert_eq!(released.status, OrderStatus::Completed);

        // The lazily-created self-delivery mission reached DELIVERED.
        let mission = rig.coordinator.broker().missions().get(order.id).unwrap();
        assert_eq!(mission.status, MissionStatus::Delivered);
        assert_eq!(mission.courier_id, rig.seller.acting_party);
    }

    #[test]
    fn wrong_release_key_is_forbidden() {
        let rig = rig();
        let order = paid_order(&rig, "ref-1");
        rig.coordinator.mark_ready(&rig.seller, order.id).unwrap();
        let picked = rig.coordinator.mark_picked_up(&rig.seller, order.id).unwrap();

        // Flip one digit of the real key so the guess is always wrong.
        let real = picked.release_key.unwrap();
        let flipped = if real.starts_with('9') { "0" } else { "9" };
        let wrong = format!("{flipped}{}", &real[1..]);

        let err = rig
            .coordinator
            .confirm_with_release_key(&rig.seller, order.id, &wrong)
            .unwrap_err();
        assert!(matches!(err, OpenescrowError::Forbidden { .. }));

        let row = rig.coordinator.store().get(order.id).unwrap();
        assert_eq!(row.escrow, EscrowStatus::Held);
    }

    #[test]
    fn release_key_before_pickup_is_invalid_state() {
        let rig = rig();
        let order = paid_order(&rig, "ref-1");
        let err = rig
            .coordinator
            .confirm_with_release_key(&rig.seller, order.id, "123456")
            .unwrap_err();
        assert!(matches!(err, OpenescrowError::InvalidOrderState { .. }));
    }

    #[test]
    fn buyer_cannot_use_release_key_path() {
        let rig = rig();
        let order = paid_order(&rig, "ref-1");
        let err = rig
            .coordinator
            .confirm_with_release_key(&rig.buyer, order.id, "123456")
            .unwrap_err();
        assert!(matches!(err, OpenescrowError::Forbidden { .. }));
    }

    #[test]
    fn notification_failure_never_blocks_completion() {
        let rig = rig();
        let order = paid_order(&rig, "ref-1");
        rig.notifier.set_failing(true);

        let token = order.proof_token.clone().unwrap();
        let released = rig.coordinator.verify_delivery(&rig.buyer, &token).unwrap();
        assert_eq!(released.escrow, EscrowStatus::Released);
        assert!(rig.notifier.sent().is_empty());
    }
}
