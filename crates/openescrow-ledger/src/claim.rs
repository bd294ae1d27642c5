//! The claim protocol — assign exactly one courier to a delivery order.
//!
//! Under any number of concurrent attempts, exactly one caller wins and
//! every other caller receives an explicit [`ClaimConflict`], never a
//! silent overwrite. There is no lock held across a read-then-write:
//! correctness rests entirely on the order store's conditional write,
//! which reports how many rows it modified.
//!
//! [`ClaimConflict`]: OpenescrowError::ClaimConflict

use std::sync::Arc;

use openescrow_types::constants::PICKUP_CODE_DIGITS;
use openescrow_types::{MissionId, OpenescrowError, Order, OrderId, PartyId, Result};
use rand::Rng;

use crate::mission::MissionLog;
use crate::order_store::OrderStore;
use crate::roster::CourierRoster;

/// What the claim winner takes home.
#[derive(Debug, Clone)]
pub struct ClaimReceipt {
    pub order_id: OrderId,
    pub mission_id: MissionId,
    /// Human-verifiable handshake code shown to the seller at pickup.
    /// Random, not globally unique — uniqueness carries no weight here.
    pub pickup_code: String,
}

/// A random n-digit numeric code (pickup codes, release keys).
#[must_use]
pub fn numeric_code(digits: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..digits)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Arbitrates courier claims against the order store.
pub struct ClaimBroker {
    store: Arc<OrderStore>,
    roster: CourierRoster,
    missions: MissionLog,
}

impl ClaimBroker {
    #[must_use]
    pub fn new(store: Arc<OrderStore>) -> Self {
        Self {
            store,
            roster: CourierRoster::new(),
            missions: MissionLog::new(),
        }
    }

    #[must_use]
    pub fn roster(&self) -> &CourierRoster {
        &self.roster
    }

    #[must_use]
    pub fn missions(&self) -> &MissionLog {
        &self.missions
    }

    /// Attempt to claim `order_id` for `courier_id`.
    ///
    /// # Errors
    /// - `CourierUnavailable` if the courier already holds a mission
    /// - `OrderNotFound` if the order does not exist
    /// - `ClaimConflict` if the order is not claimable — most often
    ///   because another courier won the race, also when the order is
    ///   not delivery-kind
    pub fn claim(&self, order_id: OrderId, courier_id: PartyId) -> Result<ClaimReceipt> {
        if !self.roster.try_reserve(courier_id) {
            return Err(OpenescrowError::CourierUnavailable(courier_id));
        }

        let pickup_code = numeric_code(PICKUP_CODE_DIGITS);
        let modified = self
            .store
            .try_assign_courier(order_id, courier_id, pickup_code.clone());

        if modified == 1 {
            let mission = self.missions.assign(order_id, courier_id);
            tracing::info!(
                order_id = %order_id,
                courier_id = %courier_id,
                mission_id = %mission.id,
                "claim won"
            );
            return Ok(ClaimReceipt {
                order_id,
                mission_id: mission.id,
                pickup_code,
            });
        }

        // Zero rows modified. The courier stays available, and one
        // follow-up read classifies the failure — it decides only which
        // error is reported, never who won.
        self.roster.restore(courier_id);
        match self.store.get(order_id) {
            Err(err) => Err(err),
            Ok(_) => {
                tracing::debug!(order_id = %order_id, courier_id = %courier_id, "claim lost");
                Err(OpenescrowError::ClaimConflict(order_id))
            }
        }
    }

    /// Release a claim: clear the courier slot, restore the courier's
    /// availability, cancel the mission. Unconditional — only one actor
    /// can ever hold the claim, so there is no race to arbitrate.
    pub fn release(&self, order_id: OrderId) -> Result<Order> {
        let (order, cleared) = self.store.clear_courier(order_id)?;
        if let Some(courier) = cleared {
            self.restore_after_cancel(order_id, courier);
        }
        Ok(order)
    }

    /// Roster/mission bookkeeping after a cancellation that already
    /// cleared the courier slot inside the order row's critical section.
    pub fn restore_after_cancel(&self, order_id: OrderId, courier: PartyId) {
        self.roster.restore(courier);
        if let Err(err) = self.missions.cancel(order_id) {
            tracing::debug!(order_id = %order_id, %err, "no mission to cancel on release");
        }
        tracing::info!(order_id = %order_id, courier_id = %courier, "claim released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openescrow_types::{FulfillmentKind, MissionStatus, ProductId};
    use rust_decimal::Decimal;

    fn setup(fulfillment: FulfillmentKind) -> (Arc<OrderStore>, ClaimBroker, OrderId) {
        let store = Arc::new(OrderStore::new());
        let order = store.create_order(
            PartyId::new(),
            PartyId::new(),
            ProductId::new(),
            Decimal::new(2000, 2),
            fulfillment,
            None,
        );
        let broker = ClaimBroker::new(Arc::clone(&store));
        (store, broker, order.id)
    }

    #[test]
    fn winner_gets_six_digit_code_and_mission() {
        let (store, broker, order_id) = setup(FulfillmentKind::Delivery);
        let courier = PartyId::new();

        let receipt = broker.claim(order_id, courier).unwrap();
        assert_eq!(receipt.pickup_code.len(), 6);
        assert!(receipt.pickup_code.chars().all(|c| c.is_ascii_digit()));

        let row = store.get(order_id).unwrap();
        assert_eq!(row.courier_id, Some(courier));
        assert_eq!(row.pickup_code.as_deref(), Some(receipt.pickup_code.as_str()));

        let mission = broker.missions().get(order_id).unwrap();
        assert_eq!(mission.status, MissionStatus::Assigned);
        assert_eq!(mission.courier_id, courier);
        assert!(!broker.roster().is_available(courier));
    }

    #[test]
    fn second_claim_is_conflict_not_generic_failure() {
        let (_, broker, order_id) = setup(FulfillmentKind::Delivery);
        broker.claim(order_id, PartyId::new()).unwrap();

        let loser = PartyId::new();
        let err = broker.claim(order_id, loser).unwrap_err();
        assert!(matches!(err, OpenescrowError::ClaimConflict(id) if id == order_id));
        // The loser stays available for other missions.
        assert!(broker.roster().is_available(loser));
    }

    #[test]
    fn missing_order_is_not_found_not_conflict() {
        let store = Arc::new(OrderStore::new());
        let broker = ClaimBroker::new(store);
        let err = broker.claim(OrderId::new(), PartyId::new()).unwrap_err();
        assert!(matches!(err, OpenescrowError::OrderNotFound(_)));
    }

    #[test]
    fn pickup_orders_are_not_claimable() {
        let (_, broker, order_id) = setup(FulfillmentKind::Pickup);
        let err = broker.claim(order_id, PartyId::new()).unwrap_err();
        assert!(matches!(err, OpenescrowError::ClaimConflict(_)));
    }

    #[test]
    fn busy_courier_cannot_claim_again() {
        let (store, broker, order_id) = setup(FulfillmentKind::Delivery);
        let courier = PartyId::new();
        broker.claim(order_id, courier).unwrap();

        let other = store.create_order(
            PartyId::new(),
            PartyId::new(),
            ProductId::new(),
            Decimal::ONE,
            FulfillmentKind::Delivery,
            None,
        );
        let err = broker.claim(other.id, courier).unwrap_err();
        assert!(matches!(err, OpenescrowError::CourierUnavailable(_)));
    }

    #[test]
    fn release_clears_slot_and_restores_courier() {
        let (store, broker, order_id) = setup(FulfillmentKind::Delivery);
        let courier = PartyId::new();
        broker.claim(order_id, courier).unwrap();

        let order = broker.release(order_id).unwrap();
        assert!(order.courier_id.is_none());
        assert!(broker.roster().is_available(courier));
        assert_eq!(
            broker.missions().get(order_id).unwrap().status,
            MissionStatus::Cancelled
        );

        // The slot is claimable again after release.
        broker.claim(order_id, PartyId::new()).unwrap();
    }

    #[test]
    fn at_most_one_winner_under_contention() {
        // N concurrent claims with N distinct couriers: exactly one
        // success, N-1 conflicts, and the row holds the winner.
        let (store, broker, order_id) = setup(FulfillmentKind::Delivery);
        let broker = Arc::new(broker);
        let couriers: Vec<PartyId> = (0..16).map(|_| PartyId::new()).collect();

        let results: Vec<Result<ClaimReceipt>> = std::thread::scope(|s| {
            let handles: Vec<_> = couriers
                .iter()
                .map(|&courier| {
                    let broker = Arc::clone(&broker);
                    s.spawn(move || broker.claim(order_id, courier))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(OpenescrowError::ClaimConflict(_))))
            .count();
        assert_eq!(winners, 1);
        assert_eq!(conflicts, couriers.len() - 1);

        let row = store.get(order_id).unwrap();
        let winner_idx = results.iter().position(|r| r.is_ok()).unwrap();
        assert_eq!(row.courier_id, Some(couriers[winner_idx]));
    }

    #[test]
    fn numeric_code_shape() {
        for digits in [4, 6, 8] {
            let code = numeric_code(digits);
            assert_eq!(code.len(), digits);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
