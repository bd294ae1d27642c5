//! Mission log — lazily-created courier work units.
//!
//! One mission per delivery order, created on first claim or
//! self-delivery. Transitions mirror the order machine's courier-facing
//! subset and are guarded the same way: precondition checked and mutation
//! applied in one critical section.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use openescrow_types::{Mission, MissionStatus, OpenescrowError, OrderId, PartyId, Result};

/// Tracks the single mission attached to each claimed delivery order.
#[derive(Debug, Default)]
pub struct MissionLog {
    missions: Mutex<HashMap<OrderId, Mission>>,
}

impl MissionLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn missions(&self) -> MutexGuard<'_, HashMap<OrderId, Mission>> {
        self.missions.lock().expect("mission log lock poisoned")
    }

    /// Create the mission for a freshly-won claim (or self-delivery).
    /// Idempotent on the order: a mission that already exists is returned
    /// as-is.
    pub fn assign(&self, order_id: OrderId, courier_id: PartyId) -> Mission {
        self.missions()
            .entry(order_id)
            .or_insert_with(|| Mission::assigned(order_id, courier_id))
            .clone()
    }

    pub fn get(&self, order_id: OrderId) -> Result<Mission> {
        self.missions()
            .get(&order_id)
            .cloned()
            .ok_or(OpenescrowError::MissionNotFound(order_id))
    }

    /// `Assigned → PickedUp`.
    pub fn mark_picked_up(&self, order_id: OrderId) -> Result<Mission> {
        self.transition(order_id, MissionStatus::PickedUp)
    }

    /// `PickedUp → Delivered`.
    pub fn mark_delivered(&self, order_id: OrderId) -> Result<Mission> {
        self.transition(order_id, MissionStatus::Delivered)
    }

    /// Cancel from either non-terminal state.
    pub fn cancel(&self, order_id: OrderId) -> Result<Mission> {
        self.transition(order_id, MissionStatus::Cancelled)
    }

    fn transition(&self, order_id: OrderId, target: MissionStatus) -> Result<Mission> {
        let mut missions = self.missions();
        let mission = missions
            .get_mut(&order_id)
            .ok_or(OpenescrowError::MissionNotFound(order_id))?;

        if !mission.status.can_transition_to(target) {
            return Err(OpenescrowError::InvalidMissionState {
                order_id,
                current: mission.status,
            });
        }
        mission.status = target;
        Ok(mission.clone())
    }
}
