//! Mission — the courier-facing view of a delivery order.
//!
//! One mission per delivery order, created lazily on first claim or
//! self-delivery. Its status mirrors the subset of the order machine the
//! courier cares about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MissionId, OrderId, PartyId};

/// Lifecycle state of a mission.
///
/// Transitions are monotonic: `Assigned → PickedUp → Delivered`, with
/// `Cancelled` reachable from the two non-terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissionStatus {
    Assigned,
    PickedUp,
    Delivered,
    Cancelled,
}

impl MissionStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Can this mission status transition to the given target?
    ///
    /// `Assigned → Delivered` is legal: a proof scan completes the order
    /// even when the pickup handoff was never recorded separately.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Assigned, Self::PickedUp | Self::Delivered | Self::Cancelled)
                | (Self::PickedUp, Self::Delivered | Self::Cancelled)
        )
    }
}

impl std::fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assigned => write!(f, "ASSIGNED"),
            Self::PickedUp => write!(f, "PICKED_UP"),
            Self::Delivered => write!(f, "DELIVERED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// One unit of delivery work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    pub order_id: OrderId,
    pub courier_id: PartyId,
    pub status: MissionStatus,
    pub assigned_at: DateTime<Utc>,
}

impl Mission {
    /// A freshly assigned mission for the claim winner.
    #[must_use]
    pub fn assigned(order_id: OrderId, courier_id: PartyId) -> Self {
        Self {
            id: MissionId::for_order(order_id),
            order_id,
            courier_id,
            status: MissionStatus::Assigned,
            assigned_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions() {
        assert!(MissionStatus::Assigned.can_transition_to(MissionStatus::PickedUp));
        assert!(MissionStatus::PickedUp.can_transition_to(MissionStatus::Delivered));
    }

    #[test]
    fn cancellation_from_non_terminal() {
        assert!(MissionStatus::Assigned.can_transition_to(MissionStatus::Cancelled));
        assert!(MissionStatus::PickedUp.can_transition_to(MissionStatus::Cancelled));
        assert!(!MissionStatus::Delivered.can_transition_to(MissionStatus::Cancelled));
        assert!(!MissionStatus::Cancelled.can_transition_to(MissionStatus::Assigned));
    }

    #[test]
    fn scan_completion_skips_pickup() {
        assert!(MissionStatus::Assigned.can_transition_to(MissionStatus::Delivered));
    }

    #[test]
    fn mission_id_stable_for_order() {
        let order_id = OrderId::new();
        let a = Mission::assigned(order_id, PartyId::new());
        let b = Mission::assigned(order_id, PartyId::new());
        assert_eq!(a.id, b.id);
    }
}
