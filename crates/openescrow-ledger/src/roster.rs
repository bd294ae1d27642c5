//! Courier availability flags.
//!
//! The roster is one of the three pieces of shared mutable state in the
//! engine. Flags are flipped only by the claim broker: a won claim
//! reserves the courier, a release restores them. Couriers the roster has
//! never seen are treated as available — the identity collaborator has
//! already vouched for their role before a claim reaches this layer.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use openescrow_types::PartyId;

/// Per-courier availability, reserved and restored atomically.
#[derive(Debug, Default)]
pub struct CourierRoster {
    flags: Mutex<HashMap<PartyId, bool>>,
}

impl CourierRoster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn flags(&self) -> MutexGuard<'_, HashMap<PartyId, bool>> {
        self.flags.lock().expect("courier roster lock poisoned")
    }

    /// Register a courier as available.
    pub fn register(&self, courier: PartyId) {
        self.flags().insert(courier, true);
    }

    /// Atomically reserve the courier if they are available. Returns
    /// `false` if they already hold a mission.
    pub fn try_reserve(&self, courier: PartyId) -> bool {
        let mut flags = self.flags();
        let available = flags.entry(courier).or_insert(true);
        if *available {
            *available = false;
            true
        } else {
            false
        }
    }

    /// Restore a courier's availability after release or completion.
    pub fn restore(&self, courier: PartyId) {
        self.flags().insert(courier, true);
    }

    #[must_use]
    pub fn is_available(&self, courier: PartyId) -> bool {
        self.flags().get(&courier).copied().unwrap_or(true)
    }
}
