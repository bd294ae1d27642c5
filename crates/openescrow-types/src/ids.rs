//! Globally unique identifiers used throughout OpenEscrow.
//!
//! All entity IDs use UUIDv7 for time-ordered lexicographic sorting,
//! except `MissionId` which is derived deterministically from the order
//! it belongs to (one mission per delivery order).

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Globally unique order identifier. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Extract the embedded timestamp (milliseconds since UNIX epoch) from UUIDv7.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        let bytes = self.0.as_bytes();
        u64::from_be_bytes([
            0, 0, bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5],
        ])
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// PartyId
// ---------------------------------------------------------------------------

/// Unique identifier for a transaction party (buyer, seller, or courier).
///
/// The same party model covers all three roles — what a party may do on a
/// given order is decided by [`crate::AuthContext`], never by the ID shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PartyId(pub Uuid);

impl PartyId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for PartyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ProductId
// ---------------------------------------------------------------------------

/// Unique identifier for a sellable product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ProductId(pub Uuid);

impl ProductId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "product:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// CampaignId
// ---------------------------------------------------------------------------

/// Unique identifier for a time-boxed discount campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CampaignId(pub Uuid);

impl CampaignId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for CampaignId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "campaign:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// MissionId
// ---------------------------------------------------------------------------

/// Unique identifier for a delivery mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct MissionId(pub Uuid);

impl MissionId {
    /// Deterministic `MissionId` for a given order.
    ///
    /// There is exactly one mission per delivery order, so the mission ID
    /// is a pure function of the order ID — a lazily-created mission gets
    /// the same identity no matter which claim attempt created it.
    #[must_use]
    pub fn for_order(order_id: OrderId) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"openescrow:mission_id:v1:");
        hasher.update(order_id.0.as_bytes());
        let hash = hasher.finalize();
        let bytes: [u8; 16] = hash[..16].try_into().expect("SHA-256 produces 32 bytes");
        Self(Uuid::from_bytes(bytes))
    }
}

impl fmt::Display for MissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mission:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
