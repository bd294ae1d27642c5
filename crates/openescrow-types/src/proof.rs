//! Delivery-proof payload for the OpenEscrow token codec.
//!
//! The payload binds the order identity, the financial amount, and both
//! counterparties to an issuance timestamp. Sealed into an opaque bearer
//! string by `openescrow-token`, it proves "this delivery was authorized
//! for this amount, these parties, at this time" without a database
//! round-trip — the capsule must verify offline (printed or displayed as
//! a QR code and scanned by either counterpart).

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{constants, OrderId, PartyId};

/// The plaintext inside a delivery-proof token.
///
/// Not stored separately from the order — the sealed form is cached on
/// the order row, and the stored value is the only one honoured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofPayload {
    /// The order this proof completes.
    pub order_id: OrderId,
    /// Amount held in escrow at mint time.
    pub amount: Decimal,
    pub seller_id: PartyId,
    pub buyer_id: PartyId,
    /// When the token was minted. Expiry is checked against this at
    /// verification time, not enforced by storage.
    pub issued_at: DateTime<Utc>,
}

impl ProofPayload {
    #[must_use]
    pub fn new(order_id: OrderId, amount: Decimal, seller_id: PartyId, buyer_id: PartyId) -> Self {
        Self {
            order_id,
            amount,
            seller_id,
            buyer_id,
            issued_at: Utc::now(),
        }
    }

    /// The instant this payload stops verifying.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::hours(constants::TOKEN_TTL_HOURS)
    }

    /// Has this payload expired as of `now`?
    ///
    /// Takes an explicit clock so expiry boundaries are testable without
    /// sleeping.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl ProofPayload {
    /// A payload with a controllable issuance timestamp.
    pub fn dummy_issued_at(issued_at: DateTime<Utc>) -> Self {
        Self {
            order_id: OrderId::new(),
            amount: Decimal::new(2000, 2),
            seller_id: PartyId::new(),
            buyer_id: PartyId::new(),
            issued_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_payload_not_expired() {
        let p = ProofPayload::new(
            OrderId::new(),
            Decimal::new(2000, 2),
            PartyId::new(),
            PartyId::new(),
        );
        assert!(!p.is_expired_at(Utc::now()));
    }

    #[test]
    fn expiry_boundary() {
        let minted = Utc::now();
        let p = ProofPayload::dummy_issued_at(minted);

        // One minute before the 24-hour mark: still valid.
        let just_before = minted + Duration::hours(24) - Duration::minutes(1);
        assert!(!p.is_expired_at(just_before));

        // One minute after: expired.
        let just_after = minted + Duration::hours(24) + Duration::minutes(1);
        assert!(p.is_expired_at(just_after));
    }

    #[test]
    fn expires_at_is_ttl_after_issuance() {
        let minted = Utc::now();
        let p = ProofPayload::dummy_issued_at(minted);
        assert_eq!(p.expires_at(), minted + Duration::hours(24));
    }

    #[test]
    fn serde_roundtrip() {
        let p = ProofPayload::new(
            OrderId::new(),
            Decimal::new(12345, 2),
            PartyId::new(),
            PartyId::new(),
        );
        let json = serde_json::to_string(&p).unwrap();
        let back: ProofPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
