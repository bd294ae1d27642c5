//! Explicit authorization context.
//!
//! Every coordinator entry point takes an `AuthContext` describing who is
//! acting and in what role. There is no ambient or thread-local identity
//! state anywhere in the engine — impersonation by an admin is an explicit
//! flag on the context, resolved at the boundary by the identity
//! collaborator.

use serde::{Deserialize, Serialize};

use crate::{Order, PartyId};

/// The role a caller acts under for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Buyer,
    Seller,
    Courier,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buyer => write!(f, "BUYER"),
            Self::Seller => write!(f, "SELLER"),
            Self::Courier => write!(f, "COURIER"),
            Self::Admin => write!(f, "ADMIN"),
        }
    }
}

/// Who is acting, in what role, and whether an admin is impersonating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// The resolved internal party identifier. Never a client-supplied
    /// value — the identity collaborator resolves it from the session.
    pub acting_party: PartyId,
    pub role: Role,
    pub is_impersonating: bool,
}

impl AuthContext {
    #[must_use]
    pub fn new(acting_party: PartyId, role: Role) -> Self {
        Self {
            acting_party,
            role,
            is_impersonating: false,
        }
    }

    #[must_use]
    pub fn buyer(party: PartyId) -> Self {
        Self::new(party, Role::Buyer)
    }

    #[must_use]
    pub fn seller(party: PartyId) -> Self {
        Self::new(party, Role::Seller)
    }

    #[must_use]
    pub fn courier(party: PartyId) -> Self {
        Self::new(party, Role::Courier)
    }

    #[must_use]
    pub fn admin(party: PartyId) -> Self {
        Self::new(party, Role::Admin)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Cancellation is allowed for the order's buyer and for admins.
    #[must_use]
    pub fn may_cancel(&self, order: &Order) -> bool {
        self.is_admin() || order.buyer_id == self.acting_party
    }

    /// Delivery proof may be submitted by either counterpart on the order.
    #[must_use]
    pub fn is_counterpart_on(&self, order: &Order) -> bool {
        order.is_counterpart(self.acting_party)
    }

    /// Seller-only operations (mark ready, release-key completion).
    #[must_use]
    pub fn is_seller_on(&self, order: &Order) -> bool {
        order.seller_id == self.acting_party
    }
}
