//! Boundary contracts for the external collaborators.
//!
//! Payment verification, identity resolution, and notification dispatch
//! are provided by external services; this core consumes them through
//! these traits and never trusts a client-supplied party identifier
//! without resolution. The `testing` module carries in-memory doubles
//! used by the test suites and by local development.

use std::sync::Mutex;

use openescrow_types::{AuthContext, OrderId, PartyId, Result};
use rust_decimal::Decimal;

/// What the payment provider reports for a provider-issued reference.
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    /// The order the reference was charged for.
    pub order_id: OrderId,
    pub paid: bool,
    pub amount_captured: Decimal,
}

/// Payment verification. `paid = false` is a hard rejection of the
/// payment-confirmation flow; a transport failure is
/// `ExternalDependency` and equally fatal — funds were not confirmed.
pub trait PaymentProvider: Send + Sync {
    fn confirm(&self, reference: &str) -> Result<PaymentConfirmation>;
}

/// Resolve a session identity into an internal party + role.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, session: &str) -> Result<AuthContext>;
}

/// Fire-and-forget notification on order completion. Failures are
/// logged by the caller, never propagated — completion must not block
/// on a messaging outage.
pub trait Notifier: Send + Sync {
    fn order_completed(&self, recipient: PartyId, order_id: OrderId) -> Result<()>;
}

/// In-memory doubles for the boundary collaborators.
pub mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    use openescrow_types::OpenescrowError;

    use super::*;

    /// Payment provider backed by a seeded reference table.
    #[derive(Debug, Default)]
    pub struct StubPaymentProvider {
        confirmations: Mutex<HashMap<String, PaymentConfirmation>>,
    }

    impl StubPaymentProvider {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a captured payment for `reference`.
        pub fn capture(&self, reference: &str, order_id: OrderId, amount: Decimal) {
            self.confirmations.lock().expect("stub lock poisoned").insert(
                reference.to_string(),
                PaymentConfirmation {
                    order_id,
                    paid: true,
                    amount_captured: amount,
                },
            );
        }

        /// Seed a declined payment for `reference`.
        pub fn decline(&self, reference: &str, order_id: OrderId) {
            self.confirmations.lock().expect("stub lock poisoned").insert(
                reference.to_string(),
                PaymentConfirmation {
                    order_id,
                    paid: false,
                    amount_captured: Decimal::ZERO,
                },
            );
        }
    }

    impl PaymentProvider for StubPaymentProvider {
        fn confirm(&self, reference: &str) -> Result<PaymentConfirmation> {
            self.confirmations
                .lock()
                .expect("stub lock poisoned")
                .get(reference)
                .cloned()
                .ok_or_else(|| OpenescrowError::ExternalDependency {
                    service: "payments".into(),
                    reason: format!("unknown reference {reference}"),
                })
        }
    }

    /// Identity resolver backed by a seeded session table.
    #[derive(Debug, Default)]
    pub struct StubIdentityResolver {
        sessions: Mutex<HashMap<String, AuthContext>>,
    }

    impl StubIdentityResolver {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        pub fn grant(&self, session: &str, ctx: AuthContext) {
            self.sessions
                .lock()
                .expect("stub lock poisoned")
                .insert(session.to_string(), ctx);
        }
    }

    impl IdentityResolver for StubIdentityResolver {
        fn resolve(&self, session: &str) -> Result<AuthContext> {
            self.sessions
                .lock()
                .expect("stub lock poisoned")
                .get(session)
                .copied()
                .ok_or_else(|| OpenescrowError::Forbidden {
                    reason: "unresolved session".into(),
                })
        }
    }

    /// Notifier that records deliveries and can be told to fail.
    #[derive(Debug, Default)]
    pub struct StubNotifier {
        sent: Mutex<Vec<(PartyId, OrderId)>>,
        failing: AtomicBool,
    }

    impl StubNotifier {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        #[must_use]
        pub fn sent(&self) -> Vec<(PartyId, OrderId)> {
            self.sent.lock().expect("stub lock poisoned").clone()
        }
    }

    impl Notifier for StubNotifier {
        fn order_completed(&self, recipient: PartyId, order_id: OrderId) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(OpenescrowError::ExternalDependency {
                    service: "notifications".into(),
                    reason: "dispatch unavailable".into(),
                });
            }
            self.sent
                .lock()
                .expect("stub lock poisoned")
                .push((recipient, order_id));
            Ok(())
        }
    }
}
