//! # openescrow-coordinator
//!
//! **Orchestration plane**: the only component that sequences the token
//! codec, the order store, the claim broker, and the inventory ledger
//! into the user-facing flows.
//!
//! ## Flows
//!
//! 1. **Checkout**: quote → reserve discounted stock → create order with
//!    the frozen price
//! 2. **Payment confirmation**: provider check → mint proof token →
//!    `mark_paid` (idempotent on duplicate webhooks)
//! 3. **Delivery proof**: token-scan path or seller release-key path,
//!    both converging on a single escrow release
//! 4. **Cancellation**: authorized cancel, refund when held, claim
//!    released as part of the same logical operation
//! 5. **Reconciliation**: escrow conservation sweep over every row
//!
//! The coordinator owns no invariants of its own — it delegates to the
//! owning components and guarantees that a failed step never leaves
//! partial financial state behind.

pub mod catalog;
pub mod checkout;
pub mod coordinator;
pub mod delivery;
pub mod external;
pub mod gateway;
pub mod payment;
pub mod reconcile;

pub use catalog::{Product, ProductCatalog};
pub use coordinator::EscrowCoordinator;
pub use external::{IdentityResolver, Notifier, PaymentConfirmation, PaymentProvider};
pub use gateway::Gateway;
pub use reconcile::{EscrowReconciler, ReconcileReport};
