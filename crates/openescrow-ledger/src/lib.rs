//! # openescrow-ledger
//!
//! **Storage plane**: every piece of shared mutable state in the engine,
//! mutated only through atomic conditional operations.
//!
//! ## Architecture
//!
//! 1. **OrderStore**: authoritative order rows with compare-and-swap
//!    transitions — no transition ever silently overwrites a concurrent one
//! 2. **ClaimBroker**: assigns exactly one courier per delivery order;
//!    losers get an explicit conflict, never a silent overwrite
//! 3. **InventoryLedger**: campaign stock as a single conditional
//!    increment — `stock_consumed` can never exceed the limit
//! 4. **CourierRoster**: per-courier availability flags
//! 5. **MissionLog**: lazily-created courier work units
//!
//! ## Concurrency model
//!
//! Each public operation is one atomic critical section against one row —
//! the in-memory analogue of a single-statement conditional `UPDATE`.
//! Correctness never depends on in-process lock ordering across
//! components, because no lock is held across a call into another
//! component. Read-modify-write across operation boundaries is how races
//! get reintroduced; it is deliberately impossible through this API.

pub mod claim;
pub mod inventory;
pub mod mission;
pub mod order_store;
pub mod roster;

pub use claim::{ClaimBroker, ClaimReceipt};
pub use inventory::{InventoryLedger, Quote};
pub use mission::MissionLog;
pub use order_store::{CancelOutcome, OrderStore};
pub use roster::CourierRoster;
