//! # openescrow-types
//!
//! Shared types, errors, and configuration for the **OpenEscrow** order
//! lifecycle engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`PartyId`], [`ProductId`], [`CampaignId`], [`MissionId`]
//! - **Order model**: [`Order`], [`OrderStatus`], [`EscrowStatus`], [`FulfillmentKind`]
//! - **Delivery proof**: [`ProofPayload`]
//! - **Campaign model**: [`DiscountCampaign`]
//! - **Mission model**: [`Mission`], [`MissionStatus`]
//! - **Authorization**: [`AuthContext`], [`Role`]
//! - **Configuration**: [`EscrowConfig`], [`FlashSalePolicy`]
//! - **Errors**: [`OpenescrowError`] with `OE_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod auth;
pub mod campaign;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod mission;
pub mod order;
pub mod proof;

// Re-export all primary types at crate root for ergonomic imports:
//   use openescrow_types::{Order, OrderStatus, EscrowStatus, ...};

pub use auth::*;
pub use campaign::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use mission::*;
pub use order::*;
pub use proof::*;

// Constants are accessed via `openescrow_types::constants::FOO`
// (not re-exported to avoid name collisions).
