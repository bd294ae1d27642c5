//! Error types for the OpenEscrow engine.
//!
//! All errors use the `OE_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order / state errors
//! - 2xx: Escrow / payment errors
//! - 3xx: Delivery-proof token errors
//! - 4xx: Claim / mission errors
//! - 5xx: Inventory / campaign errors
//! - 6xx: Authorization errors
//! - 7xx: External collaborator errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{CampaignId, EscrowStatus, MissionStatus, OrderId, OrderStatus, PartyId, ProductId};

/// Central error enum for all OpenEscrow operations.
#[derive(Debug, Error)]
pub enum OpenescrowError {
    // =================================================================
    // Order / State Errors (1xx)
    // =================================================================
    /// The referenced order does not exist.
    #[error("OE_ERR_100: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The referenced product does not exist.
    #[error("OE_ERR_101: Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The requested transition is not legal from the order's current status.
    /// Always carries the actual state so callers can tell "already processed"
    /// from "broken".
    #[error("OE_ERR_102: Invalid order state for {order_id}: currently {current}")]
    InvalidOrderState {
        order_id: OrderId,
        current: OrderStatus,
    },

    /// The requested transition is not legal from the order's current
    /// escrow status.
    #[error("OE_ERR_103: Invalid escrow state for {order_id}: currently {current}")]
    InvalidEscrowState {
        order_id: OrderId,
        current: EscrowStatus,
    },

    /// The request failed shape validation before touching storage.
    #[error("OE_ERR_104: Invalid request: {reason}")]
    InvalidRequest { reason: String },

    // =================================================================
    // Escrow / Payment Errors (2xx)
    // =================================================================
    /// The payment provider reported the reference as unpaid.
    /// Fatal to the payment-confirmation flow.
    #[error("OE_ERR_200: Payment rejected by provider for reference {reference}")]
    PaymentRejected { reference: String },

    /// Escrow conservation invariant violated — critical safety alert.
    #[error("OE_ERR_201: Escrow imbalance: {reason}")]
    EscrowImbalance { reason: String },

    // =================================================================
    // Delivery-Proof Token Errors (3xx)
    // =================================================================
    /// The token could not be decoded (bad encoding, truncated, or
    /// structurally invalid after decryption).
    #[error("OE_ERR_300: Delivery proof token is malformed")]
    TokenMalformed,

    /// The token was minted more than the TTL ago.
    #[error("OE_ERR_301: Delivery proof token has expired")]
    TokenExpired,

    /// The token decrypted but does not match the order's stored current
    /// token (stale re-mint or replay against a different order).
    #[error("OE_ERR_302: Delivery proof token does not match order {order_id}")]
    TokenMismatch { order_id: OrderId },

    /// The token was sealed under a different process secret.
    #[error("OE_ERR_303: Delivery proof token sealed under an unknown key")]
    TokenWrongKey,

    // =================================================================
    // Claim / Mission Errors (4xx)
    // =================================================================
    /// The claim lost a race — another courier got there first. Expected
    /// and frequent; distinct from [`Self::OrderNotFound`] so the UI can
    /// say "too slow, already taken".
    #[error("OE_ERR_400: Claim conflict: order {0} is already assigned")]
    ClaimConflict(OrderId),

    /// The courier is not available for new missions.
    #[error("OE_ERR_401: Courier {0} is not available")]
    CourierUnavailable(PartyId),

    /// No mission exists for the given order.
    #[error("OE_ERR_402: Mission not found for order {0}")]
    MissionNotFound(OrderId),

    /// The requested transition is not legal from the mission's current
    /// status.
    #[error("OE_ERR_403: Invalid mission state for order {order_id}: currently {current}")]
    InvalidMissionState {
        order_id: OrderId,
        current: MissionStatus,
    },

    // =================================================================
    // Inventory / Campaign Errors (5xx)
    // =================================================================
    /// The referenced campaign does not exist.
    #[error("OE_ERR_500: Campaign not found: {0}")]
    CampaignNotFound(CampaignId),

    /// The conditional stock increment was rejected — the campaign limit
    /// would be exceeded.
    #[error("OE_ERR_501: Campaign {campaign_id} stock exhausted")]
    StockExhausted { campaign_id: CampaignId },

    /// The campaign exists but is inactive or outside its time window.
    #[error("OE_ERR_502: Campaign {0} is not live")]
    CampaignNotLive(CampaignId),

    // =================================================================
    // Authorization Errors (6xx)
    // =================================================================
    /// Caller is not a party authorized to act on this order.
    #[error("OE_ERR_600: Forbidden: {reason}")]
    Forbidden { reason: String },

    // =================================================================
    // External Collaborator Errors (7xx)
    // =================================================================
    /// A call to an external collaborator (payment provider, identity
    /// lookup, notification dispatch) failed.
    #[error("OE_ERR_700: External dependency {service} failed: {reason}")]
    ExternalDependency { service: String, reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OE_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("OE_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config, missing fields, etc.).
    #[error("OE_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Coarse classification used by boundary layers to branch on the *kind*
/// of failure, not on a message string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transition not legal from the current state. Surfaced, never retried.
    InvalidState,
    /// Lost a race for a contended resource. Expected, frequent, retryable
    /// by a *different* caller — never presented as a bug.
    Conflict,
    /// Caller is not authorized for this order.
    Forbidden,
    /// Referenced entity does not exist.
    NotFound,
    /// An external collaborator failed.
    ExternalDependency,
    /// Everything else. Must not be misreported as `InvalidState`.
    Internal,
}

impl OpenescrowError {
    /// Classify this error for boundary branching.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OrderNotFound(_)
            | Self::ProductNotFound(_)
            | Self::CampaignNotFound(_)
            | Self::MissionNotFound(_) => ErrorKind::NotFound,

            Self::InvalidOrderState { .. }
            | Self::InvalidEscrowState { .. }
            | Self::InvalidMissionState { .. }
            | Self::InvalidRequest { .. }
            | Self::PaymentRejected { .. }
            | Self::TokenMalformed
            | Self::TokenExpired
            | Self::TokenMismatch { .. }
            | Self::TokenWrongKey
            | Self::CampaignNotLive(_) => ErrorKind::InvalidState,

            Self::ClaimConflict(_) | Self::CourierUnavailable(_) | Self::StockExhausted { .. } => {
                ErrorKind::Conflict
            }

            Self::Forbidden { .. } => ErrorKind::Forbidden,

            Self::ExternalDependency { .. } => ErrorKind::ExternalDependency,

            Self::EscrowImbalance { .. }
            | Self::Internal(_)
            | Self::Serialization(_)
            | Self::Configuration(_) => ErrorKind::Internal,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OpenescrowError>;
