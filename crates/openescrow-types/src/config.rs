//! Configuration types for the OpenEscrow coordinator.

use serde::{Deserialize, Serialize};

use crate::constants;

/// What checkout does when a flash-sale reservation is rejected because
/// the campaign stock ran out between quoting and reserving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashSalePolicy {
    /// Degrade to the undiscounted price and proceed.
    FallbackToBasePrice,
    /// Fail the checkout with `StockExhausted`.
    RejectOrder,
}

/// Coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowConfig {
    /// Delivery-proof token lifetime in hours.
    pub token_ttl_hours: i64,
    /// Flash-sale contention policy at checkout.
    pub flash_sale_policy: FlashSalePolicy,
    /// Digits in the pickup handshake code.
    pub pickup_code_digits: usize,
    /// Digits in the scan-free release key.
    pub release_key_digits: usize,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: constants::TOKEN_TTL_HOURS,
            flash_sale_policy: FlashSalePolicy::FallbackToBasePrice,
            pickup_code_digits: constants::PICKUP_CODE_DIGITS,
            release_key_digits: constants::RELEASE_KEY_DIGITS,
        }
    }
}
