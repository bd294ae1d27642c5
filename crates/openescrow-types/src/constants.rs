//! System-wide constants for the OpenEscrow engine.

/// Delivery-proof tokens expire this many hours after issuance.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Length of the human-verifiable pickup handshake code.
pub const PICKUP_CODE_DIGITS: usize = 6;

/// Length of the numeric release key used for scan-free completion.
pub const RELEASE_KEY_DIGITS: usize = 6;

/// Byte length of the process-wide token sealing secret.
pub const TOKEN_SECRET_LEN: usize = 32;

/// Bytes of the secret's SHA-256 digest prepended to each token, so a
/// token sealed under a rotated-out secret fails fast as WrongKey rather
/// than as generic garbage.
pub const TOKEN_KEY_FINGERPRINT_LEN: usize = 2;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenEscrow";
