//! # openescrow-token
//!
//! **Token Codec**: mints and verifies the delivery-proof capsule — an
//! opaque, time-limited bearer string binding an order's identity,
//! amount, and counterparties to an issuance timestamp.
//!
//! ## Design
//!
//! The capsule is the plaintext [`ProofPayload`] sealed with
//! ChaCha20-Poly1305 under a process-wide secret, so it can be verified
//! **offline** — printed or displayed as a QR code and scanned by either
//! counterpart — without a server-side nonce store or revocation list.
//! Authenticated encryption plus the 24-hour timestamp expiry gives
//! bounded-lifetime capability semantics.
//!
//! Verification is a pure function: no state is read. Callers must still
//! compare the bearer string against the order's stored current token to
//! reject stale re-mints and tokens replayed against a different order.
//!
//! [`ProofPayload`]: openescrow_types::ProofPayload

pub mod codec;

pub use codec::TokenCodec;
