//! Seal and open delivery-proof capsules.
//!
//! Wire layout of a token, before base64url encoding:
//!
//! ```text
//! ┌─────────────┬──────────────┬──────────────────────────┐
//! │ key fp (2B) │ nonce (12B)  │ ciphertext ‖ Poly1305 tag │
//! └─────────────┴──────────────┴──────────────────────────┘
//! ```
//!
//! The key fingerprint is the first two bytes of SHA-256 over the sealing
//! secret. It lets a token sealed under a rotated-out secret fail as
//! `TokenWrongKey` instead of generic garbage.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use ring::aead::{Aad, CHACHA20_POLY1305, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use openescrow_types::constants::{TOKEN_KEY_FINGERPRINT_LEN, TOKEN_SECRET_LEN};
use openescrow_types::{OpenescrowError, OrderId, PartyId, ProofPayload, Result};

/// Mints and verifies delivery-proof tokens under one process-wide secret.
pub struct TokenCodec {
    key: LessSafeKey,
    fingerprint: [u8; TOKEN_KEY_FINGERPRINT_LEN],
    rng: SystemRandom,
}

impl TokenCodec {
    /// Create a codec from the process-wide sealing secret.
    ///
    /// # Errors
    /// Returns `Configuration` if the secret cannot back a
    /// ChaCha20-Poly1305 key.
    pub fn new(secret: &[u8; TOKEN_SECRET_LEN]) -> Result<Self> {
        let unbound = UnboundKey::new(&CHACHA20_POLY1305, secret).map_err(|_| {
            OpenescrowError::Configuration("token secret rejected by AEAD backend".into())
        })?;

        let digest = Sha256::digest(secret);
        let mut fingerprint = [0u8; TOKEN_KEY_FINGERPRINT_LEN];
        fingerprint.copy_from_slice(&digest[..TOKEN_KEY_FINGERPRINT_LEN]);

        Ok(Self {
            key: LessSafeKey::new(unbound),
            fingerprint,
            rng: SystemRandom::new(),
        })
    }

    /// Mint a fresh token for an order.
    ///
    /// Re-minting for the same order produces a different token each call
    /// (fresh nonce and timestamp); the caller stores only the newest one
    /// and the old token is thereby superseded.
    ///
    /// # Errors
    /// Returns `Serialization` or `Internal` if sealing fails.
    pub fn mint(
        &self,
        order_id: OrderId,
        amount: Decimal,
        seller_id: PartyId,
        buyer_id: PartyId,
    ) -> Result<String> {
        self.seal(&ProofPayload::new(order_id, amount, seller_id, buyer_id))
    }

    /// Seal an explicit payload. `mint` is the usual entry point; this
    /// exists so expiry boundaries can be exercised with a controlled
    /// `issued_at`.
    pub fn seal(&self, payload: &ProofPayload) -> Result<String> {
        let mut in_out = serde_json::to_vec(payload)
            .map_err(|e| OpenescrowError::Serialization(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| OpenescrowError::Internal("nonce generation failed".into()))?;

        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| OpenescrowError::Internal("AEAD seal failed".into()))?;

        let mut raw = Vec::with_capacity(TOKEN_KEY_FINGERPRINT_LEN + NONCE_LEN + in_out.len());
        raw.extend_from_slice(&self.fingerprint);
        raw.extend_from_slice(&nonce_bytes);
        raw.extend_from_slice(&in_out);

        Ok(URL_SAFE_NO_PAD.encode(raw))
    }

    /// Decode a token with detailed faults, checking expiry against the
    /// given clock. Pure function — no state is read.
    ///
    /// # Errors
    /// - `TokenMalformed` — bad encoding, truncation, failed tag, or
    ///   structurally invalid plaintext
    /// - `TokenWrongKey` — sealed under a different process secret
    /// - `TokenExpired` — issued more than the TTL before `now`
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<ProofPayload> {
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| OpenescrowError::TokenMalformed)?;

        let min_len = TOKEN_KEY_FINGERPRINT_LEN + NONCE_LEN + CHACHA20_POLY1305.tag_len();
        if raw.len() < min_len {
            return Err(OpenescrowError::TokenMalformed);
        }

        let (fingerprint, rest) = raw.split_at(TOKEN_KEY_FINGERPRINT_LEN);
        if fingerprint != self.fingerprint {
            return Err(OpenescrowError::TokenWrongKey);
        }

        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| OpenescrowError::TokenMalformed)?;

        let mut in_out = ciphertext.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| OpenescrowError::TokenMalformed)?;

        let payload: ProofPayload =
            serde_json::from_slice(plaintext).map_err(|_| OpenescrowError::TokenMalformed)?;

        if payload.is_expired_at(now) {
            return Err(OpenescrowError::TokenExpired);
        }

        Ok(payload)
    }

    /// Verify a token against the current clock.
    ///
    /// Returns `None` (not an error) on malformed ciphertext, structural
    /// mismatch, or expiry. Only the `Some`/`None` result is load-bearing
    /// for the caller's authorization decision.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<ProofPayload> {
        self.verify_at(token, Utc::now())
    }

    /// Verify against an explicit clock.
    #[must_use]
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Option<ProofPayload> {
        self.decode(token, now).ok()
    }
}
