// ABOUTME: Secure random token generation and client secret hashing
// ABOUTME: Uses the system CSPRNG with base64url encoding and SHA-256 digests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

//! Token and secret primitives shared by the OAuth modules.

use crate::errors::{AppError, AppResult};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Generate `num_bytes` of CSPRNG output encoded as unpadded base64url.
///
/// # Errors
/// Returns an internal error if the system RNG fails.
pub fn random_token(num_bytes: usize) -> AppResult<String> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; num_bytes];
    rng.fill(&mut bytes)
        .map_err(|_| AppError::internal("system RNG failure"))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Hash a client secret for storage (SHA-256, standard base64).
#[must_use]
pub fn hash_secret(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    STANDARD.encode(digest)
}

/// Compare a candidate secret against a stored hash in constant time.
#[must_use]
pub fn verify_secret(candidate: &str, stored_hash: &str) -> bool {
    let candidate_hash = hash_secret(candidate);
    candidate_hash
        .as_bytes()
        .ct_eq(stored_hash.as_bytes())
        .into()
}
