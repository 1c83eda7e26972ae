// ABOUTME: PKCE S256 verification per RFC 7636
// ABOUTME: Validates verifier format and compares challenges in constant time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

//! PKCE (RFC 7636) verification. Only the `S256` method is supported;
//! `plain` is rejected at the authorization endpoint and never reaches
//! this module.

use crate::crypto;
use crate::errors::{AppError, AppResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// 256 bits of entropy encode to exactly 43 base64url characters
const VERIFIER_ENTROPY_BYTES: usize = 32;

/// Why a verifier was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PkceFailure {
    /// Verifier is shorter than 43 or longer than 128 characters
    BadLength,
    /// Verifier contains characters outside the unreserved set
    BadCharset,
    /// Computed challenge does not match the stored one
    Mismatch,
}

impl PkceFailure {
    /// Human-readable description for OAuth error responses
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::BadLength => "code_verifier must be 43-128 characters",
            Self::BadCharset => "code_verifier contains invalid characters",
            Self::Mismatch => "PKCE verification failed",
        }
    }
}

/// Generate a fresh code verifier from 256 bits of entropy.
///
/// The base64url encoding stays within the unreserved character set, so
/// the result always satisfies [`verify_s256`]'s format checks.
///
/// # Errors
/// Fails when the random source fails or the encoded verifier falls
/// outside the RFC 7636 length bounds.
pub fn new_verifier() -> AppResult<String> {
    let mut verifier = crypto::random_token(VERIFIER_ENTROPY_BYTES)?;
    if verifier.len() > 128 {
        verifier.truncate(128);
    }
    if verifier.len() < 43 {
        return Err(AppError::internal("generated code verifier is too short"));
    }
    Ok(verifier)
}

/// Compute the S256 challenge for a verifier.
#[must_use]
pub fn challenge_s256(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Verify a code verifier against a stored S256 challenge.
///
/// Format checks come first per RFC 7636 section 4.1; the challenge
/// comparison itself is constant-time.
///
/// # Errors
/// Returns the specific [`PkceFailure`] so callers can log it; clients
/// only ever see a generic `invalid_grant`.
pub fn verify_s256(verifier: &str, stored_challenge: &str) -> Result<(), PkceFailure> {
    if verifier.len() < 43 || verifier.len() > 128 {
        return Err(PkceFailure::BadLength);
    }
    let unreserved = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~');
    if !verifier.chars().all(unreserved) {
        return Err(PkceFailure::BadCharset);
    }

    let computed = challenge_s256(verifier);
    let matches: bool = computed
        .as_bytes()
        .ct_eq(stored_challenge.as_bytes())
        .into();
    if matches {
        Ok(())
    } else {
        Err(PkceFailure::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    // RFC 7636 appendix B test vector
    const RFC_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    const RFC_CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    #[test]
    fn rfc7636_vector_verifies() {
        assert_eq!(challenge_s256(RFC_VERIFIER), RFC_CHALLENGE);
        verify_s256(RFC_VERIFIER, RFC_CHALLENGE).unwrap();
    }

    #[test]
    fn wrong_verifier_is_a_mismatch() {
        let other = "a".repeat(43);
        assert_eq!(
            verify_s256(&other, RFC_CHALLENGE),
            Err(PkceFailure::Mismatch)
        );
    }

    #[test]
    fn short_and_long_verifiers_rejected() {
        assert_eq!(
            verify_s256("too-short", RFC_CHALLENGE),
            Err(PkceFailure::BadLength)
        );
        let long = "a".repeat(129);
        assert_eq!(
            verify_s256(&long, RFC_CHALLENGE),
            Err(PkceFailure::BadLength)
        );
    }

    #[test]
    fn invalid_characters_rejected() {
        let bad = format!("{}!", "a".repeat(43));
        assert_eq!(
            verify_s256(&bad, RFC_CHALLENGE),
            Err(PkceFailure::BadCharset)
        );
    }

    #[test]
    fn generated_verifiers_satisfy_the_format_and_verify() {
        let first = new_verifier().unwrap();
        let second = new_verifier().unwrap();
        assert_eq!(first.len(), 43);
        assert_ne!(first, second);
        verify_s256(&first, &challenge_s256(&first)).unwrap();
    }

    #[test]
    fn boundary_lengths_accepted() {
        let v43 = "a".repeat(43);
        let v128 = "a".repeat(128);
        let c43 = challenge_s256(&v43);
        let c128 = challenge_s256(&v128);
        verify_s256(&v43, &c43).unwrap();
        verify_s256(&v128, &c128).unwrap();
    }
}
