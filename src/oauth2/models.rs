// ABOUTME: OAuth 2.0 wire and domain types for registration, authorization and token exchange
// ABOUTME: Implements RFC 7591 registration structures and RFC 6749 error responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

//! Data models for the OAuth 2.1 authorization layer.
//!
//! Wire types (requests, responses, [`OAuth2Error`]) live next to the
//! in-memory records the stores keep ([`RegisteredClient`],
//! [`AuthorizationState`], [`AuthorizationCode`], [`AccessTokenRecord`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// RFC 7591 dynamic client registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRegistrationRequest {
    /// Redirect URIs the client will use
    pub redirect_uris: Vec<String>,
    /// How the client authenticates at the token endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint_auth_method: Option<String>,
    /// Requested grant types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_types: Option<Vec<String>>,
    /// Requested response types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_types: Option<Vec<String>>,
    /// Human-readable client name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    /// Space-separated requested scope
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// RFC 7591 registration response; the secret appears exactly once here
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRegistrationResponse {
    /// Issued client identifier
    pub client_id: String,
    /// Plaintext secret, only for confidential clients
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Unix timestamp of issuance
    pub client_id_issued_at: i64,
    /// Registered redirect URIs
    pub redirect_uris: Vec<String>,
    /// Registered grant types
    pub grant_types: Vec<String>,
    /// Registered response types
    pub response_types: Vec<String>,
    /// Token endpoint auth method
    pub token_endpoint_auth_method: String,
    /// Client name when one was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    /// Granted scope
    pub scope: String,
}

/// Query parameters accepted by GET /oauth/authorize
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizeParams {
    /// Must be `code`
    pub response_type: Option<String>,
    /// Registered client identifier
    pub client_id: Option<String>,
    /// Exact-match redirect target
    pub redirect_uri: Option<String>,
    /// Requested scope, space-separated
    pub scope: Option<String>,
    /// Opaque client CSRF state, echoed back
    pub state: Option<String>,
    /// PKCE challenge (base64url of SHA-256 of the verifier)
    pub code_challenge: Option<String>,
    /// PKCE method, only `S256` is accepted
    pub code_challenge_method: Option<String>,
    /// RFC 8707 resource indicator
    pub resource: Option<String>,
}

/// Query parameters GitHub sends to GET /oauth/callback
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// Upstream authorization code
    pub code: Option<String>,
    /// Internal state issued at /oauth/authorize
    pub state: Option<String>,
    /// Upstream error code, if the user denied or GitHub failed
    pub error: Option<String>,
    /// Upstream error detail
    pub error_description: Option<String>,
}

/// Form body accepted by POST /oauth/token
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    /// Must be `authorization_code`
    pub grant_type: Option<String>,
    /// Authorization code being redeemed
    pub code: Option<String>,
    /// Redeeming client
    pub client_id: Option<String>,
    /// Secret for confidential clients
    pub client_secret: Option<String>,
    /// PKCE verifier
    pub code_verifier: Option<String>,
    /// Must match the redirect URI bound to the code
    pub redirect_uri: Option<String>,
}

/// Successful token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for the MCP surface
    pub access_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    /// Granted scope
    pub scope: String,
    /// Resource the token is bound to, when one was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

/// RFC 6749 / RFC 7591 error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Error {
    /// Machine-readable error code
    pub error: String,
    /// Human-readable detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    /// Link to the defining spec section
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
}

const RFC6749_ERRORS: &str = "https://datatracker.ietf.org/doc/html/rfc6749#section-5.2";
const RFC7591_ERRORS: &str = "https://datatracker.ietf.org/doc/html/rfc7591#section-3.2.2";

impl OAuth2Error {
    fn new(error: &str, description: impl Into<String>, uri: &str) -> Self {
        Self {
            error: error.to_owned(),
            error_description: Some(description.into()),
            error_uri: Some(uri.to_owned()),
        }
    }

    /// Malformed or incomplete request
    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::new("invalid_request", description, RFC6749_ERRORS)
    }

    /// Client authentication failed
    #[must_use]
    pub fn invalid_client() -> Self {
        Self::new("invalid_client", "Client authentication failed", RFC6749_ERRORS)
    }

    /// Authorization code or PKCE verification failure
    pub fn invalid_grant(description: impl Into<String>) -> Self {
        Self::new("invalid_grant", description, RFC6749_ERRORS)
    }

    /// Only `authorization_code` is supported
    #[must_use]
    pub fn unsupported_grant_type() -> Self {
        Self::new(
            "unsupported_grant_type",
            "Grant type not supported",
            RFC6749_ERRORS,
        )
    }

    /// Only `code` is supported
    #[must_use]
    pub fn unsupported_response_type() -> Self {
        Self::new(
            "unsupported_response_type",
            "Only response_type=code is supported",
            RFC6749_ERRORS,
        )
    }

    /// Requested scope exceeds the supported set
    pub fn invalid_scope(description: impl Into<String>) -> Self {
        Self::new("invalid_scope", description, RFC6749_ERRORS)
    }

    /// Upstream or internal failure during the flow
    pub fn server_error(description: impl Into<String>) -> Self {
        Self::new("server_error", description, RFC6749_ERRORS)
    }

    /// RFC 7591 registration metadata failure
    pub fn invalid_client_metadata(description: impl Into<String>) -> Self {
        Self::new("invalid_client_metadata", description, RFC7591_ERRORS)
    }

    /// RFC 7591 redirect URI failure
    pub fn invalid_redirect_uri(description: impl Into<String>) -> Self {
        Self::new("invalid_redirect_uri", description, RFC7591_ERRORS)
    }
}

/// A client known to the authorization server
#[derive(Debug, Clone)]
pub struct RegisteredClient {
    /// Client identifier
    pub client_id: String,
    /// SHA-256 hash of the secret; `None` for public clients
    pub client_secret_hash: Option<String>,
    /// Exact-match redirect URIs
    pub redirect_uris: Vec<String>,
    /// Permitted grant types
    pub grant_types: Vec<String>,
    /// Permitted response types
    pub response_types: Vec<String>,
    /// Token endpoint auth method (`none` for public clients)
    pub token_endpoint_auth_method: String,
    /// Display name
    pub client_name: Option<String>,
    /// Granted scope
    pub scope: String,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

impl RegisteredClient {
    /// Public clients authenticate with PKCE only
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.token_endpoint_auth_method == "none"
    }
}

/// CSRF-correlation record created at /oauth/authorize, consumed at the callback
#[derive(Debug, Clone)]
pub struct AuthorizationState {
    /// Requesting client
    pub client_id: String,
    /// Where the client wants the code delivered
    pub redirect_uri: String,
    /// Scope the client asked for
    pub scope: String,
    /// The client's own state value, echoed back
    pub client_state: Option<String>,
    /// PKCE challenge carried through to the code
    pub code_challenge: String,
    /// PKCE method, always `S256`
    pub code_challenge_method: String,
    /// RFC 8707 resource indicator
    pub resource: Option<String>,
    /// Creation time; entries older than the state TTL are absent
    pub created_at: DateTime<Utc>,
}

/// One-time authorization code minted at the callback
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    /// Client the code was issued to
    pub client_id: String,
    /// Redirect URI bound at authorization time
    pub redirect_uri: String,
    /// Granted scope
    pub scope: String,
    /// Upstream GitHub access token
    pub github_token: String,
    /// GitHub login of the resource owner
    pub github_login: String,
    /// PKCE challenge to verify at redemption
    pub code_challenge: String,
    /// PKCE method
    pub code_challenge_method: String,
    /// Resource indicator, if any
    pub resource: Option<String>,
    /// Hard expiry; expired codes are absent
    pub expires_at: DateTime<Utc>,
}

/// Access token record kept server-side
#[derive(Debug, Clone)]
pub struct AccessTokenRecord {
    /// Client the token was issued to
    pub client_id: String,
    /// Granted scope
    pub scope: String,
    /// Upstream GitHub access token, re-verified on use
    pub github_token: String,
    /// GitHub login of the resource owner
    pub github_login: String,
    /// Resource indicator, if any
    pub resource: Option<String>,
    /// Hard expiry; expired tokens are absent
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn oauth2_error_constructors_carry_rfc_links() {
        let err = OAuth2Error::invalid_request("missing code");
        assert_eq!(err.error, "invalid_request");
        assert_eq!(err.error_description.as_deref(), Some("missing code"));
        assert!(err.error_uri.unwrap().contains("rfc6749"));

        let err = OAuth2Error::invalid_client_metadata("bad redirect");
        assert!(err.error_uri.unwrap().contains("rfc7591"));
    }

    #[test]
    fn oauth2_error_serializes_per_rfc() {
        let err = OAuth2Error::invalid_grant("code expired");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"error\":\"invalid_grant\""));
        assert!(json.contains("\"error_description\":\"code expired\""));
    }

    #[test]
    fn public_client_detection() {
        let client = RegisteredClient {
            client_id: "c1".into(),
            client_secret_hash: None,
            redirect_uris: vec!["http://127.0.0.1:9999/cb".into()],
            grant_types: vec!["authorization_code".into()],
            response_types: vec!["code".into()],
            token_endpoint_auth_method: "none".into(),
            client_name: None,
            scope: "read:user".into(),
            created_at: Utc::now(),
        };
        assert!(client.is_public());
    }

    #[test]
    fn token_response_omits_missing_resource() {
        let resp = TokenResponse {
            access_token: "tok".into(),
            token_type: "Bearer".into(),
            expires_in: 3600,
            scope: "read:user".into(),
            resource: None,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("resource"));
        assert!(json.contains("\"expires_in\":3600"));
    }
}
