// ABOUTME: OAuth 2.0 dynamic client registration (RFC 7591)
// ABOUTME: Validates client metadata, issues ids and secrets, and persists clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

//! Dynamic client registration per RFC 7591.

use crate::config::DEFAULT_SCOPES;
use crate::crypto;
use crate::oauth2::models::{
    ClientRegistrationRequest, ClientRegistrationResponse, OAuth2Error, RegisteredClient,
};
use crate::oauth2::store::ClientStore;
use chrono::Utc;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

const MAX_REDIRECT_URI_LEN: usize = 2048;
const MAX_CLIENT_NAME_LEN: usize = 256;

const ALLOWED_GRANT_TYPES: &[&str] = &[
    "authorization_code",
    "implicit",
    "password",
    "client_credentials",
    "refresh_token",
];
const ALLOWED_RESPONSE_TYPES: &[&str] = &["code", "token"];
const ALLOWED_AUTH_METHODS: &[&str] = &["none", "client_secret_post", "client_secret_basic"];

/// Handles RFC 7591 registration requests
pub struct ClientRegistrationManager {
    clients: Arc<ClientStore>,
    allow_public_clients: bool,
}

impl ClientRegistrationManager {
    /// Create a manager over the shared client store
    #[must_use]
    pub fn new(clients: Arc<ClientStore>, allow_public_clients: bool) -> Self {
        Self {
            clients,
            allow_public_clients,
        }
    }

    /// Register a client, returning the RFC 7591 response.
    ///
    /// The plaintext secret for confidential clients appears only in the
    /// response; the store keeps the hash.
    ///
    /// # Errors
    /// Returns `invalid_redirect_uri` or `invalid_client_metadata` per
    /// RFC 7591 section 3.2.2.
    pub async fn register(
        &self,
        request: ClientRegistrationRequest,
    ) -> Result<ClientRegistrationResponse, OAuth2Error> {
        self.validate(&request)?;

        let auth_method = request.token_endpoint_auth_method.unwrap_or_else(|| {
            if self.allow_public_clients {
                "none".to_owned()
            } else {
                "client_secret_basic".to_owned()
            }
        });
        let grant_types = request
            .grant_types
            .unwrap_or_else(|| vec!["authorization_code".to_owned()]);
        let response_types = request
            .response_types
            .unwrap_or_else(|| vec!["code".to_owned()]);
        let scope = request.scope.unwrap_or_else(|| DEFAULT_SCOPES.to_owned());

        let client_id = generate_client_id();
        let client_secret = if auth_method == "none" {
            None
        } else {
            Some(crypto::random_token(32).map_err(|err| {
                tracing::error!(error = %err, "client secret generation failed");
                OAuth2Error::server_error("failed to generate client secret")
            })?)
        };

        let client = RegisteredClient {
            client_id: client_id.clone(),
            client_secret_hash: client_secret.as_deref().map(crypto::hash_secret),
            redirect_uris: request.redirect_uris.clone(),
            grant_types: grant_types.clone(),
            response_types: response_types.clone(),
            token_endpoint_auth_method: auth_method.clone(),
            client_name: request.client_name.clone(),
            scope: scope.clone(),
            created_at: Utc::now(),
        };
        self.clients.register(client).await;

        tracing::info!(
            client_id = %client_id,
            auth_method = %auth_method,
            redirect_uris = request.redirect_uris.len(),
            "registered OAuth client"
        );

        Ok(ClientRegistrationResponse {
            client_id,
            client_secret,
            client_id_issued_at: Utc::now().timestamp(),
            redirect_uris: request.redirect_uris,
            grant_types,
            response_types,
            token_endpoint_auth_method: auth_method,
            client_name: request.client_name,
            scope,
        })
    }

    fn validate(&self, request: &ClientRegistrationRequest) -> Result<(), OAuth2Error> {
        if request.redirect_uris.is_empty() {
            return Err(OAuth2Error::invalid_redirect_uri(
                "at least one redirect_uri is required",
            ));
        }
        for uri in &request.redirect_uris {
            if uri.len() > MAX_REDIRECT_URI_LEN {
                return Err(OAuth2Error::invalid_redirect_uri(format!(
                    "redirect_uri exceeds {MAX_REDIRECT_URI_LEN} characters"
                )));
            }
            if !is_valid_redirect_uri(uri) {
                return Err(OAuth2Error::invalid_redirect_uri(format!(
                    "invalid redirect_uri: {uri}"
                )));
            }
        }

        if let Some(grant_types) = &request.grant_types {
            for grant in grant_types {
                if !ALLOWED_GRANT_TYPES.contains(&grant.as_str()) {
                    return Err(OAuth2Error::invalid_client_metadata(format!(
                        "unsupported grant_type: {grant}"
                    )));
                }
            }
        }
        if let Some(response_types) = &request.response_types {
            for response_type in response_types {
                if !ALLOWED_RESPONSE_TYPES.contains(&response_type.as_str()) {
                    return Err(OAuth2Error::invalid_client_metadata(format!(
                        "unsupported response_type: {response_type}"
                    )));
                }
            }
        }

        if let Some(method) = &request.token_endpoint_auth_method {
            if !ALLOWED_AUTH_METHODS.contains(&method.as_str()) {
                return Err(OAuth2Error::invalid_client_metadata(format!(
                    "unsupported token_endpoint_auth_method: {method}"
                )));
            }
            if method == "none" && !self.allow_public_clients {
                return Err(OAuth2Error::invalid_client_metadata(
                    "public clients are not allowed",
                ));
            }
        }

        if let Some(name) = &request.client_name {
            if name.len() > MAX_CLIENT_NAME_LEN {
                return Err(OAuth2Error::invalid_client_metadata(format!(
                    "client_name exceeds {MAX_CLIENT_NAME_LEN} characters"
                )));
            }
        }

        Ok(())
    }
}

fn generate_client_id() -> String {
    format!("mcp_client_{}", Uuid::new_v4().simple())
}

/// Redirect URI policy: https anywhere, http only on loopback hosts,
/// the OOB urn for devices without a redirect target, never fragments
/// or wildcard hosts.
fn is_valid_redirect_uri(uri: &str) -> bool {
    if uri == "urn:ietf:wg:oauth:2.0:oob" {
        return true;
    }
    if uri.contains('#') || uri.contains('*') {
        return false;
    }
    let Ok(parsed) = Url::parse(uri) else {
        return false;
    };
    match parsed.scheme() {
        "https" => true,
        "http" => matches!(
            parsed.host_str(),
            Some("localhost" | "127.0.0.1" | "[::1]" | "::1")
        ),
        _ => false,
    }
}
