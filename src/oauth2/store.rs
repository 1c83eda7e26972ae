// ABOUTME: In-memory TTL stores for OAuth state, authorization codes, tokens and clients
// ABOUTME: Sweeps expired entries on store and treats expired entries as absent on lookup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

//! In-memory stores backing the OAuth flow.
//!
//! Every store is an `Arc`-shared `tokio::sync::RwLock<HashMap>`. There
//! are no background sweepers: storing a new entry evicts expired
//! entries of the same store, and lookups delete-and-miss on expired
//! entries. Consuming operations remove the entry under the write lock,
//! so concurrent redeemers of the same authorization code observe at
//! most one success.

use crate::config::DEFAULT_SCOPES;
use crate::crypto;
use crate::oauth2::models::{
    AccessTokenRecord, AuthorizationCode, AuthorizationState, RegisteredClient,
};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Lifetime of a pending authorization state, in seconds
pub const STATE_TTL_SECS: i64 = 600;

/// Lifetime of an authorization code, in seconds
pub const AUTH_CODE_TTL_SECS: i64 = 600;

/// Pending CSRF-correlation states keyed by the internal state value
#[derive(Default)]
pub struct StateStore {
    entries: RwLock<HashMap<String, AuthorizationState>>,
}

impl StateStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a pending state, evicting expired ones first
    pub async fn store(&self, state: String, record: AuthorizationState) {
        let cutoff = Utc::now() - Duration::seconds(STATE_TTL_SECS);
        let mut entries = self.entries.write().await;
        entries.retain(|_, existing| existing.created_at > cutoff);
        entries.insert(state, record);
    }

    /// Remove and return the state. Expired or unknown states are a miss.
    pub async fn consume(&self, state: &str) -> Option<AuthorizationState> {
        let mut entries = self.entries.write().await;
        let record = entries.remove(state)?;
        let cutoff = Utc::now() - Duration::seconds(STATE_TTL_SECS);
        (record.created_at > cutoff).then_some(record)
    }
}

/// One-time authorization codes keyed by the code value
#[derive(Default)]
pub struct AuthCodeStore {
    entries: RwLock<HashMap<String, AuthorizationCode>>,
}

impl AuthCodeStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly minted code, evicting expired ones first
    pub async fn store(&self, code: String, record: AuthorizationCode) {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, existing| existing.expires_at > now);
        entries.insert(code, record);
    }

    /// Remove and return the code. At most one caller ever succeeds for
    /// a given code; expired codes are a miss.
    pub async fn consume(&self, code: &str) -> Option<AuthorizationCode> {
        let mut entries = self.entries.write().await;
        let record = entries.remove(code)?;
        (record.expires_at > Utc::now()).then_some(record)
    }
}

/// Issued access tokens keyed by the token string
#[derive(Default)]
pub struct TokenStore {
    entries: RwLock<HashMap<String, AccessTokenRecord>>,
}

impl TokenStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an issued token, evicting expired ones first
    pub async fn store(&self, token: String, record: AccessTokenRecord) {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, existing| existing.expires_at > now);
        entries.insert(token, record);
    }

    /// Look up a token without consuming it. An expired entry is
    /// deleted and reported as a miss.
    pub async fn get(&self, token: &str) -> Option<AccessTokenRecord> {
        let mut entries = self.entries.write().await;
        match entries.get(token) {
            Some(record) if record.expires_at > Utc::now() => Some(record.clone()),
            Some(_) => {
                entries.remove(token);
                None
            }
            None => None,
        }
    }
}

/// Registered OAuth clients keyed by client id
#[derive(Default)]
pub struct ClientStore {
    entries: RwLock<HashMap<String, RegisteredClient>>,
}

impl ClientStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with the `vscode` public client, so the
    /// VS Code MCP integration works without dynamic registration.
    #[must_use]
    pub fn with_defaults() -> Self {
        let store = Self::new();
        let vscode = RegisteredClient {
            client_id: "vscode".into(),
            client_secret_hash: None,
            redirect_uris: vec![
                "http://127.0.0.1:33418".into(),
                "http://127.0.0.1:33418/".into(),
                "http://127.0.0.1:33418/done".into(),
                "https://vscode.dev/redirect".into(),
            ],
            grant_types: vec!["authorization_code".into()],
            response_types: vec!["code".into()],
            token_endpoint_auth_method: "none".into(),
            client_name: Some("Visual Studio Code".into()),
            scope: DEFAULT_SCOPES.into(),
            created_at: Utc::now(),
        };
        // Seeding a fresh map cannot contend with readers
        if let Ok(mut entries) = store.entries.try_write() {
            entries.insert(vscode.client_id.clone(), vscode);
        }
        store
    }

    /// Register or replace a client
    pub async fn register(&self, client: RegisteredClient) {
        let mut entries = self.entries.write().await;
        entries.insert(client.client_id.clone(), client);
    }

    /// Look up a client by id
    pub async fn get(&self, client_id: &str) -> Option<RegisteredClient> {
        let entries = self.entries.read().await;
        entries.get(client_id).cloned()
    }

    /// Validate a confidential client's secret in constant time.
    /// Public clients never pass this check.
    pub async fn validate_secret(&self, client_id: &str, secret: &str) -> bool {
        let entries = self.entries.read().await;
        entries
            .get(client_id)
            .and_then(|client| client.client_secret_hash.as_deref())
            .is_some_and(|hash| crypto::verify_secret(secret, hash))
    }
}
