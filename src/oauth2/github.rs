// ABOUTME: GitHub upstream integration: code exchange, token verification, scope mapping
// ABOUTME: Caches verification results (positive and negative) bounded by the token TTL
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

//! GitHub acts as the upstream identity provider. This module exchanges
//! authorization codes for GitHub tokens, verifies tokens against
//! `GET /user`, parses the `X-OAuth-Scopes` header and maps GitHub
//! scopes onto the MCP scope vocabulary.

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const HTTP_TIMEOUT_SECS: u64 = 10;

/// GitHub account fields returned by `GET /user`
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    /// Account login name
    pub login: String,
    /// Numeric account id
    pub id: u64,
    /// Public email, when set
    #[serde(default)]
    pub email: Option<String>,
    /// Display name, when set
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar image URL
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Outcome of a successful token verification
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    /// Resource owner's GitHub account
    pub user: GitHubUser,
    /// GitHub scopes mapped onto the MCP vocabulary
    pub mcp_scopes: Vec<String>,
}

struct CachedValidation {
    /// `None` records a definitive rejection
    identity: Option<VerifiedIdentity>,
    expires_at: DateTime<Utc>,
}

/// Cache of verification results keyed by the upstream token.
///
/// Negative results are cached too, so a revoked token does not hammer
/// the GitHub API on every request. Entries never outlive the
/// access-token TTL, which bounds how stale a cached answer can be.
#[derive(Default)]
pub struct ValidationCache {
    entries: RwLock<HashMap<String, CachedValidation>>,
}

impl ValidationCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached result. `Some(Some(_))` is a cached acceptance,
    /// `Some(None)` a cached rejection, `None` a miss.
    pub async fn get(&self, token: &str) -> Option<Option<VerifiedIdentity>> {
        let mut entries = self.entries.write().await;
        match entries.get(token) {
            Some(entry) if entry.expires_at > Utc::now() => Some(entry.identity.clone()),
            Some(_) => {
                entries.remove(token);
                None
            }
            None => None,
        }
    }

    /// Cache a result, evicting expired entries first
    pub async fn put(&self, token: String, identity: Option<VerifiedIdentity>, ttl: Duration) {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, existing| existing.expires_at > now);
        entries.insert(
            token,
            CachedValidation {
                identity,
                expires_at: now + ttl,
            },
        );
    }
}

#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client for the GitHub OAuth and REST endpoints
pub struct GitHubClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    api_url: String,
    token_url: String,
    cache: ValidationCache,
    cache_ttl: Duration,
}

impl GitHubClient {
    /// Build a client from the server configuration.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(concat!("relay-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| AppError::internal(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            client_id: config.github_client_id.clone(),
            client_secret: config.github_client_secret.clone(),
            api_url: config.github_api_url.trim_end_matches('/').to_owned(),
            token_url: config.github_token_url.clone(),
            cache: ValidationCache::new(),
            cache_ttl: config.token_expiry,
        })
    }

    /// Exchange a GitHub authorization code for a GitHub access token.
    ///
    /// # Errors
    /// Any transport failure, non-success status, upstream `error` field
    /// or empty token is an external-service error.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> AppResult<String> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];
        let response = self
            .http
            .post(&self.token_url)
            .header(http::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|err| AppError::external_service("github", err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(
                "github",
                format!("token exchange returned {status}"),
            ));
        }
        let body: ExchangeResponse = response
            .json()
            .await
            .map_err(|err| AppError::external_service("github", err.to_string()))?;
        if let Some(error) = body.error {
            let detail = body.error_description.unwrap_or_default();
            return Err(AppError::external_service(
                "github",
                format!("token exchange failed: {error} {detail}"),
            ));
        }
        body.access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::external_service("github", "token exchange returned no token"))
    }

    /// Fetch the GitHub account a token belongs to, without caching.
    ///
    /// # Errors
    /// Transport failures are external-service errors; a non-success
    /// status means the token is invalid.
    pub async fn fetch_user(&self, github_token: &str) -> AppResult<(GitHubUser, Vec<String>)> {
        let response = self
            .http
            .get(format!("{}/user", self.api_url))
            .header(http::header::ACCEPT, GITHUB_ACCEPT)
            .bearer_auth(github_token)
            .send()
            .await
            .map_err(|err| AppError::external_service("github", err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = %status, "GitHub rejected token");
            return Err(AppError::auth_invalid(format!(
                "GitHub token rejected with status {status}"
            )));
        }

        let github_scopes = response
            .headers()
            .get("x-oauth-scopes")
            .and_then(|value| value.to_str().ok())
            .map(parse_scopes_header)
            .unwrap_or_default();

        let user: GitHubUser = response
            .json()
            .await
            .map_err(|err| AppError::external_service("github", err.to_string()))?;
        Ok((user, github_scopes))
    }

    /// Verify a GitHub token, consulting the cache first. Both
    /// acceptances and rejections are cached.
    ///
    /// # Errors
    /// Invalid tokens yield an auth error; transport failures an
    /// external-service error (never cached).
    pub async fn verify_token(&self, github_token: &str) -> AppResult<VerifiedIdentity> {
        if let Some(cached) = self.cache.get(github_token).await {
            return cached.ok_or_else(|| {
                tracing::debug!("GitHub token rejected from cache");
                AppError::auth_invalid("GitHub token is invalid")
            });
        }

        match self.fetch_user(github_token).await {
            Ok((user, github_scopes)) => {
                let identity = VerifiedIdentity {
                    mcp_scopes: map_github_scopes(&github_scopes),
                    user,
                };
                self.cache
                    .put(
                        github_token.to_owned(),
                        Some(identity.clone()),
                        self.cache_ttl,
                    )
                    .await;
                Ok(identity)
            }
            Err(err) if err.code == crate::errors::ErrorCode::AuthInvalid => {
                self.cache
                    .put(github_token.to_owned(), None, self.cache_ttl)
                    .await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}

fn parse_scopes_header(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|scope| !scope.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Map GitHub OAuth scopes onto the MCP scope vocabulary.
///
/// `read:user` is always granted. When no upstream scope maps to
/// anything beyond it (empty lists from fine-grained PATs, or pure user
/// scopes like `user`), the result falls back to the full baseline
/// grant of `mcp:tools` and `mcp:resources`.
#[must_use]
pub fn map_github_scopes(github_scopes: &[String]) -> Vec<String> {
    let mut mapped = vec!["read:user".to_owned()];
    let mut push = |scope: &str| {
        if !mapped.iter().any(|existing| existing == scope) {
            mapped.push(scope.to_owned());
        }
    };
    for scope in github_scopes {
        match scope.as_str() {
            "repo" | "public_repo" | "read:repo_hook" => push("mcp:resources"),
            "workflow" | "write:repo_hook" | "admin:repo_hook" => push("mcp:tools"),
            "read:user" | "user" | "user:email" => {}
            other => push(other),
        }
    }
    // Nothing mapped beyond the implied read:user: grant baseline access.
    if mapped.len() == 1 {
        mapped.push("mcp:tools".to_owned());
        mapped.push("mcp:resources".to_owned());
    }
    mapped
}
