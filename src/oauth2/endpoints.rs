// ABOUTME: OAuth 2.1 authorization, callback and token endpoint state machines
// ABOUTME: Enforces validation order, redirect-vs-direct error delivery and one-shot codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

//! Core OAuth flow logic, independent of the HTTP framing.
//!
//! [`OAuth2Flow::authorize`] validates a client's authorization request
//! and redirects to GitHub; [`OAuth2Flow::callback`] turns GitHub's
//! answer into a one-time authorization code; [`OAuth2Flow::token`]
//! redeems that code for a bearer token after PKCE verification.
//!
//! Error delivery follows RFC 6749 section 4.1.2.1: until the redirect
//! URI has been validated against the client's registration, errors are
//! direct HTTP responses; afterwards they travel as redirect parameters.

use crate::config::Config;
use crate::crypto;
use crate::errors::AppResult;
use crate::oauth2::github::GitHubClient;
use crate::oauth2::models::{
    AccessTokenRecord, AuthorizationCode, AuthorizationState, AuthorizeParams, CallbackParams,
    OAuth2Error, TokenRequest, TokenResponse,
};
use crate::oauth2::pkce;
use crate::oauth2::store::{AuthCodeStore, ClientStore, StateStore, TokenStore, AUTH_CODE_TTL_SECS};
use chrono::{Duration, Utc};
use http::StatusCode;
use std::sync::Arc;
use url::Url;

/// How an authorization-phase result reaches the user agent
#[derive(Debug)]
pub enum AuthorizeOutcome {
    /// 302 to the given location
    Redirect(String),
    /// Direct error response; the redirect URI could not be trusted
    Error(OAuth2Error),
}

/// Token endpoint failure with its HTTP status
#[derive(Debug)]
pub struct TokenError {
    /// HTTP status (400 or 401)
    pub status: StatusCode,
    /// RFC 6749 error body
    pub body: OAuth2Error,
}

impl TokenError {
    fn bad_request(body: OAuth2Error) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body,
        }
    }

    fn unauthorized(body: OAuth2Error) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body,
        }
    }
}

/// The OAuth flow over its injected stores and upstream client
pub struct OAuth2Flow {
    config: Arc<Config>,
    clients: Arc<ClientStore>,
    states: Arc<StateStore>,
    codes: Arc<AuthCodeStore>,
    tokens: Arc<TokenStore>,
    github: Arc<GitHubClient>,
}

impl OAuth2Flow {
    /// Wire the flow over shared stores
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        clients: Arc<ClientStore>,
        states: Arc<StateStore>,
        codes: Arc<AuthCodeStore>,
        tokens: Arc<TokenStore>,
        github: Arc<GitHubClient>,
    ) -> Self {
        Self {
            config,
            clients,
            states,
            codes,
            tokens,
            github,
        }
    }

    /// Handle GET /oauth/authorize.
    ///
    /// # Errors
    /// Internal failures (RNG) surface as `AppError`; protocol failures
    /// are part of the [`AuthorizeOutcome`].
    pub async fn authorize(&self, params: AuthorizeParams) -> AppResult<AuthorizeOutcome> {
        // Until the redirect URI is validated, errors must not redirect.
        if params.response_type.as_deref() != Some("code") {
            tracing::warn!(
                response_type = params.response_type.as_deref().unwrap_or(""),
                "authorize rejected: unsupported response_type"
            );
            return Ok(AuthorizeOutcome::Error(
                OAuth2Error::unsupported_response_type(),
            ));
        }

        let Some(client_id) = params.client_id.as_deref().filter(|id| !id.is_empty()) else {
            return Ok(AuthorizeOutcome::Error(OAuth2Error::invalid_request(
                "client_id is required",
            )));
        };
        let Some(client) = self.clients.get(client_id).await else {
            tracing::warn!(client_id = %client_id, "authorize rejected: unknown client");
            return Ok(AuthorizeOutcome::Error(OAuth2Error::invalid_client()));
        };

        let Some(redirect_uri) = params.redirect_uri.as_deref().filter(|uri| !uri.is_empty())
        else {
            return Ok(AuthorizeOutcome::Error(OAuth2Error::invalid_request(
                "redirect_uri is required",
            )));
        };
        if !client.redirect_uris.iter().any(|uri| uri == redirect_uri) {
            tracing::warn!(
                client_id = %client_id,
                redirect_uri = %redirect_uri,
                "authorize rejected: unregistered redirect_uri"
            );
            return Ok(AuthorizeOutcome::Error(OAuth2Error::invalid_request(
                "redirect_uri is not registered for this client",
            )));
        }

        // The redirect URI is trusted from here on; deliver errors to it.
        let client_state = params.state.clone();
        let Some(code_challenge) = params
            .code_challenge
            .as_deref()
            .filter(|challenge| !challenge.is_empty())
        else {
            return Ok(self.error_redirect(
                redirect_uri,
                client_state.as_deref(),
                &OAuth2Error::invalid_request("code_challenge is required (PKCE)"),
            ));
        };
        if params.code_challenge_method.as_deref() != Some("S256") {
            return Ok(self.error_redirect(
                redirect_uri,
                client_state.as_deref(),
                &OAuth2Error::invalid_request("code_challenge_method must be S256"),
            ));
        }

        let scope = params
            .scope
            .clone()
            .filter(|scope| !scope.is_empty())
            .unwrap_or_else(|| crate::config::DEFAULT_SCOPES.to_owned());
        for requested in scope.split_whitespace() {
            if !self
                .config
                .scopes_supported
                .iter()
                .any(|supported| supported == requested)
            {
                tracing::warn!(scope = %requested, "authorize rejected: unsupported scope");
                return Ok(self.error_redirect(
                    redirect_uri,
                    client_state.as_deref(),
                    &OAuth2Error::invalid_scope(format!("unsupported scope: {requested}")),
                ));
            }
        }

        let internal_state = crypto::random_token(32)?;
        self.states
            .store(
                internal_state.clone(),
                AuthorizationState {
                    client_id: client_id.to_owned(),
                    redirect_uri: redirect_uri.to_owned(),
                    scope,
                    client_state,
                    code_challenge: code_challenge.to_owned(),
                    code_challenge_method: "S256".to_owned(),
                    resource: params.resource,
                    created_at: Utc::now(),
                },
            )
            .await;

        let github_url = Url::parse_with_params(
            &self.config.github_auth_url,
            &[
                ("client_id", self.config.github_client_id.as_str()),
                ("redirect_uri", self.config.callback_url().as_str()),
                ("scope", "read:user"),
                ("state", internal_state.as_str()),
            ],
        )
        .map_err(|err| crate::errors::AppError::config(format!("bad GitHub auth URL: {err}")))?;

        tracing::debug!(client_id = %client_id, "redirecting to GitHub for authorization");
        Ok(AuthorizeOutcome::Redirect(github_url.into()))
    }

    /// Handle GET /oauth/callback from GitHub.
    ///
    /// # Errors
    /// Internal failures (RNG) surface as `AppError`.
    pub async fn callback(&self, params: CallbackParams) -> AppResult<AuthorizeOutcome> {
        if let Some(error) = params.error.as_deref() {
            let detail = params.error_description.unwrap_or_default();
            tracing::warn!(error = %error, detail = %detail, "GitHub reported an error");
            return Ok(AuthorizeOutcome::Error(OAuth2Error::invalid_request(
                format!("GitHub authorization failed: {error} {detail}"),
            )));
        }
        let Some(code) = params.code.as_deref().filter(|code| !code.is_empty()) else {
            return Ok(AuthorizeOutcome::Error(OAuth2Error::invalid_request(
                "missing authorization code",
            )));
        };

        // An unresolvable state may be CSRF; never redirect anywhere.
        let state = match params.state.as_deref() {
            Some(state) => match self.states.consume(state).await {
                Some(record) => record,
                None => {
                    tracing::warn!("callback rejected: unknown or expired state");
                    return Ok(AuthorizeOutcome::Error(OAuth2Error::invalid_request(
                        "invalid or expired state parameter",
                    )));
                }
            },
            None => {
                return Ok(AuthorizeOutcome::Error(OAuth2Error::invalid_request(
                    "missing state parameter",
                )))
            }
        };

        let github_token = match self
            .github
            .exchange_code(code, &self.config.callback_url())
            .await
        {
            Ok(token) => token,
            Err(err) => {
                tracing::error!(error = %err, "GitHub code exchange failed");
                return Ok(self.error_redirect(
                    &state.redirect_uri,
                    state.client_state.as_deref(),
                    &OAuth2Error::server_error("failed to exchange code with GitHub"),
                ));
            }
        };

        // Resolve the login now and warm the validation cache.
        let identity = match self.github.verify_token(&github_token).await {
            Ok(identity) => identity,
            Err(err) => {
                tracing::error!(error = %err, "GitHub user lookup failed");
                return Ok(self.error_redirect(
                    &state.redirect_uri,
                    state.client_state.as_deref(),
                    &OAuth2Error::server_error("failed to resolve GitHub user"),
                ));
            }
        };

        let auth_code = crypto::random_token(32)?;
        self.codes
            .store(
                auth_code.clone(),
                AuthorizationCode {
                    client_id: state.client_id.clone(),
                    redirect_uri: state.redirect_uri.clone(),
                    scope: state.scope,
                    github_token,
                    github_login: identity.user.login.clone(),
                    code_challenge: state.code_challenge,
                    code_challenge_method: state.code_challenge_method,
                    resource: state.resource,
                    expires_at: Utc::now() + Duration::seconds(AUTH_CODE_TTL_SECS),
                },
            )
            .await;

        tracing::info!(
            client_id = %state.client_id,
            github_login = %identity.user.login,
            "authorization code issued"
        );

        let mut location = format!(
            "{}?code={}",
            state.redirect_uri,
            urlencoding::encode(&auth_code)
        );
        if let Some(client_state) = &state.client_state {
            location.push_str(&format!("&state={}", urlencoding::encode(client_state)));
        }
        Ok(AuthorizeOutcome::Redirect(location))
    }

    /// Handle POST /oauth/token.
    ///
    /// The authorization code is consumed before PKCE verification, so a
    /// failed verification still burns the code.
    ///
    /// # Errors
    /// Protocol failures carry their HTTP status in [`TokenError`].
    pub async fn token(&self, request: TokenRequest) -> Result<TokenResponse, TokenError> {
        if request.grant_type.as_deref() != Some("authorization_code") {
            return Err(TokenError::bad_request(OAuth2Error::unsupported_grant_type()));
        }

        let code = require(request.code.as_deref(), "code")?;
        let client_id = require(request.client_id.as_deref(), "client_id")?;
        let code_verifier = require(request.code_verifier.as_deref(), "code_verifier")?;
        let redirect_uri = require(request.redirect_uri.as_deref(), "redirect_uri")?;

        let Some(client) = self.clients.get(client_id).await else {
            tracing::warn!(client_id = %client_id, "token rejected: unknown client");
            return Err(TokenError::unauthorized(OAuth2Error::invalid_client()));
        };
        if !client.is_public() {
            let authenticated = match request.client_secret.as_deref() {
                Some(secret) => self.clients.validate_secret(client_id, secret).await,
                None => false,
            };
            if !authenticated {
                tracing::warn!(client_id = %client_id, "token rejected: client authentication failed");
                return Err(TokenError::unauthorized(OAuth2Error::invalid_client()));
            }
        }

        // One-shot: the code is gone after this, pass or fail.
        let Some(record) = self.codes.consume(code).await else {
            tracing::warn!(client_id = %client_id, "token rejected: unknown or expired code");
            return Err(TokenError::bad_request(OAuth2Error::invalid_grant(
                "authorization code is invalid or expired",
            )));
        };

        if record.client_id != client_id {
            tracing::warn!(client_id = %client_id, "token rejected: code issued to another client");
            return Err(TokenError::bad_request(OAuth2Error::invalid_grant(
                "authorization code was issued to another client",
            )));
        }
        if record.redirect_uri != redirect_uri {
            tracing::warn!(client_id = %client_id, "token rejected: redirect_uri mismatch");
            return Err(TokenError::bad_request(OAuth2Error::invalid_grant(
                "redirect_uri does not match the authorization request",
            )));
        }

        if let Err(failure) = pkce::verify_s256(code_verifier, &record.code_challenge) {
            tracing::warn!(
                client_id = %client_id,
                reason = failure.description(),
                "token rejected: PKCE verification failed"
            );
            return Err(TokenError::bad_request(OAuth2Error::invalid_grant(
                failure.description(),
            )));
        }

        let access_token = crypto::random_token(43).map_err(|err| {
            tracing::error!(error = %err, "access token generation failed");
            TokenError::bad_request(OAuth2Error::server_error("failed to generate token"))
        })?;
        let expires_in = self.config.token_expiry.num_seconds();
        self.tokens
            .store(
                access_token.clone(),
                AccessTokenRecord {
                    client_id: client_id.to_owned(),
                    scope: record.scope.clone(),
                    github_token: record.github_token,
                    github_login: record.github_login.clone(),
                    resource: record.resource.clone(),
                    expires_at: Utc::now() + self.config.token_expiry,
                },
            )
            .await;

        tracing::info!(
            client_id = %client_id,
            github_login = %record.github_login,
            expires_in,
            "access token issued"
        );

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_owned(),
            expires_in,
            scope: record.scope,
            resource: record.resource,
        })
    }

    fn error_redirect(
        &self,
        redirect_uri: &str,
        client_state: Option<&str>,
        error: &OAuth2Error,
    ) -> AuthorizeOutcome {
        let mut location = format!(
            "{}?error={}",
            redirect_uri,
            urlencoding::encode(&error.error)
        );
        if let Some(description) = &error.error_description {
            location.push_str(&format!(
                "&error_description={}",
                urlencoding::encode(description)
            ));
        }
        if let Some(state) = client_state {
            location.push_str(&format!("&state={}", urlencoding::encode(state)));
        }
        AuthorizeOutcome::Redirect(location)
    }
}

fn require<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, TokenError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TokenError::bad_request(OAuth2Error::invalid_request(format!("{name} is required"))))
}
