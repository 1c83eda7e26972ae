// ABOUTME: Axum route handlers for OAuth endpoints and well-known metadata documents
// ABOUTME: Maps flow outcomes onto HTTP redirects, JSON bodies and cache-control headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

//! HTTP framing for the OAuth flow: registration, authorization,
//! callback, token exchange, and the RFC 8414 / RFC 9728 metadata
//! documents.

use crate::oauth2::endpoints::AuthorizeOutcome;
use crate::oauth2::models::{
    AuthorizeParams, CallbackParams, ClientRegistrationRequest, TokenRequest,
};
use crate::server::ServerResources;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use http::header::{CACHE_CONTROL, LOCATION, PRAGMA};
use http::StatusCode;
use std::sync::Arc;

/// OAuth and metadata routes
pub struct OAuth2Routes;

impl OAuth2Routes {
    /// Build the router for the OAuth surface
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/register", post(register_handler))
            .route("/oauth/authorize", get(authorize_handler))
            .route("/oauth/callback", get(callback_handler))
            .route("/oauth/token", post(token_handler))
            .route(
                "/.well-known/oauth-protected-resource",
                get(protected_resource_metadata_handler),
            )
            .route(
                "/.well-known/oauth-authorization-server",
                get(authorization_server_metadata_handler),
            )
            .with_state(resources)
    }
}

async fn register_handler(
    State(resources): State<Arc<ServerResources>>,
    Json(request): Json<ClientRegistrationRequest>,
) -> Response {
    if !resources.config.enable_dcr {
        let body = serde_json::json!({
            "error": "access_denied",
            "error_description": "dynamic client registration is disabled",
        });
        return (StatusCode::FORBIDDEN, Json(body)).into_response();
    }
    match resources.registration.register(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(error) => (StatusCode::BAD_REQUEST, Json(error)).into_response(),
    }
}

async fn authorize_handler(
    State(resources): State<Arc<ServerResources>>,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    match resources.oauth.authorize(params).await {
        Ok(outcome) => outcome_response(outcome),
        Err(error) => error.into_response(),
    }
}

async fn callback_handler(
    State(resources): State<Arc<ServerResources>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match resources.oauth.callback(params).await {
        Ok(outcome) => outcome_response(outcome),
        Err(error) => error.into_response(),
    }
}

async fn token_handler(
    State(resources): State<Arc<ServerResources>>,
    Form(request): Form<TokenRequest>,
) -> Response {
    match resources.oauth.token(request).await {
        Ok(token) => (
            StatusCode::OK,
            [(CACHE_CONTROL, "no-store"), (PRAGMA, "no-cache")],
            Json(token),
        )
            .into_response(),
        Err(error) => (error.status, Json(error.body)).into_response(),
    }
}

fn outcome_response(outcome: AuthorizeOutcome) -> Response {
    match outcome {
        AuthorizeOutcome::Redirect(location) => {
            (StatusCode::FOUND, [(LOCATION, location)]).into_response()
        }
        AuthorizeOutcome::Error(error) => {
            (StatusCode::BAD_REQUEST, Json(error)).into_response()
        }
    }
}

/// RFC 9728 protected resource metadata
async fn protected_resource_metadata_handler(
    State(resources): State<Arc<ServerResources>>,
) -> Response {
    let config = &resources.config;
    let body = serde_json::json!({
        "resource": config.server_url,
        "authorization_servers": [config.server_url],
        "scopes_supported": config.scopes_supported,
        "bearer_methods_supported": ["header"],
        "resource_documentation": format!("{}/docs", config.server_url),
    });
    metadata_response(body)
}

/// RFC 8414 authorization server metadata
async fn authorization_server_metadata_handler(
    State(resources): State<Arc<ServerResources>>,
) -> Response {
    let config = &resources.config;
    let mut body = serde_json::json!({
        "issuer": config.server_url,
        "authorization_endpoint": format!("{}/oauth/authorize", config.server_url),
        "token_endpoint": format!("{}/oauth/token", config.server_url),
        "scopes_supported": config.scopes_supported,
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code"],
        "token_endpoint_auth_methods_supported": [
            "none",
            "client_secret_post",
            "client_secret_basic",
        ],
        "code_challenge_methods_supported": ["S256"],
    });
    if config.enable_dcr {
        if let Some(map) = body.as_object_mut() {
            map.insert(
                "registration_endpoint".into(),
                format!("{}/register", config.server_url).into(),
            );
        }
    }
    metadata_response(body)
}

fn metadata_response(body: serde_json::Value) -> Response {
    (
        StatusCode::OK,
        [(CACHE_CONTROL, "public, max-age=3600")],
        Json(body),
    )
        .into_response()
}
