// ABOUTME: Shared test utilities: quiet logging, fake GitHub upstream, server assembly
// ABOUTME: Builds in-process routers around injected stores for integration tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

//! Shared test utilities for `relay_mcp_server` integration tests.

use axum::routing::{get, post};
use axum::{Json, Router};
use http::header::HeaderMap;
use relay_mcp_server::config::Config;
use relay_mcp_server::oauth2::store::{AuthCodeStore, ClientStore, StateStore, TokenStore};
use relay_mcp_server::server::{build_router, ServerResources};
use std::collections::HashMap;
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };
        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// A fake GitHub upstream serving the token exchange and user endpoints
pub struct FakeGitHub {
    /// Base URL, e.g. `http://127.0.0.1:49152`
    pub base_url: String,
}

/// Spawn a local listener imitating GitHub's OAuth and REST endpoints.
///
/// The token exchange always yields `gho_test_token`; `GET /user`
/// accepts exactly that token, reports login `octocat` and the scope
/// header `repo, read:user`.
pub async fn spawn_fake_github() -> FakeGitHub {
    async fn exchange_handler() -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "access_token": "gho_test_token",
            "token_type": "bearer",
        }))
    }

    async fn user_handler(headers: HeaderMap) -> axum::response::Response {
        use axum::response::IntoResponse;

        let authorized = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value == "Bearer gho_test_token");
        if !authorized {
            return (
                http::StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"message": "Bad credentials"})),
            )
                .into_response();
        }
        (
            [("x-oauth-scopes", "repo, read:user")],
            Json(serde_json::json!({
                "login": "octocat",
                "id": 583231,
                "name": "The Octocat",
                "avatar_url": "https://avatars.githubusercontent.com/u/583231",
            })),
        )
            .into_response()
    }

    let app = Router::new()
        .route("/login/oauth/access_token", post(exchange_handler))
        .route("/user", get(user_handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeGitHub {
        base_url: format!("http://{addr}"),
    }
}

/// Config wired to a fake GitHub base URL
pub fn test_config(github_base: &str) -> Config {
    Config {
        github_client_id: "test_gh_client".into(),
        github_client_secret: "test_gh_secret".into(),
        github_api_url: github_base.to_owned(),
        github_token_url: format!("{github_base}/login/oauth/access_token"),
        ..Config::default()
    }
}

/// Config with the OAuth layer switched off
pub fn no_auth_config() -> Config {
    Config {
        oauth_enabled: false,
        ..Config::default()
    }
}

/// Assembled test server: resources plus its router
pub struct TestServer {
    pub resources: Arc<ServerResources>,
    pub router: Router,
}

/// Build a server around default stores (including the seeded `vscode` client)
pub fn build_test_server(config: Config) -> TestServer {
    init_test_logging();
    let resources = Arc::new(
        ServerResources::from_parts(
            Arc::new(config),
            Arc::new(ClientStore::with_defaults()),
            Arc::new(StateStore::new()),
            Arc::new(AuthCodeStore::new()),
            Arc::new(TokenStore::new()),
        )
        .unwrap(),
    );
    let router = build_router(&resources);
    TestServer { resources, router }
}

/// Parse the query string of a redirect `Location` into a map
pub fn location_params(location: &str) -> HashMap<String, String> {
    let url = url::Url::parse(location)
        .or_else(|_| url::Url::parse(&format!("http://placeholder{location}")))
        .unwrap();
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Read a response body as JSON
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
