// ABOUTME: Negative-path tests for authorize, callback, token and bearer enforcement
// ABOUTME: Covers error delivery rules, PKCE failure handling and one-time code semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::body::Body;
use chrono::{Duration, Utc};
use common::{body_json, build_test_server, location_params, spawn_fake_github, test_config};
use http::{header, Request, StatusCode};
use relay_mcp_server::oauth2::models::AuthorizationCode;
use relay_mcp_server::oauth2::pkce;
use tower::ServiceExt;

const CLIENT_REDIRECT: &str = "http://127.0.0.1:33418";

fn authorize_uri(params: &[(&str, &str)]) -> String {
    format!(
        "/oauth/authorize?{}",
        serde_urlencoded::to_string(params).unwrap()
    )
}

async fn get(server: &common::TestServer, uri: &str) -> axum::response::Response {
    server
        .router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_token(server: &common::TestServer, params: &[(&str, &str)]) -> axum::response::Response {
    server
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/oauth/token")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(serde_urlencoded::to_string(params).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Seed an authorization code directly, bypassing the GitHub leg
async fn seed_code(server: &common::TestServer, code: &str, verifier: &str) {
    server
        .resources
        .codes
        .store(
            code.to_owned(),
            AuthorizationCode {
                client_id: "vscode".into(),
                redirect_uri: CLIENT_REDIRECT.into(),
                scope: "mcp:tools read:user".into(),
                github_token: "gho_test_token".into(),
                github_login: "octocat".into(),
                code_challenge: pkce::challenge_s256(verifier),
                code_challenge_method: "S256".into(),
                resource: None,
                expires_at: Utc::now() + Duration::seconds(600),
            },
        )
        .await;
}

#[tokio::test]
async fn authorize_errors_before_redirect_validation_are_direct() {
    let github = spawn_fake_github().await;
    let server = build_test_server(test_config(&github.base_url));

    // Wrong response_type
    let response = get(
        &server,
        &authorize_uri(&[("response_type", "token"), ("client_id", "vscode")]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "unsupported_response_type"
    );

    // Unknown client
    let response = get(
        &server,
        &authorize_uri(&[
            ("response_type", "code"),
            ("client_id", "ghost"),
            ("redirect_uri", CLIENT_REDIRECT),
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_client");

    // Redirect URI not registered for the client
    let response = get(
        &server,
        &authorize_uri(&[
            ("response_type", "code"),
            ("client_id", "vscode"),
            ("redirect_uri", "https://evil.example.com/steal"),
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_request");
}

#[tokio::test]
async fn authorize_errors_after_redirect_validation_travel_as_redirects() {
    let github = spawn_fake_github().await;
    let server = build_test_server(test_config(&github.base_url));

    // Missing PKCE challenge
    let response = get(
        &server,
        &authorize_uri(&[
            ("response_type", "code"),
            ("client_id", "vscode"),
            ("redirect_uri", CLIENT_REDIRECT),
            ("state", "abc"),
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let params = location_params(response.headers()[header::LOCATION].to_str().unwrap());
    assert_eq!(params["error"], "invalid_request");
    assert_eq!(params["state"], "abc");

    // PKCE plain method is rejected
    let response = get(
        &server,
        &authorize_uri(&[
            ("response_type", "code"),
            ("client_id", "vscode"),
            ("redirect_uri", CLIENT_REDIRECT),
            ("code_challenge", "whatever"),
            ("code_challenge_method", "plain"),
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let params = location_params(response.headers()[header::LOCATION].to_str().unwrap());
    assert_eq!(params["error"], "invalid_request");

    // Scope outside the supported set
    let response = get(
        &server,
        &authorize_uri(&[
            ("response_type", "code"),
            ("client_id", "vscode"),
            ("redirect_uri", CLIENT_REDIRECT),
            ("code_challenge", "challenge-value-0123456789"),
            ("code_challenge_method", "S256"),
            ("scope", "mcp:tools admin:everything"),
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let params = location_params(response.headers()[header::LOCATION].to_str().unwrap());
    assert_eq!(params["error"], "invalid_scope");
}

#[tokio::test]
async fn callback_rejects_unknown_state_and_upstream_errors_directly() {
    let github = spawn_fake_github().await;
    let server = build_test_server(test_config(&github.base_url));

    // Unresolvable state: possible CSRF, no redirect
    let response = get(&server, "/oauth/callback?code=x&state=not-a-real-state").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_request");

    // Upstream error parameter
    let response = get(
        &server,
        "/oauth/callback?error=access_denied&error_description=user+said+no",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing code
    let response = get(&server, "/oauth/callback?state=whatever").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn failed_pkce_burns_the_code() {
    let github = spawn_fake_github().await;
    let server = build_test_server(test_config(&github.base_url));
    let verifier = "a".repeat(43);
    seed_code(&server, "code-1", &verifier).await;

    // Wrong verifier: rejected, and the code is consumed
    let wrong = "b".repeat(43);
    let response = post_token(
        &server,
        &[
            ("grant_type", "authorization_code"),
            ("code", "code-1"),
            ("client_id", "vscode"),
            ("code_verifier", &wrong),
            ("redirect_uri", CLIENT_REDIRECT),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_grant");

    // The correct verifier no longer helps
    let response = post_token(
        &server,
        &[
            ("grant_type", "authorization_code"),
            ("code", "code-1"),
            ("client_id", "vscode"),
            ("code_verifier", &verifier),
            ("redirect_uri", CLIENT_REDIRECT),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_grant");
}

#[tokio::test]
async fn token_endpoint_validates_client_and_binding() {
    let github = spawn_fake_github().await;
    let server = build_test_server(test_config(&github.base_url));
    let verifier = "c".repeat(43);

    // Unsupported grant type
    let response = post_token(&server, &[("grant_type", "client_credentials")]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "unsupported_grant_type"
    );

    // Missing required parameters
    let response = post_token(
        &server,
        &[("grant_type", "authorization_code"), ("code", "code-x")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_request");

    // Unknown client is a 401
    let response = post_token(
        &server,
        &[
            ("grant_type", "authorization_code"),
            ("code", "code-x"),
            ("client_id", "ghost"),
            ("code_verifier", &verifier),
            ("redirect_uri", CLIENT_REDIRECT),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "invalid_client");

    // Redirect URI must match the one bound to the code
    seed_code(&server, "code-2", &verifier).await;
    let response = post_token(
        &server,
        &[
            ("grant_type", "authorization_code"),
            ("code", "code-2"),
            ("client_id", "vscode"),
            ("code_verifier", &verifier),
            ("redirect_uri", "http://127.0.0.1:33418/done"),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_grant");

    // An expired code is absent
    server
        .resources
        .codes
        .store(
            "code-3".into(),
            AuthorizationCode {
                client_id: "vscode".into(),
                redirect_uri: CLIENT_REDIRECT.into(),
                scope: "read:user".into(),
                github_token: "gho_test_token".into(),
                github_login: "octocat".into(),
                code_challenge: pkce::challenge_s256(&verifier),
                code_challenge_method: "S256".into(),
                resource: None,
                expires_at: Utc::now() - Duration::seconds(1),
            },
        )
        .await;
    let response = post_token(
        &server,
        &[
            ("grant_type", "authorization_code"),
            ("code", "code-3"),
            ("client_id", "vscode"),
            ("code_verifier", &verifier),
            ("redirect_uri", CLIENT_REDIRECT),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_grant");
}

#[tokio::test]
async fn bearer_enforcement_on_the_resource_surface() {
    let github = spawn_fake_github().await;
    let server = build_test_server(test_config(&github.base_url));

    // No credentials
    let response = get(&server, "/whoami").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let challenge = response.headers()[header::WWW_AUTHENTICATE]
        .to_str()
        .unwrap()
        .to_owned();
    assert!(challenge.contains("oauth-protected-resource"));

    // Unknown token
    let response = server
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/whoami")
                .header(header::AUTHORIZATION, "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Health stays open
    let response = get(&server, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}
