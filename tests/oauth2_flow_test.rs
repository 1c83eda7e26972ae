// ABOUTME: End-to-end OAuth flow test: authorize, callback, token, authenticated request
// ABOUTME: Runs against an in-process router with a local fake GitHub upstream
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::body::Body;
use common::{body_json, build_test_server, location_params, spawn_fake_github, test_config};
use http::{header, Request, StatusCode};
use tower::ServiceExt;

// RFC 7636 appendix B verifier/challenge pair
const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
const CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";
const CLIENT_REDIRECT: &str = "http://127.0.0.1:33418";

fn authorize_uri(challenge: &str) -> String {
    let query = serde_urlencoded::to_string([
        ("response_type", "code"),
        ("client_id", "vscode"),
        ("redirect_uri", CLIENT_REDIRECT),
        ("scope", "mcp:tools mcp:resources read:user"),
        ("state", "client-csrf-state"),
        ("code_challenge", challenge),
        ("code_challenge_method", "S256"),
    ])
    .unwrap();
    format!("/oauth/authorize?{query}")
}

fn token_body(code: &str, verifier: &str) -> String {
    serde_urlencoded::to_string([
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", "vscode"),
        ("code_verifier", verifier),
        ("redirect_uri", CLIENT_REDIRECT),
    ])
    .unwrap()
}

#[tokio::test]
async fn full_authorization_code_flow() {
    let github = spawn_fake_github().await;
    let server = build_test_server(test_config(&github.base_url));

    // Step 1: the client is sent to GitHub with an internal state
    let response = server
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(authorize_uri(CHALLENGE))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_owned();
    assert!(location.starts_with("https://github.com/login/oauth/authorize"));
    let github_params = location_params(&location);
    assert_eq!(github_params["client_id"], "test_gh_client");
    assert_eq!(github_params["scope"], "read:user");
    assert_eq!(
        github_params["redirect_uri"],
        "http://localhost:8080/oauth/callback"
    );
    let internal_state = github_params["state"].clone();
    assert!(!internal_state.is_empty());
    assert_ne!(internal_state, "client-csrf-state");

    // Step 2: GitHub calls back; the server mints a one-time code
    let callback_uri = format!(
        "/oauth/callback?code=upstream-code&state={}",
        urlencoding::encode(&internal_state)
    );
    let response = server
        .router
        .clone()
        .oneshot(Request::builder().uri(callback_uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_owned();
    assert!(location.starts_with(CLIENT_REDIRECT));
    let client_params = location_params(&location);
    assert_eq!(client_params["state"], "client-csrf-state");
    let code = client_params["code"].clone();

    // Step 3: the code plus PKCE verifier buys an access token
    let response = server
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/oauth/token")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(token_body(&code, VERIFIER)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    assert_eq!(response.headers()[header::PRAGMA], "no-cache");
    let token = body_json(response).await;
    assert_eq!(token["token_type"], "Bearer");
    assert_eq!(token["expires_in"], 3600);
    assert_eq!(token["scope"], "mcp:tools mcp:resources read:user");
    let access_token = token["access_token"].as_str().unwrap().to_owned();
    assert!(!access_token.is_empty());

    // Step 4: the token authenticates against the resource surface
    let response = server
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/whoami")
                .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let whoami = body_json(response).await;
    assert_eq!(whoami["github_login"], "octocat");
    // read:user is always granted; `repo` maps to mcp:resources
    let scopes: Vec<&str> = whoami["scopes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    assert_eq!(scopes, vec!["read:user", "mcp:resources"]);

    // Step 5: the code was one-time; replaying it fails
    let response = server
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/oauth/token")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(token_body(&code, VERIFIER)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_grant");
}

#[tokio::test]
async fn callback_consumes_the_state() {
    let github = spawn_fake_github().await;
    let server = build_test_server(test_config(&github.base_url));

    let response = server
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(authorize_uri(CHALLENGE))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_owned();
    let internal_state = location_params(&location)["state"].clone();

    let callback_uri = format!(
        "/oauth/callback?code=upstream-code&state={}",
        urlencoding::encode(&internal_state)
    );
    let response = server
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(callback_uri.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    // Replaying the callback with the same state must fail directly
    let response = server
        .router
        .clone()
        .oneshot(Request::builder().uri(callback_uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_request");
}

#[tokio::test]
async fn token_issued_through_flow_expires_with_config() {
    let github = spawn_fake_github().await;
    let mut config = test_config(&github.base_url);
    config.token_expiry = chrono::Duration::seconds(120);
    let server = build_test_server(config);

    let response = server
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(authorize_uri(CHALLENGE))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_owned();
    let internal_state = location_params(&location)["state"].clone();

    let response = server
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/oauth/callback?code=upstream-code&state={}",
                    urlencoding::encode(&internal_state)
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let code =
        location_params(response.headers()[header::LOCATION].to_str().unwrap())["code"].clone();

    let response = server
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/oauth/token")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(token_body(&code, VERIFIER)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await["expires_in"], 120);
}
