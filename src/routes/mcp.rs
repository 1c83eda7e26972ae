// ABOUTME: HTTP framing for the MCP JSON-RPC endpoint
// ABOUTME: Manages the Mcp-Session-Id header and maps notifications to 202
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

//! `POST /mcp` carries JSON-RPC messages. The server assigns an
//! `Mcp-Session-Id` on the first request and clients echo it back;
//! the chat relay uses it to track live sessions.

use crate::jsonrpc::JsonRpcRequest;
use crate::middleware::AuthenticatedUser;
use crate::server::ServerResources;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Extension, Json, Router};
use http::{HeaderMap, StatusCode};
use std::sync::Arc;
use uuid::Uuid;

/// Session header name
pub const SESSION_HEADER: &str = "mcp-session-id";

/// MCP transport routes
pub struct McpRoutes;

impl McpRoutes {
    /// Create the MCP endpoint router
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/mcp", post(mcp_handler))
            .with_state(resources)
    }
}

async fn mcp_handler(
    State(resources): State<Arc<ServerResources>>,
    Extension(user): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    Json(request): Json<JsonRpcRequest>,
) -> Response {
    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);

    let response = resources.mcp.handle(request, &user, &session_id).await;
    let session_header = [(SESSION_HEADER, session_id)];
    match response {
        Some(body) => (StatusCode::OK, session_header, Json(body)).into_response(),
        None => (StatusCode::ACCEPTED, session_header).into_response(),
    }
}
