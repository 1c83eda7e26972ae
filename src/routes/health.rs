// ABOUTME: Health check routes for liveness monitoring
// ABOUTME: Unauthenticated JSON status endpoint for load balancers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

use axum::routing::get;
use axum::{Json, Router};

/// Health routes
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health check routes
    #[must_use]
    pub fn routes() -> Router {
        async fn health_handler() -> Json<serde_json::Value> {
            Json(serde_json::json!({
                "status": "healthy",
                "service": "relay-mcp-server",
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }))
        }

        Router::new().route("/health", get(health_handler))
    }
}
