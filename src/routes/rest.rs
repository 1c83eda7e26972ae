// ABOUTME: Bearer-gated REST conveniences: city time lookup and identity echo
// ABOUTME: Thin wrappers over the tool registry and the request identity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

use crate::errors::AppError;
use crate::middleware::AuthenticatedUser;
use crate::server::ServerResources;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct TimeQuery {
    city: Option<String>,
}

/// REST convenience routes
pub struct RestRoutes;

impl RestRoutes {
    /// Create the REST router
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/time", get(time_handler))
            .route("/whoami", get(whoami_handler))
            .with_state(resources)
    }
}

async fn time_handler(
    State(resources): State<Arc<ServerResources>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<TimeQuery>,
) -> Response {
    let Some(tool) = resources.tools.get("get-city-time") else {
        return AppError::internal("time tool is not registered").into_response();
    };
    let args = match query.city {
        Some(city) => json!({ "city": city }),
        None => json!({}),
    };
    match tool.call(&args, &user).await {
        Ok(output) => {
            let body = output
                .structured
                .unwrap_or_else(|| json!({ "text": output.text }));
            Json(body).into_response()
        }
        Err(error) => error.into_response(),
    }
}

async fn whoami_handler(Extension(user): Extension<AuthenticatedUser>) -> Json<serde_json::Value> {
    Json(json!({
        "github_login": user.github_login,
        "scopes": user.scopes,
        "client_id": user.client_id,
    }))
}
