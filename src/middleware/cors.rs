// ABOUTME: CORS middleware configuration for the HTTP surface
// ABOUTME: Builds a tower-http CorsLayer from the configured origin allow-list
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

use crate::config::Config;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Build the CORS layer from configuration.
///
/// `CORS_ALLOWED_ORIGINS` of `*` (or empty) allows any origin; otherwise
/// it is a comma-separated allow-list. Unparseable entries are skipped
/// with a warning rather than failing startup.
#[must_use]
pub fn setup_cors(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return layer.allow_origin(Any);
    }

    let origins: Vec<_> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(origin = %origin, error = %err, "skipping invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
