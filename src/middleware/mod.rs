// ABOUTME: HTTP middleware for authentication and CORS
// ABOUTME: Bearer-token enforcement and cross-origin configuration for the HTTP surface
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

pub mod auth;
pub mod cors;

pub use auth::{authenticate, require_auth, AuthenticatedUser};
pub use cors::setup_cors;
