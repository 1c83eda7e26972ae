// ABOUTME: Route modules for the HTTP surface, organized by concern
// ABOUTME: Health, MCP transport and REST conveniences
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

//! HTTP route definitions. The OAuth routes live in
//! [`crate::oauth2::routes`] next to the flow they expose.

pub mod health;
pub mod mcp;
pub mod rest;

pub use health::HealthRoutes;
pub use mcp::McpRoutes;
pub use rest::RestRoutes;
