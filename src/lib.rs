// ABOUTME: Library entry point for the relay MCP server
// ABOUTME: MCP tool surface (time, APR, fortune, chat) behind GitHub-backed OAuth 2.1
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

#![deny(unsafe_code)]

//! # Relay MCP Server
//!
//! An HTTP server exposing a small Model Context Protocol tool surface
//! behind a GitHub-backed OAuth 2.1 authorization layer.
//!
//! The server acts as an authorization-server proxy: MCP clients run a
//! standard authorization-code + PKCE flow against it, the resource
//! owner authenticates with GitHub, and the issued bearer tokens are
//! opaque references to server-side records that carry the upstream
//! GitHub token. Every authenticated request re-verifies that upstream
//! token through a TTL-bounded cache.
//!
//! ## Modules
//!
//! - [`oauth2`] — authorization flow, PKCE, client registration, stores,
//!   GitHub integration and metadata endpoints
//! - [`mcp`] — JSON-RPC dispatch for tools and prompts
//! - [`tools`] — the tool implementations
//! - [`chat`] — the in-memory chat relay
//! - [`middleware`] — bearer authentication and CORS
//! - [`server`] — resource wiring and the serve loop

/// In-memory chat relay
pub mod chat;
/// Environment-driven configuration
pub mod config;
/// Random tokens and secret hashing
pub mod crypto;
/// Unified error types
pub mod errors;
/// JSON-RPC 2.0 framing
pub mod jsonrpc;
/// Structured logging setup
pub mod logging;
/// MCP protocol dispatch
pub mod mcp;
/// HTTP middleware
pub mod middleware;
/// OAuth 2.1 authorization layer
pub mod oauth2;
/// MCP prompt templates
pub mod prompts;
/// HTTP route definitions
pub mod routes;
/// Server assembly and serve loop
pub mod server;
/// MCP tool implementations
pub mod tools;

pub use config::Config;
pub use errors::{AppError, AppResult, ErrorCode};
pub use server::{build_router, serve, ServerResources};
