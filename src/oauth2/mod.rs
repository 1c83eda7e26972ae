// ABOUTME: OAuth 2.1 authorization layer with GitHub as the upstream identity provider
// ABOUTME: Provides PKCE, dynamic client registration, TTL stores and metadata endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

//! OAuth 2.1 authorization layer.
//!
//! The server acts as an authorization-server proxy in front of GitHub:
//! clients run a standard code + PKCE flow against this server, which in
//! turn sends the resource owner through GitHub's OAuth app flow. Issued
//! access tokens are opaque references to server-side records carrying
//! the upstream GitHub token, which is re-verified (with caching) on
//! every authenticated request.

pub mod endpoints;
pub mod github;
pub mod models;
pub mod pkce;
pub mod registration;
pub mod routes;
pub mod store;

pub use endpoints::{AuthorizeOutcome, OAuth2Flow, TokenError};
pub use github::{GitHubClient, GitHubUser, ValidationCache, VerifiedIdentity};
pub use models::{
    AccessTokenRecord, AuthorizationCode, AuthorizationState, OAuth2Error, RegisteredClient,
    TokenResponse,
};
pub use registration::ClientRegistrationManager;
pub use routes::OAuth2Routes;
pub use store::{AuthCodeStore, ClientStore, StateStore, TokenStore};
