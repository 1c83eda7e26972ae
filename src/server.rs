// ABOUTME: Server resource wiring, router assembly and serve loop
// ABOUTME: Injects stores and upstream clients so tests can assemble them independently
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

//! Server assembly.
//!
//! [`ServerResources`] owns every shared component behind `Arc`s and is
//! handed to each router as axum state. Stores are injected through
//! [`ServerResources::from_parts`], which integration tests use to build
//! a server around pre-populated stores.

use crate::chat::ChatRelay;
use crate::config::Config;
use crate::errors::AppResult;
use crate::mcp::McpServer;
use crate::middleware::{require_auth, setup_cors};
use crate::oauth2::endpoints::OAuth2Flow;
use crate::oauth2::github::GitHubClient;
use crate::oauth2::registration::ClientRegistrationManager;
use crate::oauth2::routes::OAuth2Routes;
use crate::oauth2::store::{AuthCodeStore, ClientStore, StateStore, TokenStore};
use crate::prompts::PromptRegistry;
use crate::routes::{HealthRoutes, McpRoutes, RestRoutes};
use crate::tools::{
    CalculateAprTool, ChatHistoryTool, CityTimeTool, FortuneTool, ListActiveUsersTool,
    SendChatMessageTool, SimpleAprTool, ToolRegistry,
};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared server state handed to every router
pub struct ServerResources {
    /// Server configuration
    pub config: Arc<Config>,
    /// Registered OAuth clients
    pub clients: Arc<ClientStore>,
    /// Pending authorization states
    pub states: Arc<StateStore>,
    /// One-time authorization codes
    pub codes: Arc<AuthCodeStore>,
    /// Issued access tokens
    pub tokens: Arc<TokenStore>,
    /// GitHub upstream client with its validation cache
    pub github: Arc<GitHubClient>,
    /// The OAuth flow over the stores above
    pub oauth: OAuth2Flow,
    /// Dynamic client registration
    pub registration: ClientRegistrationManager,
    /// Registered MCP tools
    pub tools: Arc<ToolRegistry>,
    /// MCP dispatcher
    pub mcp: McpServer,
    /// Shared chat relay
    pub chat: Arc<ChatRelay>,
}

impl ServerResources {
    /// Assemble resources with default (empty, pre-seeded) stores.
    ///
    /// # Errors
    /// Fails when an HTTP client cannot be built.
    pub fn new(config: Config) -> AppResult<Self> {
        Self::from_parts(
            Arc::new(config),
            Arc::new(ClientStore::with_defaults()),
            Arc::new(StateStore::new()),
            Arc::new(AuthCodeStore::new()),
            Arc::new(TokenStore::new()),
        )
    }

    /// Assemble resources around injected stores.
    ///
    /// # Errors
    /// Fails when an HTTP client cannot be built.
    pub fn from_parts(
        config: Arc<Config>,
        clients: Arc<ClientStore>,
        states: Arc<StateStore>,
        codes: Arc<AuthCodeStore>,
        tokens: Arc<TokenStore>,
    ) -> AppResult<Self> {
        let github = Arc::new(GitHubClient::new(&config)?);
        let oauth = OAuth2Flow::new(
            Arc::clone(&config),
            Arc::clone(&clients),
            Arc::clone(&states),
            Arc::clone(&codes),
            Arc::clone(&tokens),
            Arc::clone(&github),
        );
        let registration =
            ClientRegistrationManager::new(Arc::clone(&clients), config.allow_public_clients);

        let chat = Arc::new(ChatRelay::new());
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(CityTimeTool));
        tools.register(Arc::new(CalculateAprTool));
        tools.register(Arc::new(SimpleAprTool));
        tools.register(Arc::new(FortuneTool::new(&config.fortune_api_url)?));
        tools.register(Arc::new(SendChatMessageTool::new(Arc::clone(&chat))));
        tools.register(Arc::new(ChatHistoryTool::new(Arc::clone(&chat))));
        tools.register(Arc::new(ListActiveUsersTool::new(Arc::clone(&chat))));
        let tools = Arc::new(tools);

        let mcp = McpServer::new(Arc::clone(&tools), PromptRegistry::new(), Arc::clone(&chat));

        Ok(Self {
            config,
            clients,
            states,
            codes,
            tokens,
            github,
            oauth,
            registration,
            tools,
            mcp,
            chat,
        })
    }
}

/// Assemble the full application router.
///
/// Health and the OAuth surface are open; the MCP and REST routes sit
/// behind the bearer middleware.
pub fn build_router(resources: &Arc<ServerResources>) -> Router {
    let protected = Router::new()
        .merge(McpRoutes::routes(Arc::clone(resources)))
        .merge(RestRoutes::routes(Arc::clone(resources)))
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(resources),
            require_auth,
        ));

    Router::new()
        .merge(HealthRoutes::routes())
        .merge(OAuth2Routes::routes(Arc::clone(resources)))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(setup_cors(&resources.config))
}

/// Bind and serve until ctrl-c.
///
/// # Errors
/// Fails when the listen address cannot be bound.
pub async fn serve(resources: Arc<ServerResources>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", resources.config.host, resources.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        addr = %addr,
        server_url = %resources.config.server_url,
        oauth_enabled = resources.config.oauth_enabled,
        "server listening"
    );

    let router = build_router(&resources);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install ctrl-c handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
