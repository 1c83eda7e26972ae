// ABOUTME: Server binary: parses CLI flags, loads config and runs the HTTP server
// ABOUTME: Flags override environment-provided host and port
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

#![allow(clippy::print_stderr)]

use anyhow::{Context, Result};
use clap::Parser;
use relay_mcp_server::{logging, serve, Config, ServerResources};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "relay-mcp-server",
    about = "MCP tool server behind GitHub-backed OAuth 2.1",
    version
)]
struct Args {
    /// Bind host (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(&args.log_level)?;

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    config.validate().context("invalid configuration")?;

    if !config.oauth_enabled {
        tracing::warn!("OAuth is disabled; all requests run as an anonymous identity");
    }

    let resources = Arc::new(ServerResources::new(config)?);
    serve(resources).await
}
