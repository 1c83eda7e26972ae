// ABOUTME: Environment-driven server configuration with validation
// ABOUTME: Covers server URL, GitHub OAuth credentials, token expiry and feature toggles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

//! Server configuration loaded from environment variables.
//!
//! All knobs come from the environment; there is no config file. See
//! [`Config::from_env`] for the variable list. [`Config::validate`]
//! enforces HTTPS for public deployments and requires GitHub credentials
//! whenever OAuth is enabled.

use anyhow::{Context, Result};
use chrono::Duration;
use url::Url;

/// Default access-token lifetime in seconds
pub const DEFAULT_TOKEN_EXPIRY_SECS: i64 = 3600;

/// Scopes granted when a client does not request any
pub const DEFAULT_SCOPES: &str = "mcp:tools mcp:resources read:user";

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Externally visible base URL, no trailing slash
    pub server_url: String,
    /// Bind address host
    pub host: String,
    /// Bind address port
    pub port: u16,
    /// GitHub OAuth app client id
    pub github_client_id: String,
    /// GitHub OAuth app client secret
    pub github_client_secret: String,
    /// Master switch for the OAuth layer
    pub oauth_enabled: bool,
    /// Whether POST /register accepts new clients
    pub enable_dcr: bool,
    /// Whether clients with no secret may register
    pub allow_public_clients: bool,
    /// Reject non-HTTPS server URLs (localhost exempt)
    pub enforce_https: bool,
    /// Access-token lifetime, also bounds the validation cache
    pub token_expiry: Duration,
    /// Scopes the authorization server advertises and accepts
    pub scopes_supported: Vec<String>,
    /// GitHub REST API base, overridable for tests
    pub github_api_url: String,
    /// GitHub authorization page URL
    pub github_auth_url: String,
    /// GitHub code-for-token exchange URL
    pub github_token_url: String,
    /// Upstream fortune API URL
    pub fortune_api_url: String,
    /// Comma-separated CORS allow-list, `*` or empty for any origin
    pub cors_allowed_origins: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".into(),
            host: "127.0.0.1".into(),
            port: 8080,
            github_client_id: String::new(),
            github_client_secret: String::new(),
            oauth_enabled: true,
            enable_dcr: true,
            allow_public_clients: true,
            enforce_https: false,
            token_expiry: Duration::seconds(DEFAULT_TOKEN_EXPIRY_SECS),
            scopes_supported: DEFAULT_SCOPES.split(' ').map(str::to_owned).collect(),
            github_api_url: "https://api.github.com".into(),
            github_auth_url: "https://github.com/login/oauth/authorize".into(),
            github_token_url: "https://github.com/login/oauth/access_token".into(),
            fortune_api_url: "https://aphorismcookie.herokuapp.com/".into(),
            cors_allowed_origins: "*".into(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Recognized variables:
    /// - `MCP_SERVER_URL`, or `HOST` + `PORT` + `USE_HTTPS` to derive it
    /// - `GITHUB_CLIENT_ID`, `GITHUB_CLIENT_SECRET`
    /// - `OAUTH_ENABLED`, `ENABLE_DCR`, `ALLOW_PUBLIC_CLIENTS`, `ENFORCE_HTTPS`
    /// - `TOKEN_EXPIRY_SECONDS` (default 3600)
    /// - `OAUTH_SCOPES_SUPPORTED` (space-separated)
    /// - `GITHUB_API_URL`, `GITHUB_AUTH_URL`, `GITHUB_TOKEN_URL`
    /// - `FORTUNE_API_URL`, `CORS_ALLOWED_ORIGINS`
    ///
    /// # Errors
    /// Returns an error when a variable is present but unparseable.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or(defaults.host);
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().context("PORT must be a valid port number")?,
            Err(_) => defaults.port,
        };
        let use_https = env_bool("USE_HTTPS", false)?;
        let server_url = match std::env::var("MCP_SERVER_URL") {
            Ok(url) => url.trim_end_matches('/').to_owned(),
            Err(_) => {
                let scheme = if use_https { "https" } else { "http" };
                format!("{scheme}://{host}:{port}")
            }
        };

        let token_expiry_secs = match std::env::var("TOKEN_EXPIRY_SECONDS") {
            Ok(raw) => raw
                .parse()
                .context("TOKEN_EXPIRY_SECONDS must be an integer")?,
            Err(_) => DEFAULT_TOKEN_EXPIRY_SECS,
        };

        let scopes_supported = std::env::var("OAUTH_SCOPES_SUPPORTED")
            .map_or(defaults.scopes_supported, |raw| {
                raw.split_whitespace().map(str::to_owned).collect()
            });

        Ok(Self {
            server_url,
            host,
            port,
            github_client_id: std::env::var("GITHUB_CLIENT_ID").unwrap_or_default(),
            github_client_secret: std::env::var("GITHUB_CLIENT_SECRET").unwrap_or_default(),
            oauth_enabled: env_bool("OAUTH_ENABLED", defaults.oauth_enabled)?,
            enable_dcr: env_bool("ENABLE_DCR", defaults.enable_dcr)?,
            allow_public_clients: env_bool("ALLOW_PUBLIC_CLIENTS", defaults.allow_public_clients)?,
            enforce_https: env_bool("ENFORCE_HTTPS", defaults.enforce_https)?,
            token_expiry: Duration::seconds(token_expiry_secs),
            scopes_supported,
            github_api_url: env_or("GITHUB_API_URL", &defaults.github_api_url),
            github_auth_url: env_or("GITHUB_AUTH_URL", &defaults.github_auth_url),
            github_token_url: env_or("GITHUB_TOKEN_URL", &defaults.github_token_url),
            fortune_api_url: env_or("FORTUNE_API_URL", &defaults.fortune_api_url),
            cors_allowed_origins: env_or("CORS_ALLOWED_ORIGINS", &defaults.cors_allowed_origins),
        })
    }

    /// Validate the configuration for serving.
    ///
    /// # Errors
    /// Returns an error when the server URL is malformed, when HTTPS
    /// enforcement is violated by a non-local URL, or when OAuth is
    /// enabled without GitHub credentials.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.server_url)
            .with_context(|| format!("invalid server URL: {}", self.server_url))?;

        if self.enforce_https && url.scheme() != "https" {
            let host = url.host_str().unwrap_or_default();
            let local = host == "localhost" || host == "127.0.0.1" || host == "::1";
            if !local {
                anyhow::bail!("ENFORCE_HTTPS is set but server URL {url} is not https");
            }
        }

        if self.oauth_enabled
            && (self.github_client_id.is_empty() || self.github_client_secret.is_empty())
        {
            anyhow::bail!("GITHUB_CLIENT_ID and GITHUB_CLIENT_SECRET are required when OAuth is enabled");
        }

        Ok(())
    }

    /// Callback URL registered with the GitHub OAuth app
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}/oauth/callback", self.server_url)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_bool(key: &str, default: bool) -> Result<bool> {
    match std::env::var(key) {
        Ok(raw) => match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            other => anyhow::bail!("{key} must be a boolean, got {other:?}"),
        },
        Err(_) => Ok(default),
    }
}
