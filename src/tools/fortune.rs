// ABOUTME: Fortune tool proxying an external aphorism API
// ABOUTME: Decodes the data/meta envelope and surfaces upstream failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

use crate::errors::{AppError, AppResult};
use crate::middleware::AuthenticatedUser;
use crate::tools::{McpTool, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct FortuneResponse {
    data: FortuneData,
    #[serde(default)]
    meta: Option<FortuneMeta>,
}

#[derive(Debug, Deserialize)]
struct FortuneData {
    message: String,
}

#[derive(Debug, Deserialize)]
struct FortuneMeta {
    #[serde(default)]
    status: Option<i64>,
}

/// Fetches an aphorism from the upstream fortune API
pub struct FortuneTool {
    http: reqwest::Client,
    api_url: String,
}

impl FortuneTool {
    /// Build the tool against the configured fortune API URL.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_url: &str) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .user_agent(concat!("relay-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| AppError::internal(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            api_url: api_url.to_owned(),
        })
    }
}

#[async_trait]
impl McpTool for FortuneTool {
    fn name(&self) -> &'static str {
        "get-fortune"
    }

    fn description(&self) -> &'static str {
        "Fetch a fortune cookie aphorism"
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn call(&self, _args: &Value, _user: &AuthenticatedUser) -> AppResult<ToolOutput> {
        let response = self
            .http
            .get(&self.api_url)
            .send()
            .await
            .map_err(|err| AppError::external_service("fortune", err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(
                "fortune",
                format!("fortune API returned {status}"),
            ));
        }

        let body: FortuneResponse = response
            .json()
            .await
            .map_err(|err| AppError::external_service("fortune", err.to_string()))?;

        let status = body.meta.and_then(|meta| meta.status);
        Ok(ToolOutput::with_structured(
            body.data.message.clone(),
            json!({ "message": body.data.message, "status": status }),
        ))
    }
}
