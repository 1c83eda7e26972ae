// ABOUTME: MCP protocol dispatch over JSON-RPC: initialize, tools and prompts
// ABOUTME: Registers chat sessions on initialize and routes tool calls by name
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

//! Model Context Protocol dispatch.
//!
//! One [`McpServer`] handles every `POST /mcp` request. Protocol-level
//! failures (unknown method, unknown tool, malformed params) become
//! JSON-RPC errors; tool execution failures are reported in-band with
//! `isError: true` per the MCP tool-call contract.

use crate::chat::ChatRelay;
use crate::jsonrpc::{error_codes, JsonRpcRequest, JsonRpcResponse};
use crate::middleware::AuthenticatedUser;
use crate::prompts::PromptRegistry;
use crate::tools::ToolRegistry;
use serde_json::{json, Value};
use std::sync::Arc;

/// Protocol revision implemented by this server
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP request dispatcher
pub struct McpServer {
    tools: Arc<ToolRegistry>,
    prompts: PromptRegistry,
    chat: Arc<ChatRelay>,
}

impl McpServer {
    /// Assemble the dispatcher over the shared registries
    #[must_use]
    pub fn new(tools: Arc<ToolRegistry>, prompts: PromptRegistry, chat: Arc<ChatRelay>) -> Self {
        Self {
            tools,
            prompts,
            chat,
        }
    }

    /// Handle one JSON-RPC message. Notifications return `None`.
    pub async fn handle(
        &self,
        request: JsonRpcRequest,
        user: &AuthenticatedUser,
        session_id: &str,
    ) -> Option<JsonRpcResponse> {
        if request.jsonrpc != crate::jsonrpc::JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                request.id,
                error_codes::INVALID_REQUEST,
                "jsonrpc must be \"2.0\"",
            ));
        }

        // Any traffic counts as activity; stale sessions leave first.
        self.chat.evict_idle().await;
        self.chat.touch(session_id);

        if request.is_notification() {
            tracing::debug!(method = %request.method, "notification received");
            return None;
        }

        let id = request.id.clone();
        let params = request.params.unwrap_or_else(|| json!({}));
        let response = match request.method.as_str() {
            "initialize" => self.initialize(id, user, session_id).await,
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.tools_list(id),
            "tools/call" => self.tools_call(id, &params, user).await,
            "prompts/list" => self.prompts_list(id),
            "prompts/get" => self.prompts_get(id, &params),
            other => {
                tracing::debug!(method = %other, "unknown MCP method");
                JsonRpcResponse::error(
                    id,
                    error_codes::METHOD_NOT_FOUND,
                    format!("unknown method: {other}"),
                )
            }
        };
        Some(response)
    }

    async fn initialize(
        &self,
        id: Option<Value>,
        user: &AuthenticatedUser,
        session_id: &str,
    ) -> JsonRpcResponse {
        // The receiver is dropped here; the registration keeps the
        // session visible to list-active-users until it goes idle.
        let _receiver = self.chat.register(session_id, &user.github_login).await;

        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": {
                    "tools": { "listChanged": false },
                    "prompts": { "listChanged": false },
                },
                "serverInfo": {
                    "name": "relay-mcp-server",
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        )
    }

    fn tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let tools: Vec<Value> = self
            .tools
            .list()
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "inputSchema": tool.input_schema(),
                })
            })
            .collect();
        JsonRpcResponse::success(id, json!({ "tools": tools }))
    }

    async fn tools_call(
        &self,
        id: Option<Value>,
        params: &Value,
        user: &AuthenticatedUser,
    ) -> JsonRpcResponse {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                "tools/call requires a tool name",
            );
        };
        let Some(tool) = self.tools.get(name) else {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("unknown tool: {name}"),
            );
        };
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        tracing::debug!(tool = %name, github_login = %user.github_login, "tool call");
        match tool.call(&arguments, user).await {
            Ok(output) => {
                let mut result = json!({
                    "content": [{ "type": "text", "text": output.text }],
                    "isError": false,
                });
                if let Some(structured) = output.structured {
                    if let Some(map) = result.as_object_mut() {
                        map.insert("structuredContent".into(), structured);
                    }
                }
                JsonRpcResponse::success(id, result)
            }
            Err(error) => {
                tracing::warn!(tool = %name, error = %error, "tool call failed");
                JsonRpcResponse::success(
                    id,
                    json!({
                        "content": [{ "type": "text", "text": error.message }],
                        "isError": true,
                    }),
                )
            }
        }
    }

    fn prompts_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let prompts = self.prompts.list();
        JsonRpcResponse::success(id, json!({ "prompts": prompts }))
    }

    fn prompts_get(&self, id: Option<Value>, params: &Value) -> JsonRpcResponse {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                "prompts/get requires a prompt name",
            );
        };
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
        match self.prompts.render(name, &arguments) {
            Ok(rendered) => JsonRpcResponse::success(id, rendered),
            Err(error) => {
                JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, error.message)
            }
        }
    }
}
