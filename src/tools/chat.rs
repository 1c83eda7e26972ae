// ABOUTME: Chat relay tools: send messages, read history, list active users
// ABOUTME: Messages are attributed to the authenticated GitHub login
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

use crate::chat::ChatRelay;
use crate::errors::{AppError, AppResult};
use crate::middleware::AuthenticatedUser;
use crate::tools::{McpTool, ToolOutput};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_HISTORY_LIMIT: u64 = 20;
const MAX_HISTORY_LIMIT: u64 = 100;

/// Broadcast a message to every connected chat session
pub struct SendChatMessageTool {
    relay: Arc<ChatRelay>,
}

impl SendChatMessageTool {
    /// Bind the tool to the shared relay
    #[must_use]
    pub fn new(relay: Arc<ChatRelay>) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl McpTool for SendChatMessageTool {
    fn name(&self) -> &'static str {
        "send-chat-message"
    }

    fn description(&self) -> &'static str {
        "Send a message to the shared chat as your GitHub login"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {"type": "string", "description": "Message text to broadcast"},
            },
            "required": ["message"],
        })
    }

    async fn call(&self, args: &Value, user: &AuthenticatedUser) -> AppResult<ToolOutput> {
        let message = args
            .get("message")
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AppError::invalid_input("message must be a non-empty string"))?;

        let sent = self.relay.broadcast(&user.github_login, message).await;
        Ok(ToolOutput::with_structured(
            format!("Message sent as {}", user.github_login),
            json!({ "id": sent.id, "sender": sent.sender, "timestamp": sent.timestamp }),
        ))
    }
}

/// Read recent chat history
pub struct ChatHistoryTool {
    relay: Arc<ChatRelay>,
}

impl ChatHistoryTool {
    /// Bind the tool to the shared relay
    #[must_use]
    pub fn new(relay: Arc<ChatRelay>) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl McpTool for ChatHistoryTool {
    fn name(&self) -> &'static str {
        "get-chat-history"
    }

    fn description(&self) -> &'static str {
        "Get recent chat messages (default 20, max 100)"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "integer",
                    "description": "Number of messages to return",
                    "minimum": 1,
                    "maximum": MAX_HISTORY_LIMIT,
                },
            },
        })
    }

    async fn call(&self, args: &Value, _user: &AuthenticatedUser) -> AppResult<ToolOutput> {
        let limit = args
            .get("limit")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);

        let messages = self.relay.history(limit as usize).await;
        let formatted = if messages.is_empty() {
            "No chat messages yet".to_owned()
        } else {
            messages
                .iter()
                .map(|m| format!("[{}] {}: {}", m.timestamp.format("%H:%M:%S"), m.sender, m.message))
                .collect::<Vec<_>>()
                .join("\n")
        };

        Ok(ToolOutput::with_structured(
            formatted,
            json!({ "messages": messages, "count": messages.len() }),
        ))
    }
}

/// List logins currently connected to the relay
pub struct ListActiveUsersTool {
    relay: Arc<ChatRelay>,
}

impl ListActiveUsersTool {
    /// Bind the tool to the shared relay
    #[must_use]
    pub fn new(relay: Arc<ChatRelay>) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl McpTool for ListActiveUsersTool {
    fn name(&self) -> &'static str {
        "list-active-users"
    }

    fn description(&self) -> &'static str {
        "List users currently connected to the chat"
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn call(&self, _args: &Value, _user: &AuthenticatedUser) -> AppResult<ToolOutput> {
        let users = self.relay.active_users();
        let text = if users.is_empty() {
            "No users are currently connected".to_owned()
        } else {
            format!("Active users: {}", users.join(", "))
        };
        Ok(ToolOutput::with_structured(
            text,
            json!({ "users": users, "count": users.len() }),
        ))
    }
}
