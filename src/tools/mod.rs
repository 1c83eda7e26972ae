// ABOUTME: MCP tool trait, registry and shared output type
// ABOUTME: Tools are trait objects registered at startup and dispatched by name
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

//! MCP tool surface.
//!
//! Each tool implements [`McpTool`] and is registered in a
//! [`ToolRegistry`] at startup. Tools receive the caller's
//! [`AuthenticatedUser`] explicitly; there is no ambient identity.

pub mod apr;
pub mod chat;
pub mod fortune;
pub mod time;

use crate::errors::AppResult;
use crate::middleware::AuthenticatedUser;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub use apr::{CalculateAprTool, SimpleAprTool};
pub use chat::{ChatHistoryTool, ListActiveUsersTool, SendChatMessageTool};
pub use fortune::FortuneTool;
pub use time::CityTimeTool;

/// Result of a tool invocation
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Human-readable text content
    pub text: String,
    /// Optional machine-readable content
    pub structured: Option<Value>,
}

impl ToolOutput {
    /// Text-only output
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            structured: None,
        }
    }

    /// Text plus structured content
    pub fn with_structured(text: impl Into<String>, structured: Value) -> Self {
        Self {
            text: text.into(),
            structured: Some(structured),
        }
    }
}

/// A tool callable through `tools/call`
#[async_trait]
pub trait McpTool: Send + Sync {
    /// Tool name as listed in `tools/list`
    fn name(&self) -> &'static str;

    /// One-line description for clients
    fn description(&self) -> &'static str;

    /// JSON schema of the `arguments` object
    fn input_schema(&self) -> Value;

    /// Execute the tool
    async fn call(&self, args: &Value, user: &AuthenticatedUser) -> AppResult<ToolOutput>;
}

/// Name-indexed set of registered tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<&'static str, Arc<dyn McpTool>>,
    order: Vec<&'static str>,
}

impl ToolRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, keeping list order stable
    pub fn register(&mut self, tool: Arc<dyn McpTool>) {
        let name = tool.name();
        if self.tools.insert(name, tool).is_none() {
            self.order.push(name);
        }
    }

    /// Look up a tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn McpTool>> {
        self.tools.get(name).cloned()
    }

    /// All tools in registration order
    #[must_use]
    pub fn list(&self) -> Vec<Arc<dyn McpTool>> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name).cloned())
            .collect()
    }
}

/// Extract a required f64 argument
pub(crate) fn required_f64(args: &Value, name: &str) -> AppResult<f64> {
    args.get(name)
        .and_then(Value::as_f64)
        .ok_or_else(|| crate::errors::AppError::invalid_input(format!("{name} must be a number")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn registry_preserves_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CityTimeTool));
        registry.register(Arc::new(SimpleAprTool));
        let names: Vec<_> = registry.list().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["get-city-time", "get-apr"]);
        assert!(registry.get("get-city-time").is_some());
        assert!(registry.get("missing").is_none());
    }
}
