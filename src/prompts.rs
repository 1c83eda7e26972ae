// ABOUTME: MCP prompt definitions and rendering
// ABOUTME: Provides loan-APR, city-time and daily-fortune prompt templates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

//! Prompt templates exposed through `prompts/list` and `prompts/get`.

use crate::errors::{AppError, AppResult};
use serde::Serialize;
use serde_json::{json, Value};

/// A prompt argument descriptor
#[derive(Debug, Clone, Serialize)]
pub struct PromptArgument {
    /// Argument name
    pub name: &'static str,
    /// What the argument means
    pub description: &'static str,
    /// Whether the argument must be supplied
    pub required: bool,
}

/// A prompt definition
#[derive(Debug, Clone, Serialize)]
pub struct PromptDefinition {
    /// Prompt name used in `prompts/get`
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Accepted arguments
    pub arguments: Vec<PromptArgument>,
}

/// The fixed set of prompts this server offers
#[derive(Default)]
pub struct PromptRegistry;

impl PromptRegistry {
    /// Create the registry
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Definitions for `prompts/list`
    #[must_use]
    pub fn list(&self) -> Vec<PromptDefinition> {
        vec![
            PromptDefinition {
                name: "calculate-loan-apr",
                description: "Walk through estimating the APR of a loan",
                arguments: vec![
                    PromptArgument {
                        name: "principal",
                        description: "Loan principal amount",
                        required: true,
                    },
                    PromptArgument {
                        name: "total_interest",
                        description: "Total interest paid over the loan",
                        required: true,
                    },
                    PromptArgument {
                        name: "term_years",
                        description: "Loan term in years",
                        required: true,
                    },
                ],
            },
            PromptDefinition {
                name: "check-city-time",
                description: "Look up the current time in a supported city",
                arguments: vec![PromptArgument {
                    name: "city",
                    description: "City code: nyc, sf or boston",
                    required: false,
                }],
            },
            PromptDefinition {
                name: "get-daily-fortune",
                description: "Fetch and reflect on a fortune cookie aphorism",
                arguments: vec![],
            },
        ]
    }

    /// Render a prompt for `prompts/get`.
    ///
    /// # Errors
    /// Unknown prompt names are a not-found error.
    pub fn render(&self, name: &str, arguments: &Value) -> AppResult<Value> {
        let arg = |key: &str| {
            arguments
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or("<unspecified>")
                .to_owned()
        };

        let (description, text) = match name {
            "calculate-loan-apr" => (
                "Estimate a loan's APR",
                format!(
                    "Calculate the APR for a loan with principal {}, total interest {} \
                     and a term of {} years. Use the calculate-apr tool for the \
                     monthly-payment estimate and the get-apr tool for the simple \
                     annualized rate, then compare the two.",
                    arg("principal"),
                    arg("total_interest"),
                    arg("term_years"),
                ),
            ),
            "check-city-time" => (
                "Current city time",
                format!(
                    "What time is it right now in {}? Use the get-city-time tool.",
                    arg("city"),
                ),
            ),
            "get-daily-fortune" => (
                "Daily fortune",
                "Fetch today's fortune with the get-fortune tool and offer a short \
                 reflection on it."
                    .to_owned(),
            ),
            other => return Err(AppError::not_found(format!("prompt {other}"))),
        };

        Ok(json!({
            "description": description,
            "messages": [{
                "role": "user",
                "content": { "type": "text", "text": text },
            }],
        }))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn all_three_prompts_are_listed() {
        let registry = PromptRegistry::new();
        let names: Vec<_> = registry.list().iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec!["calculate-loan-apr", "check-city-time", "get-daily-fortune"]
        );
    }

    #[test]
    fn loan_prompt_interpolates_arguments() {
        let registry = PromptRegistry::new();
        let rendered = registry
            .render(
                "calculate-loan-apr",
                &json!({"principal": "10000", "total_interest": "2000", "term_years": "5"}),
            )
            .unwrap();
        let text = rendered["messages"][0]["content"]["text"].as_str().unwrap();
        assert!(text.contains("principal 10000"));
        assert!(text.contains("5 years"));
    }

    #[test]
    fn unknown_prompt_is_not_found() {
        let registry = PromptRegistry::new();
        assert!(registry.render("missing", &json!({})).is_err());
    }
}
