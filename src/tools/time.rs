// ABOUTME: City time lookup tool over a fixed timezone table
// ABOUTME: Supports nyc, sf and boston with nyc as the default
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

use crate::errors::{AppError, AppResult};
use crate::middleware::AuthenticatedUser;
use crate::tools::{McpTool, ToolOutput};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use chrono_tz::Tz;
use serde_json::{json, Value};

const DEFAULT_CITY: &str = "nyc";

fn city_timezone(city: &str) -> Option<Tz> {
    match city {
        "nyc" | "boston" => Some(chrono_tz::America::New_York),
        "sf" => Some(chrono_tz::America::Los_Angeles),
        _ => None,
    }
}

/// Reports the current wall-clock time in a supported city
pub struct CityTimeTool;

#[async_trait]
impl McpTool for CityTimeTool {
    fn name(&self) -> &'static str {
        "get-city-time"
    }

    fn description(&self) -> &'static str {
        "Get the current time in a city (nyc, sf, boston)"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "City code: nyc, sf or boston (default nyc)",
                    "enum": ["nyc", "sf", "boston"],
                }
            },
        })
    }

    async fn call(&self, args: &Value, _user: &AuthenticatedUser) -> AppResult<ToolOutput> {
        let city = args
            .get("city")
            .and_then(Value::as_str)
            .map_or_else(|| DEFAULT_CITY.to_owned(), str::to_lowercase);

        let Some(timezone) = city_timezone(&city) else {
            return Err(AppError::invalid_input(format!("unknown city: {city}")));
        };
        let local_time = Utc::now()
            .with_timezone(&timezone)
            .to_rfc3339_opts(SecondsFormat::Secs, false);

        Ok(ToolOutput::with_structured(
            format!("The current time in {city} is {local_time}"),
            json!({ "city": city, "time": local_time, "timezone": timezone.name() }),
        ))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn sf_uses_pacific_time() {
        let user = AuthenticatedUser::anonymous();
        let output = CityTimeTool
            .call(&json!({"city": "SF"}), &user)
            .await
            .unwrap();
        assert!(output.text.starts_with("The current time in sf is "));
        let structured = output.structured.unwrap();
        assert_eq!(structured["timezone"], "America/Los_Angeles");
    }

    #[tokio::test]
    async fn missing_city_defaults_to_nyc() {
        let user = AuthenticatedUser::anonymous();
        let output = CityTimeTool.call(&json!({}), &user).await.unwrap();
        assert!(output.text.contains("in nyc is"));
        assert_eq!(output.structured.unwrap()["timezone"], "America/New_York");
    }

    #[tokio::test]
    async fn unknown_city_is_rejected() {
        let user = AuthenticatedUser::anonymous();
        let error = CityTimeTool
            .call(&json!({"city": "chicago"}), &user)
            .await
            .unwrap_err();
        assert_eq!(error.code, crate::errors::ErrorCode::InvalidInput);
        assert!(error.message.contains("unknown city: chicago"));
    }

    #[tokio::test]
    async fn boston_shares_eastern_time() {
        let user = AuthenticatedUser::anonymous();
        let output = CityTimeTool
            .call(&json!({"city": "boston"}), &user)
            .await
            .unwrap();
        assert_eq!(output.structured.unwrap()["timezone"], "America/New_York");
    }
}
