// ABOUTME: Loan APR calculator tools using the constant-ratio approximation
// ABOUTME: Validates principal, term and interest inputs before computing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

use crate::errors::{AppError, AppResult};
use crate::middleware::AuthenticatedUser;
use crate::tools::{required_f64, McpTool, ToolOutput};
use async_trait::async_trait;
use serde_json::{json, Value};

const PAYMENTS_PER_YEAR: f64 = 12.0;

fn validate_loan(principal: f64, term_years: f64, total_interest: f64) -> AppResult<()> {
    if principal <= 0.0 {
        return Err(AppError::invalid_input("principal must be positive"));
    }
    if term_years <= 0.0 {
        return Err(AppError::invalid_input("term_years must be positive"));
    }
    if total_interest < 0.0 {
        return Err(AppError::invalid_input("total_interest cannot be negative"));
    }
    Ok(())
}

fn loan_args(args: &Value) -> AppResult<(f64, f64, f64)> {
    let principal = required_f64(args, "principal")?;
    let total_interest = required_f64(args, "total_interest")?;
    let term_years = required_f64(args, "term_years")?;
    validate_loan(principal, term_years, total_interest)?;
    Ok((principal, total_interest, term_years))
}

fn loan_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "principal": {"type": "number", "description": "Loan principal amount"},
            "total_interest": {"type": "number", "description": "Total interest paid over the loan"},
            "term_years": {"type": "number", "description": "Loan term in years"},
        },
        "required": ["principal", "total_interest", "term_years"],
    })
}

/// Constant-ratio APR estimate for a monthly-payment loan
pub struct CalculateAprTool;

#[async_trait]
impl McpTool for CalculateAprTool {
    fn name(&self) -> &'static str {
        "calculate-apr"
    }

    fn description(&self) -> &'static str {
        "Estimate the APR of a monthly-payment loan (constant-ratio method)"
    }

    fn input_schema(&self) -> Value {
        loan_schema()
    }

    async fn call(&self, args: &Value, _user: &AuthenticatedUser) -> AppResult<ToolOutput> {
        let (principal, total_interest, term_years) = loan_args(args)?;
        let total_payments = term_years * PAYMENTS_PER_YEAR;
        let apr = (2.0 * PAYMENTS_PER_YEAR * total_interest)
            / (principal * (total_payments + 1.0))
            * 100.0;

        Ok(ToolOutput::with_structured(
            format!("The estimated APR is {apr:.2}%"),
            json!({
                "apr_percent": apr,
                "principal": principal,
                "total_interest": total_interest,
                "term_years": term_years,
                "payments_per_year": PAYMENTS_PER_YEAR,
            }),
        ))
    }
}

/// Simple annualized interest rate, no payment schedule
pub struct SimpleAprTool;

#[async_trait]
impl McpTool for SimpleAprTool {
    fn name(&self) -> &'static str {
        "get-apr"
    }

    fn description(&self) -> &'static str {
        "Compute the simple annualized interest rate of a loan"
    }

    fn input_schema(&self) -> Value {
        loan_schema()
    }

    async fn call(&self, args: &Value, _user: &AuthenticatedUser) -> AppResult<ToolOutput> {
        let (principal, total_interest, term_years) = loan_args(args)?;
        let apr = total_interest / principal / term_years * 100.0;

        Ok(ToolOutput::with_structured(
            format!("The simple annual rate is {apr:.2}%"),
            json!({
                "apr_percent": apr,
                "principal": principal,
                "total_interest": total_interest,
                "term_years": term_years,
            }),
        ))
    }
}
