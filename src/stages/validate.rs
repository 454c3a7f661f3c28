//! Input Validation
//!
//! Single pass/fail check on the raw policy text before any transform call
//! is spent on it. Not consistency-gated.

use serde::Serialize;

/// Shortest input that can plausibly describe a campaign rule
const MIN_INPUT_LEN: usize = 12;

/// Outcome of input validation
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

/// Validate the raw input text
pub fn validate_input(input: &str) -> ValidationReport {
    let trimmed = input.trim();
    let mut issues = Vec::new();

    if trimmed.is_empty() {
        issues.push("input is empty".to_string());
    } else {
        if trimmed.len() < MIN_INPUT_LEN {
            issues.push("input is too short to describe a campaign rule".to_string());
        }
        if !trimmed.chars().any(|c| c.is_alphabetic()) {
            issues.push("input contains no readable text".to_string());
        }
    }

    ValidationReport {
        is_valid: issues.is_empty(),
        issues,
    }
}
