//! Condition Parsing
//!
//! Turns each if-condition node's text into one structured condition per
//! AND-joined conjunct.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::model::{NodeType, RuleTree};

/// Operators ordered so the multi-character ones match first
const OPERATORS: [&str; 6] = [">=", "<=", "!=", ">", "<", "="];

/// Extract all conditions from the tree's if-condition nodes
pub fn extract_conditions(tree: &RuleTree) -> Vec<Value> {
    let mut conditions = Vec::new();
    for node in tree.nodes_of_type(&NodeType::IfCondition) {
        let start_index = conditions.len();
        conditions.extend(parse_complex_condition(&node.text, "0", start_index));
    }
    info!(count = conditions.len(), "extracted conditions");
    conditions
}

/// Parse an `if (A) AND (B)` rendering into individual conditions
fn parse_complex_condition(input: &str, parent_id: &str, start_index: usize) -> Vec<Value> {
    let cleaned = clean_condition_string(input);
    cleaned
        .split(" AND ")
        .enumerate()
        .map(|(i, part)| {
            let part = part.trim().replace(['(', ')'], "");
            parse_single_condition(part.trim(), parent_id, start_index + i)
        })
        .collect()
}

/// Strip the `if (` prefix and trailing parentheses
fn clean_condition_string(input: &str) -> String {
    let mut cleaned = input.trim();
    if let Some(rest) = cleaned.strip_prefix("if (") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("if(") {
        cleaned = rest;
    }
    cleaned.trim_end_matches(')').to_string()
}

/// Parse one `PROFILE_NAME OPERATOR VALUE` conjunct
fn parse_single_condition(condition_str: &str, parent_id: &str, index: usize) -> Value {
    let mut condition = json!({
        "id": format!("{}_{}", parent_id, index),
        "pid": parent_id,
        "type": "condition",
    });

    if let Some(operator) = OPERATORS.iter().find(|op| condition_str.contains(**op)).copied() {
        let mut parts = condition_str.splitn(2, operator);
        if let (Some(profile_name), Some(value)) = (parts.next(), parts.next()) {
            let profile_name = profile_name.trim();
            let value = value.trim().replace(['\'', '"'], "");
            condition["profile"] = json!({"id": 1000 + index, "name": profile_name});
            condition["operator"] = json!(operator);
            condition["values"] = json!({"value": parse_value(&value)});
            debug!(profile = profile_name, operator, "parsed condition");
        }
    }

    condition
}

/// Numbers become numbers, everything else stays a string
fn parse_value(value: &str) -> Value {
    if value.contains('.') {
        match value.parse::<f64>() {
            Ok(n) => json!(n),
            Err(_) => json!(value),
        }
    } else {
        match value.parse::<i64>() {
            Ok(n) => json!(n),
            Err(_) => json!(value),
        }
    }
}
