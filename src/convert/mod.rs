//! Text-to-Structured Conversion
//!
//! Deterministic parsers that walk the finished tree and assemble the
//! addressable rule JSON. Unparseable nodes are skipped with a log line;
//! conversion itself never fails.

mod action;
mod builder;
mod condition;
mod schedule;

pub use builder::RuleJsonBuilder;

use serde_json::Value;

use crate::model::RuleTree;

/// Render the finished tree into the rule JSON document:
/// `[{"detail": {"rules": {"id": "0", "pid": "#", "childrens": [...]}}}]`
pub fn render_rule_json(tree: &RuleTree) -> Value {
    RuleJsonBuilder::new()
        .with_conditions(condition::extract_conditions(tree))
        .with_actions(action::extract_actions(tree))
        .with_schedule(schedule::extract_schedule(tree))
        .build()
}
