//! Schedule Parsing
//!
//! Reads the schedule details summary and emits the fixed schedule field
//! list. Start and expiry dates default to a 30-day window from today.

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tracing::debug;

use crate::model::{NodeType, RuleTree};

const SCHEDULE_WINDOW_DAYS: i64 = 30;

/// Extract the schedule object, or `None` when the tree carries no
/// schedule details
pub fn extract_schedule(tree: &RuleTree) -> Option<Value> {
    let schedule_node = tree.find_first(&NodeType::Schedule)?;
    let details = schedule_node.find_first(&NodeType::ScheduleDetails)?;
    Some(build_schedule_object(&details.text))
}

fn build_schedule_object(details: &str) -> Value {
    let schedule_type = extract_value(details, "Schedule Type:");
    let start = Utc::now().date_naive();
    let expiry = start + Duration::days(SCHEDULE_WINDOW_DAYS);
    debug!(%schedule_type, "built schedule object");

    json!({
        "field": [
            {"name": "ScheduleId", "value": ""},
            {"name": "ScheduleName", "value": schedule_type},
            {"name": "ScheduleType", "value": schedule_type},
            {"name": "StartDate", "value": start.format("%Y-%m-%d").to_string()},
            {"name": "ExpiryDate", "value": expiry.format("%Y-%m-%d").to_string()},
            {"name": "Repeat", "value": "Yes"},
        ],
    })
}

/// Value after `prefix`, up to the next comma
fn extract_value(text: &str, prefix: &str) -> String {
    let Some(start) = text.find(prefix) else {
        return String::new();
    };
    let rest = &text[start + prefix.len()..];
    let end = rest.find(',').unwrap_or(rest.len());
    rest[..end].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RuleNode;

    #[test]
    fn test_extract_value_up_to_comma() {
        assert_eq!(
            extract_value("Schedule Type: Daily, Repeat: Yes", "Schedule Type:"),
            "Daily"
        );
        assert_eq!(extract_value("Schedule Type: Weekly", "Schedule Type:"), "Weekly");
        assert_eq!(extract_value("no prefix here", "Schedule Type:"), "");
    }

    #[test]
    fn test_schedule_object_fields() {
        let schedule = build_schedule_object("Schedule Type: Daily, Repeat: Yes");
        let fields = schedule["field"].as_array().unwrap();
        assert_eq!(fields[1]["value"], "Daily");
        assert_eq!(fields[2]["value"], "Daily");
        assert_eq!(fields[5]["value"], "Yes");
        // Dates are rendered as YYYY-MM-DD.
        let start = fields[3]["value"].as_str().unwrap();
        assert_eq!(start.len(), 10);
    }

    #[test]
    fn test_missing_details_is_none() {
        let mut root = RuleNode::new(NodeType::Root, "input", "test");
        root.add_child(RuleNode::new(NodeType::Schedule, "daily", "test"));
        let mut tree = RuleTree::new();
        tree.set_root(root);
        assert!(extract_schedule(&tree).is_none());
    }
}
