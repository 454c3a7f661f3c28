//! Action Parsing
//!
//! Reads each action node's details child ("Key: Value, Key: Value") and
//! builds the fixed action/request structure the rule consumer expects.

use std::collections::HashMap;

use serde_json::{json, Value};
use tracing::info;

use crate::model::{NodeType, RuleTree};

/// Extract all actions from the tree's action nodes
pub fn extract_actions(tree: &RuleTree) -> Vec<Value> {
    let mut actions = Vec::new();
    for node in tree.nodes_of_type(&NodeType::Action) {
        let details = node
            .children()
            .iter()
            .find(|c| c.node_type == NodeType::ActionDetails);
        if let Some(details) = details {
            let index = actions.len();
            actions.push(build_action_object(&details.text, "0", index));
        }
    }
    info!(count = actions.len(), "extracted actions");
    actions
}

fn build_action_object(details: &str, parent_id: &str, index: usize) -> Value {
    let fields = parse_action_details(details);
    let name = fields
        .get("Action")
        .map(String::as_str)
        .unwrap_or("Send Promotion");
    let channel = fields.get("Channel").map(String::as_str).unwrap_or("SMS");
    let message_id = fields.get("Message_ID").map(String::as_str).unwrap_or("");

    json!({
        "id": format!("{}_{}", parent_id, index),
        "pid": parent_id,
        "type": "action",
        "action": {"id": 5, "name": name},
        "field": [
            {"name": "ActionCall", "value": "EXTERNAL"},
            {"name": "ActionName", "value": "UPLOADER_MAIN"},
            {"name": "ActionURL", "value": "UPLOADER_CALL"},
            {"name": "ActionType", "value": "ASYNCH"},
        ],
        "request": {
            "field": [
                {"name": "ActionKey", "value": "campaign_action"},
                {"name": "CHANNEL", "value": channel},
                {"name": "MESSAGE_ID", "value": message_id},
            ],
        },
    })
}

/// `"Key1: Value1, Key2: Value2"` into a field map; spaces in keys become
/// underscores
fn parse_action_details(details: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for part in details.split(',') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once(':') {
            fields.insert(key.trim().replace(' ', "_"), value.trim().to_string());
        }
    }
    fields
}
