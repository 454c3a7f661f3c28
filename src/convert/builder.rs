//! Rule JSON Assembly
//!
//! Fluent builder for the final document. Conditions become direct
//! children of the root rule and every action is cloned under every
//! condition; consumers expect that cross product, so it is preserved
//! as-is.

use serde_json::{json, Value};
use tracing::info;

/// Assembles `[{"detail": {"rules": {...}}}]`
#[derive(Debug, Default)]
pub struct RuleJsonBuilder {
    conditions: Vec<Value>,
    actions: Vec<Value>,
    schedule: Option<Value>,
}

impl RuleJsonBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conditions(mut self, conditions: Vec<Value>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_actions(mut self, actions: Vec<Value>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_schedule(mut self, schedule: Option<Value>) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn build(self) -> Value {
        let children = self.conditions_with_actions();
        let mut rules = json!({
            "id": "0",
            "pid": "#",
            "childrens": children,
        });
        if let Some(schedule) = self.schedule {
            rules["schedule"] = schedule;
        }
        info!(
            conditions = self.conditions.len(),
            actions = self.actions.len(),
            "built rule document"
        );
        json!([{"detail": {"rules": rules}}])
    }

    /// Re-addresses each condition as `0_<i>` and nests a copy of every
    /// action under it as `0_<i>_<j>`
    fn conditions_with_actions(&self) -> Vec<Value> {
        self.conditions
            .iter()
            .enumerate()
            .map(|(ci, condition)| {
                let mut condition = condition.clone();
                condition["id"] = json!(format!("0_{}", ci));
                condition["pid"] = json!("0");

                let nested: Vec<Value> = self
                    .actions
                    .iter()
                    .enumerate()
                    .map(|(ai, action)| {
                        let mut action = action.clone();
                        action["id"] = json!(format!("0_{}_{}", ci, ai));
                        action["pid"] = json!(format!("0_{}", ci));
                        action
                    })
                    .collect();
                if !nested.is_empty() {
                    condition["childrens"] = json!(nested);
                }
                condition
            })
            .collect()
    }
}
