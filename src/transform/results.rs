//! Transform DTOs
//!
//! Shapes the language model is asked to produce. Deserialization is
//! deliberately lenient: models drift between strings, arrays and numbers
//! for the same field, so anything scalar-ish collapses to a string.

use serde::{Deserialize, Deserializer};

/// Joins multi-branch statements into a single normal statement
const BRANCH_JOINER: &str = ", otherwise ";

/// Output of the decomposition call
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Decomposition {
    /// The policy's targeting statement(s); an array of branches is joined
    /// with ", otherwise "
    #[serde(default, deserialize_with = "string_or_joined_array")]
    pub normal_statements: String,
    /// Any scheduling/timing text found in the input, empty when absent
    #[serde(default, deserialize_with = "lenient_string")]
    pub schedule: String,
}

/// One targeting rule extracted from a statement
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SegmentExtraction {
    #[serde(default, deserialize_with = "lenient_string")]
    pub rule: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub condition: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub actions: String,
}

impl SegmentExtraction {
    /// Text carried by the resulting segment node: the full rule sentence
    /// when present, otherwise a rendering of the condition/action pair.
    pub fn display_text(&self) -> String {
        if !self.rule.trim().is_empty() {
            self.rule.clone()
        } else {
            format!("Condition: {} -> Action: {}", self.condition, self.actions)
        }
    }
}

/// Structured schedule fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleFields {
    #[serde(default, deserialize_with = "lenient_string")]
    pub schedule_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub repeat: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub day: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_time: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub end_time: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub interval: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub frequency: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub segment_rule_start_date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub segment_rule_end_date: String,
}

impl ScheduleFields {
    /// Human-readable summary stored on the schedule details node
    pub fn summary(&self) -> String {
        format!(
            "Schedule Type: {}, Repeat: {}, Day(s): {}, Start Time: {}, End Time: {}, Start Date: {}, End Date: {}",
            self.schedule_type,
            self.repeat,
            self.day,
            self.start_time,
            self.end_time,
            self.segment_rule_start_date,
            self.segment_rule_end_date
        )
    }
}

/// Components of one converted rule
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleOutline {
    /// Boolean conditions, one per entry (e.g. "ARPU >= 10")
    #[serde(default)]
    pub segments: Vec<String>,
    /// Comma-separated "Key: Value" action text
    #[serde(default, deserialize_with = "lenient_string")]
    pub actions: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub policy: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub schedule: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sampling: String,
}

fn string_or_joined_array<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(BRANCH_JOINER),
        other => value_to_string(&other),
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_string(&value))
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
