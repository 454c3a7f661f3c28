//! Semantic Transform Port
//!
//! The async boundary between the workflow engine and the external language
//! model. Stage controllers only ever talk to [`SemanticTransform`]; the
//! live implementation routes every capability through an [`LlmClient`]
//! with a fixed inter-call delay.
//!
//! [`LlmClient`]: crate::llm::LlmClient

mod json;
mod live;
mod results;

use anyhow::Result;
use async_trait::async_trait;

pub use json::{extract_json_region, strip_fences};
pub use live::LlmTransform;
pub use results::{Decomposition, RuleOutline, ScheduleFields, SegmentExtraction};

/// Text transformation capabilities the stages depend on.
///
/// Error contract: `Err` means the transform itself failed (transport,
/// provider) and terminates the workflow; `Ok(None)` / an empty `Vec` means
/// the response could not be interpreted and the caller applies its local
/// default.
#[async_trait]
pub trait SemanticTransform: Send + Sync {
    /// Split raw input into normal statements plus optional schedule text
    async fn decompose(&self, input: &str, prompt: &str) -> Result<Option<Decomposition>>;

    /// Extract the individual targeting rules from one statement
    async fn extract_segments(
        &self,
        statement: &str,
        template: &str,
    ) -> Result<Vec<SegmentExtraction>>;

    /// Parse free-form schedule text into structured fields
    async fn parse_schedule(
        &self,
        schedule_text: &str,
        template: &str,
    ) -> Result<Option<ScheduleFields>>;

    /// Break one targeting rule into segments, actions, policy, schedule,
    /// sampling
    async fn convert_rule(&self, rule_text: &str, template: &str) -> Result<Option<RuleOutline>>;

    /// Score how faithfully `children` preserves the meaning of `original`.
    /// `None` when the response carries no usable score; the caller treats
    /// that as 0.0.
    async fn score_similarity(
        &self,
        original: &str,
        children: &str,
        template: &str,
    ) -> Result<Option<f64>>;

    /// Rewrite a prompt given feedback from a failed consistency check.
    /// `None` when the model produced nothing usable; the caller keeps the
    /// original prompt.
    async fn refine_prompt(
        &self,
        original_prompt: &str,
        input: &str,
        previous_output: &str,
        feedback: &str,
        template: &str,
    ) -> Result<Option<String>>;
}

/// Literal find-replace of `{{token}}` placeholders
pub fn fill_template(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut filled = template.to_string();
    for (token, value) in substitutions {
        filled = filled.replace(&format!("{{{{{}}}}}", token), value);
    }
    filled
}
