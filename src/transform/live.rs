//! Live Transform
//!
//! [`SemanticTransform`] backed by an [`LlmClient`]. Every call sleeps a
//! fixed delay first, which keeps the pipeline under provider rate limits;
//! cancelling the future during the sleep cancels the rest of the batch.
//!
//! [`LlmClient`]: crate::llm::LlmClient

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::llm::LlmClient;

use super::json::parse_lenient;
use super::results::{Decomposition, RuleOutline, ScheduleFields, SegmentExtraction};
use super::{fill_template, SemanticTransform};

/// Pause before every provider call
const DEFAULT_CALL_DELAY: Duration = Duration::from_secs(12);

const SYSTEM_PROMPT: &str = "You are a precise text-to-rule conversion engine for marketing campaign policies.";

/// LLM-backed semantic transform with inter-call throttling
pub struct LlmTransform {
    client: Arc<dyn LlmClient>,
    call_delay: Duration,
}

impl LlmTransform {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            call_delay: DEFAULT_CALL_DELAY,
        }
    }

    /// Override the inter-call delay (tests, faster providers)
    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = delay;
        self
    }

    /// Model identifier recorded on nodes this transform produces
    pub fn model_tag(&self) -> String {
        format!("{}/{}", self.client.provider_name(), self.client.model_name())
    }

    async fn throttled_json(&self, prompt: &str) -> Result<String> {
        tokio::time::sleep(self.call_delay).await;
        debug!(chars = prompt.len(), "transform call");
        self.client.chat_json(SYSTEM_PROMPT, prompt).await
    }

    async fn throttled_text(&self, prompt: &str) -> Result<String> {
        tokio::time::sleep(self.call_delay).await;
        self.client.chat(SYSTEM_PROMPT, prompt).await
    }
}

#[async_trait]
impl SemanticTransform for LlmTransform {
    async fn decompose(&self, input: &str, prompt: &str) -> Result<Option<Decomposition>> {
        let filled = fill_template(prompt, &[("input_text", input)]);
        let response = self.throttled_json(&filled).await?;
        Ok(parse_lenient(&response))
    }

    async fn extract_segments(
        &self,
        statement: &str,
        template: &str,
    ) -> Result<Vec<SegmentExtraction>> {
        let filled = fill_template(template, &[("statement", statement)]);
        let response = self.throttled_json(&filled).await?;
        Ok(parse_lenient(&response).unwrap_or_default())
    }

    async fn parse_schedule(
        &self,
        schedule_text: &str,
        template: &str,
    ) -> Result<Option<ScheduleFields>> {
        let filled = fill_template(template, &[("schedule_text", schedule_text)]);
        let response = self.throttled_json(&filled).await?;
        Ok(parse_lenient(&response))
    }

    async fn convert_rule(&self, rule_text: &str, template: &str) -> Result<Option<RuleOutline>> {
        let filled = fill_template(template, &[("rule_text", rule_text)]);
        let response = self.throttled_json(&filled).await?;
        Ok(parse_lenient(&response))
    }

    async fn score_similarity(
        &self,
        original: &str,
        children: &str,
        template: &str,
    ) -> Result<Option<f64>> {
        let filled = fill_template(template, &[("original", original), ("children", children)]);
        let response = self.throttled_json(&filled).await?;
        let value: Option<serde_json::Value> = parse_lenient(&response);
        Ok(value.and_then(|v| v.get("similarity_score").and_then(|s| s.as_f64())))
    }

    async fn refine_prompt(
        &self,
        original_prompt: &str,
        input: &str,
        previous_output: &str,
        feedback: &str,
        template: &str,
    ) -> Result<Option<String>> {
        let filled = fill_template(
            template,
            &[
                ("original_prompt", original_prompt),
                ("input_text", input),
                ("previous_output", previous_output),
                ("feedback", feedback),
            ],
        );
        let response = self.throttled_text(&filled).await?;
        let cleaned = super::strip_fences(&response);
        Ok((!cleaned.is_empty()).then_some(cleaned))
    }
}
