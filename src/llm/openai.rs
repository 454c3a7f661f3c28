//! OpenAI Provider
//!
//! Runs conversion prompts against the chat completions API. JSON-mode
//! requests use the native `response_format` switch, so this provider's
//! score and extraction responses rarely need the fence fallback.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::client::LlmClient;

/// Model used when the registry's model section names none
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const TEMPERATURE: f64 = 0.1;

/// GPT-backed client for the conversion pipeline
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    async fn send(&self, system_prompt: &str, user_prompt: &str, json_mode: bool) -> Result<String> {
        let mut body = json!({
            "model": &self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "temperature": TEMPERATURE
        });
        if json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }

        let response = self
            .http
            .post(API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("OpenAI returned {}: {}", status, body);
        }

        let payload: CompletionsResponse = response.json().await?;
        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("OpenAI response carried no choices"))
    }
}

#[derive(Deserialize)]
struct CompletionsResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.send(system_prompt, user_prompt, false).await
    }

    async fn chat_json(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.send(system_prompt, user_prompt, true).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "OpenAI"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_for_node_provenance() {
        let client = OpenAiClient::new("key", "gpt-4o-mini");
        assert_eq!(client.provider_name(), "OpenAI");
        assert_eq!(client.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn test_response_first_choice_extraction() {
        let payload: CompletionsResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"content": "{\"normal_statements\": \"A\"}"}}]}"#,
        )
        .unwrap();
        let content = payload.choices.into_iter().next().map(|c| c.message.content);
        assert_eq!(content.as_deref(), Some("{\"normal_statements\": \"A\"}"));
    }
}
