//! Client Factory
//!
//! Resolves the registry's model section into a concrete provider client.
//! Provider falls back to the AGENT_BACKEND environment variable, model to
//! the provider's default; API keys always come from the environment.

use std::sync::Arc;

use anyhow::anyhow;
use tracing::info;

use crate::config::ModelConfig;
use crate::error::EngineError;

use super::anthropic::{AnthropicClient, DEFAULT_ANTHROPIC_MODEL};
use super::client::LlmClient;
use super::openai::{OpenAiClient, DEFAULT_OPENAI_MODEL};

#[derive(Debug)]
enum Provider {
    Anthropic,
    OpenAi,
}

fn parse_provider(raw: &str) -> Result<Provider, EngineError> {
    match raw.to_lowercase().as_str() {
        "anthropic" | "claude" => Ok(Provider::Anthropic),
        "openai" | "gpt" => Ok(Provider::OpenAi),
        other => Err(EngineError::ClientSetup(anyhow!(
            "unknown provider '{}', expected anthropic or openai",
            other
        ))),
    }
}

fn require_env(var: &str) -> Result<String, EngineError> {
    std::env::var(var).map_err(|_| EngineError::ClientSetup(anyhow!("{} is not set", var)))
}

/// Build the client selected by the model config
pub fn create_llm_client(config: &ModelConfig) -> Result<Arc<dyn LlmClient>, EngineError> {
    let provider_name = config
        .provider
        .clone()
        .or_else(|| std::env::var("AGENT_BACKEND").ok())
        .unwrap_or_else(|| "anthropic".to_string());

    let client: Arc<dyn LlmClient> = match parse_provider(&provider_name)? {
        Provider::Anthropic => {
            let api_key = require_env("ANTHROPIC_API_KEY")?;
            let model = config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string());
            Arc::new(AnthropicClient::new(api_key, model))
        }
        Provider::OpenAi => {
            let api_key = require_env("OPENAI_API_KEY")?;
            let model = config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
            Arc::new(OpenAiClient::new(api_key, model))
        }
    };

    info!(
        provider = client.provider_name(),
        model = client.model_name(),
        "LLM client ready"
    );
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_aliases() {
        assert!(matches!(parse_provider("anthropic"), Ok(Provider::Anthropic)));
        assert!(matches!(parse_provider("Claude"), Ok(Provider::Anthropic)));
        assert!(matches!(parse_provider("OPENAI"), Ok(Provider::OpenAi)));
        assert!(matches!(parse_provider("gpt"), Ok(Provider::OpenAi)));
    }

    #[test]
    fn test_unknown_provider_is_a_setup_error() {
        let err = parse_provider("bard").unwrap_err();
        assert!(matches!(err, EngineError::ClientSetup(_)));
        assert!(err.to_string().contains("unknown provider 'bard'"));
    }
}
