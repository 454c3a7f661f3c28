//! LLM Clients
//!
//! Provider-agnostic chat interface for the conversion prompts, the two
//! concrete providers, and the factory that resolves the registry's model
//! section into a client.

mod anthropic;
mod client;
mod factory;
mod openai;

pub use anthropic::{AnthropicClient, DEFAULT_ANTHROPIC_MODEL};
pub use client::LlmClient;
pub use factory::create_llm_client;
pub use openai::{DEFAULT_OPENAI_MODEL, OpenAiClient};
