//! Prompt Registry
//!
//! Explicit configuration object mapping prompt keys to templates plus the
//! per-stage gate settings (consistency threshold, retry ceiling). Built
//! from a YAML file or from the compiled-in defaults, and passed by
//! reference to the engine; there is no global registry.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const DECOMPOSITION_PROMPT_KEY: &str = "statement_decomposition_prompt";
pub const CONDITION_PROMPT_KEY: &str = "condition_extraction_prompt";
pub const SCHEDULE_PROMPT_KEY: &str = "schedule_parser_prompt";
pub const RULE_CONVERTER_PROMPT_KEY: &str = "rule_converter_prompt";
pub const CONSISTENCY_PROMPT_KEY: &str = "consistency_check_prompt";
pub const REFINEMENT_PROMPT_KEY: &str = "prompt_refinement_prompt";

const DEFAULT_THRESHOLD: f64 = 0.8;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// One configured prompt: template text plus gate settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    pub template: String,
    #[serde(default = "default_threshold")]
    pub consistency_threshold: f64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

/// Gate settings for one gated stage
#[derive(Debug, Clone, Copy)]
pub struct StageSettings {
    pub consistency_threshold: f64,
    pub max_retries: u32,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            consistency_threshold: DEFAULT_THRESHOLD,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Provider and model selection for the live transform. Both fields are
/// optional: an unset provider falls back to the AGENT_BACKEND environment
/// variable, an unset model to the chosen provider's default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    model: ModelConfig,
    prompts: HashMap<String, PromptConfig>,
}

/// Prompt key -> template + settings, plus the model selection
#[derive(Debug, Clone)]
pub struct PromptRegistry {
    prompts: HashMap<String, PromptConfig>,
    model: ModelConfig,
}

impl PromptRegistry {
    /// Registry with the compiled-in default prompts
    pub fn builtin() -> Self {
        Self {
            prompts: BUILTIN_PROMPTS.clone(),
            model: ModelConfig::default(),
        }
    }

    /// Load from a YAML file; keys present in the file override the
    /// compiled-in defaults, missing keys keep them.
    pub fn from_path(path: &Path) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Registry(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&raw)
    }

    /// Parse from YAML text, overlaying the compiled-in defaults
    pub fn from_yaml(raw: &str) -> Result<Self, EngineError> {
        let file: RegistryFile =
            serde_yaml::from_str(raw).map_err(|e| EngineError::Registry(e.to_string()))?;
        let mut prompts = BUILTIN_PROMPTS.clone();
        prompts.extend(file.prompts);
        Ok(Self {
            prompts,
            model: file.model,
        })
    }

    /// Provider/model selection from the registry file
    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// Template text for a key
    pub fn template(&self, key: &str) -> Result<&str, EngineError> {
        self.prompts
            .get(key)
            .map(|p| p.template.as_str())
            .ok_or_else(|| EngineError::PromptNotFound(key.to_string()))
    }

    /// Gate settings for a key; unknown keys fall back to the defaults
    /// (threshold 0.80, 3 retries)
    pub fn settings(&self, key: &str) -> StageSettings {
        self.prompts
            .get(key)
            .map(|p| StageSettings {
                consistency_threshold: p.consistency_threshold,
                max_retries: p.max_retries,
            })
            .unwrap_or_default()
    }
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

static BUILTIN_PROMPTS: Lazy<HashMap<String, PromptConfig>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        DECOMPOSITION_PROMPT_KEY.to_string(),
        PromptConfig {
            template: r#"You are a marketing campaign analyst. Decompose the campaign policy below into its core parts.

Return ONLY a JSON object:
{"normal_statements": <string or array of strings, one per alternative branch>, "schedule": <string with any timing/scheduling text, or "">}

Campaign policy:
{{input_text}}"#
                .to_string(),
            consistency_threshold: DEFAULT_THRESHOLD,
            max_retries: DEFAULT_MAX_RETRIES,
        },
    );
    m.insert(
        CONDITION_PROMPT_KEY.to_string(),
        PromptConfig {
            template: r#"Extract every targeting rule from the statement below. Each rule pairs a customer condition with the action taken when it holds.

Return ONLY a JSON array:
[{"rule": <full rule sentence>, "condition": <condition text>, "actions": <action text>}]

Statement:
{{statement}}"#
                .to_string(),
            consistency_threshold: DEFAULT_THRESHOLD,
            max_retries: DEFAULT_MAX_RETRIES,
        },
    );
    m.insert(
        SCHEDULE_PROMPT_KEY.to_string(),
        PromptConfig {
            template: r#"Parse the campaign schedule text below into structured fields.

Return ONLY a JSON object with any of these keys that apply:
{"schedule_type": "", "repeat": "", "day": "", "start_time": "", "end_time": "", "interval": "", "frequency": "", "segment_rule_start_date": "", "segment_rule_end_date": ""}

Schedule text:
{{schedule_text}}"#
                .to_string(),
            consistency_threshold: DEFAULT_THRESHOLD,
            max_retries: DEFAULT_MAX_RETRIES,
        },
    );
    m.insert(
        RULE_CONVERTER_PROMPT_KEY.to_string(),
        PromptConfig {
            template: r#"Convert the targeting rule below into its components.

Return ONLY a JSON object:
{"segments": [<one boolean condition per entry, e.g. "ARPU >= 10">], "actions": <comma-separated "Key: Value" pairs, e.g. "Action: Send Promotion, Channel: SMS, Message_ID: 42">, "policy": <policy text or "">, "schedule": <schedule text or "">, "sampling": <sampling text or "">}

Rule:
{{rule_text}}"#
                .to_string(),
            consistency_threshold: DEFAULT_THRESHOLD,
            max_retries: DEFAULT_MAX_RETRIES,
        },
    );
    m.insert(
        CONSISTENCY_PROMPT_KEY.to_string(),
        PromptConfig {
            template: r#"Rate how faithfully the derived statements preserve the meaning of the original text. 1.0 means identical meaning, 0.0 means unrelated.

Return ONLY a JSON object: {"similarity_score": <number between 0 and 1>}

Original:
{{original}}

Derived statements:
{{children}}"#
                .to_string(),
            consistency_threshold: DEFAULT_THRESHOLD,
            max_retries: DEFAULT_MAX_RETRIES,
        },
    );
    m.insert(
        REFINEMENT_PROMPT_KEY.to_string(),
        PromptConfig {
            template: r#"A prompt produced output that failed a consistency check. Rewrite the prompt so the next attempt addresses the feedback. Return ONLY the rewritten prompt text.

Original prompt:
{{original_prompt}}

Input text:
{{input_text}}

Previous output:
{{previous_output}}

Feedback:
{{feedback}}"#
                .to_string(),
            consistency_threshold: DEFAULT_THRESHOLD,
            max_retries: DEFAULT_MAX_RETRIES,
        },
    );
    m
});
