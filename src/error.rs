//! Engine Errors
//!
//! Typed errors for configuration and setup problems. Stage-level trouble
//! (bad LLM output, unparseable responses) is absorbed by the workflow's
//! failed flag instead of surfacing here.

use thiserror::Error;

/// Errors raised by the conversion engine outside of stage execution
#[derive(Debug, Error)]
pub enum EngineError {
    /// A stage asked the registry for a prompt key that is not configured
    #[error("prompt not found in registry: {0}")]
    PromptNotFound(String),

    /// The prompt registry file could not be read or parsed
    #[error("prompt registry error: {0}")]
    Registry(String),

    /// The LLM client could not be constructed (missing key, bad backend)
    #[error("llm client setup failed: {0}")]
    ClientSetup(#[source] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = EngineError::PromptNotFound("decomposition".to_string());
        assert_eq!(err.to_string(), "prompt not found in registry: decomposition");
    }
}
