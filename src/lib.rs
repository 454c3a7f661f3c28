//! text2rule
//!
//! Converts free-text marketing policy statements into a hierarchical,
//! machine-actionable rule representation. The pipeline decomposes the
//! input, extracts conditions and schedules, and converts each rule into
//! structured JSON, gating progression between stages on a consistency
//! score between a node's original text and the text its children derive
//! from it.

pub mod config;
pub mod consistency;
pub mod convert;
pub mod error;
pub mod llm;
pub mod model;
pub mod refine;
pub mod render;
pub mod stages;
pub mod transform;
pub mod workflow;

pub use config::PromptRegistry;
pub use error::EngineError;
pub use model::{NodeType, RuleNode, RuleTree};
pub use transform::{LlmTransform, SemanticTransform};
pub use workflow::{ConversionWorkflow, Phase, WorkflowOutcome};
