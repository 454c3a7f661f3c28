//! Workflow Engine
//!
//! Linear state machine over the stages plus the bounded retry loops that
//! gate decomposition and condition extraction.

mod engine;
mod state;

pub use engine::{ConversionWorkflow, Phase, WorkflowOutcome};
pub use state::{StageProgress, WorkflowState};
