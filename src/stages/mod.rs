//! Stage Controllers
//!
//! One module per workflow stage. Each controller performs exactly one
//! attempt: locate its target nodes, clear their children, call the
//! transform, append the regenerated children. Retry decisions live in the
//! workflow engine, never here.

mod condition_extract;
mod decompose;
mod rule_convert;
mod schedule_extract;
mod validate;

pub use condition_extract::run_condition_extract;
pub use decompose::run_decompose;
pub use rule_convert::run_rule_convert;
pub use schedule_extract::run_schedule_extract;
pub use validate::{validate_input, ValidationReport};

/// Result of one stage attempt
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub failed: bool,
    pub reason: Option<String>,
    /// Snapshot of what the stage produced, fed to prompt refinement when
    /// the gate rejects the attempt
    pub previous_output: Option<String>,
}

impl StageOutcome {
    pub fn ok(previous_output: impl Into<String>) -> Self {
        Self {
            failed: false,
            reason: None,
            previous_output: Some(previous_output.into()),
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            failed: true,
            reason: Some(reason.into()),
            previous_output: None,
        }
    }
}
