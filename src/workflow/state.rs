//! Workflow State
//!
//! Explicit per-run state: the input, the growing tree, and one progress
//! record per gated stage. Once the failed flag is set no stage touches the
//! tree again.

use crate::model::RuleTree;
use crate::stages::ValidationReport;

/// Progress of one gated stage across its retry loop
#[derive(Debug, Clone, Default)]
pub struct StageProgress {
    pub retry_count: u32,
    /// Score from the most recent gate check
    pub consistency_score: Option<f64>,
    /// Feedback generated for the most recent refinement
    pub feedback: Option<String>,
    /// Refined prompt used instead of the registry template
    pub prompt_override: Option<String>,
    /// Snapshot of the stage's latest output, input to refinement
    pub previous_output: Option<String>,
    /// Set when the stage advanced with its retry budget exhausted
    pub best_effort: bool,
}

/// All state for one conversion run
#[derive(Debug, Default)]
pub struct WorkflowState {
    pub input: String,
    pub validation: Option<ValidationReport>,
    pub tree: Option<RuleTree>,
    pub decomposition: StageProgress,
    pub condition: StageProgress,
    pub failed: bool,
    pub failure_reason: Option<String>,
}

impl WorkflowState {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }

    /// Mark the run failed; the first recorded reason wins
    pub fn fail(&mut self, reason: impl Into<String>) {
        if !self.failed {
            self.failed = true;
            self.failure_reason = Some(reason.into());
        }
    }
}
