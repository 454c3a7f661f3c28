//! Conversion Workflow
//!
//! Drives one policy text through the full stage sequence:
//! Validate -> Decompose (gated) -> ScheduleExtract -> ConditionExtract
//! (gated) -> RuleConvert -> Done, with AbortedInvalid and Failed as the
//! terminal error phases. Gated stages loop through attempt / check /
//! refine until the gate passes or the retry budget runs out; an exhausted
//! budget advances best-effort rather than deadlocking the run.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::config::{
    PromptRegistry, CONDITION_PROMPT_KEY, CONSISTENCY_PROMPT_KEY, DECOMPOSITION_PROMPT_KEY,
    REFINEMENT_PROMPT_KEY, RULE_CONVERTER_PROMPT_KEY, SCHEDULE_PROMPT_KEY,
};
use crate::consistency::{ConsistencyGate, GateScope};
use crate::convert::render_rule_json;
use crate::error::EngineError;
use crate::model::NodeType;
use crate::refine::{build_feedback, refine_prompt};
use crate::stages::{
    run_condition_extract, run_decompose, run_rule_convert, run_schedule_extract, validate_input,
};
use crate::transform::SemanticTransform;

use super::state::WorkflowState;

/// Workflow phases; the last three are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validate,
    Decompose,
    ScheduleExtract,
    ConditionExtract,
    RuleConvert,
    Done,
    AbortedInvalid,
    Failed,
}

/// Final result of one run
#[derive(Debug)]
pub struct WorkflowOutcome {
    pub phase: Phase,
    pub state: WorkflowState,
    /// Structured rule output, present only when the run reached Done
    pub rule_json: Option<Value>,
}

impl WorkflowOutcome {
    pub fn succeeded(&self) -> bool {
        self.phase == Phase::Done
    }
}

#[derive(Debug, Clone, Copy)]
enum GatedStage {
    Decomposition,
    Condition,
}

impl GatedStage {
    fn name(self) -> &'static str {
        match self {
            GatedStage::Decomposition => "decomposition",
            GatedStage::Condition => "condition extraction",
        }
    }

    fn prompt_key(self) -> &'static str {
        match self {
            GatedStage::Decomposition => DECOMPOSITION_PROMPT_KEY,
            GatedStage::Condition => CONDITION_PROMPT_KEY,
        }
    }

    fn scope(self) -> GateScope {
        match self {
            GatedStage::Decomposition => GateScope::Root,
            GatedStage::Condition => GateScope::Within {
                parent: NodeType::NormalStatements,
                child: NodeType::Segment,
            },
        }
    }
}

/// The engine: one instance serves many runs, each run gets its own state
pub struct ConversionWorkflow {
    transform: Arc<dyn SemanticTransform>,
    registry: PromptRegistry,
    model_tag: String,
}

impl ConversionWorkflow {
    pub fn new(
        transform: Arc<dyn SemanticTransform>,
        registry: PromptRegistry,
        model_tag: impl Into<String>,
    ) -> Self {
        Self {
            transform,
            registry,
            model_tag: model_tag.into(),
        }
    }

    /// Run one policy text to a terminal phase
    pub async fn run(&self, input: &str) -> Result<WorkflowOutcome, EngineError> {
        let mut state = WorkflowState::new(input);
        let mut phase = Phase::Validate;

        let terminal = loop {
            phase = match phase {
                Phase::Validate => {
                    let report = validate_input(&state.input);
                    let valid = report.is_valid;
                    state.validation = Some(report);
                    if valid {
                        Phase::Decompose
                    } else {
                        state.fail("input failed validation");
                        Phase::AbortedInvalid
                    }
                }
                Phase::Decompose => {
                    if self.gated_loop(&mut state, GatedStage::Decomposition).await? {
                        Phase::ScheduleExtract
                    } else {
                        Phase::Failed
                    }
                }
                Phase::ScheduleExtract => self.schedule_extract(&mut state).await?,
                Phase::ConditionExtract => {
                    if self.gated_loop(&mut state, GatedStage::Condition).await? {
                        Phase::RuleConvert
                    } else {
                        Phase::Failed
                    }
                }
                Phase::RuleConvert => self.rule_convert(&mut state).await?,
                terminal @ (Phase::Done | Phase::AbortedInvalid | Phase::Failed) => break terminal,
            };
        };

        let rule_json = if terminal == Phase::Done {
            state.tree.as_ref().map(render_rule_json)
        } else {
            None
        };

        info!(phase = ?terminal, failed = state.failed, "workflow finished");
        Ok(WorkflowOutcome {
            phase: terminal,
            state,
            rule_json,
        })
    }

    /// Attempt / gate / refine loop shared by the two gated stages.
    /// Returns whether the workflow may advance; `false` means the run is
    /// terminally failed.
    async fn gated_loop(
        &self,
        state: &mut WorkflowState,
        stage: GatedStage,
    ) -> Result<bool, EngineError> {
        let settings = self.registry.settings(stage.prompt_key());
        let base_prompt = self.registry.template(stage.prompt_key())?.to_string();
        let consistency_template = self.registry.template(CONSISTENCY_PROMPT_KEY)?.to_string();
        let refine_template = self.registry.template(REFINEMENT_PROMPT_KEY)?.to_string();
        let scope = stage.scope();

        loop {
            let prompt = match stage {
                GatedStage::Decomposition => state.decomposition.prompt_override.clone(),
                GatedStage::Condition => state.condition.prompt_override.clone(),
            }
            .unwrap_or_else(|| base_prompt.clone());

            let attempt = match stage {
                GatedStage::Decomposition => {
                    run_decompose(
                        &state.input,
                        &prompt,
                        self.transform.as_ref(),
                        &self.model_tag,
                        &mut state.tree,
                    )
                    .await
                }
                GatedStage::Condition => match state.tree.as_mut() {
                    Some(tree) => {
                        run_condition_extract(
                            tree,
                            &prompt,
                            self.transform.as_ref(),
                            &self.model_tag,
                        )
                        .await
                    }
                    None => {
                        state.fail("condition extraction requires a decomposed tree");
                        return Ok(false);
                    }
                },
            };

            let outcome = match attempt {
                Ok(outcome) => outcome,
                Err(e) => {
                    state.fail(format!("{} transform error: {}", stage.name(), e));
                    return Ok(false);
                }
            };
            if outcome.failed {
                let reason = outcome
                    .reason
                    .unwrap_or_else(|| format!("{} failed", stage.name()));
                state.fail(reason);
                return Ok(false);
            }

            let gate_outcome = {
                let Some(tree) = state.tree.as_mut() else {
                    state.fail(format!("{} produced no tree", stage.name()));
                    return Ok(false);
                };
                let gate = ConsistencyGate::new(
                    self.transform.as_ref(),
                    &consistency_template,
                    settings.consistency_threshold,
                );
                match gate.check(tree, &scope).await {
                    Ok(gate_outcome) => gate_outcome,
                    Err(e) => {
                        state.fail(format!("consistency check transport error: {}", e));
                        return Ok(false);
                    }
                }
            };

            let progress = match stage {
                GatedStage::Decomposition => &mut state.decomposition,
                GatedStage::Condition => &mut state.condition,
            };
            progress.previous_output = outcome.previous_output;
            progress.consistency_score = Some(gate_outcome.score);

            if gate_outcome.passed {
                info!(stage = stage.name(), score = gate_outcome.score, "stage advanced");
                return Ok(true);
            }
            if progress.retry_count >= settings.max_retries {
                warn!(
                    stage = stage.name(),
                    retries = progress.retry_count,
                    score = gate_outcome.score,
                    "retry budget exhausted, advancing best effort"
                );
                progress.best_effort = true;
                return Ok(true);
            }

            let feedback = build_feedback(
                stage.name(),
                gate_outcome.score,
                settings.consistency_threshold,
                &gate_outcome.original,
                &gate_outcome.children,
            );
            let previous = progress.previous_output.clone().unwrap_or_default();
            progress.feedback = Some(feedback.clone());
            progress.retry_count += 1;

            let refined = match refine_prompt(
                self.transform.as_ref(),
                &refine_template,
                &prompt,
                &state.input,
                &previous,
                &feedback,
            )
            .await
            {
                Ok(refined) => refined,
                Err(e) => {
                    state.fail(format!("prompt refinement transport error: {}", e));
                    return Ok(false);
                }
            };
            match stage {
                GatedStage::Decomposition => {
                    state.decomposition.prompt_override = Some(refined);
                }
                GatedStage::Condition => {
                    state.condition.prompt_override = Some(refined);
                }
            }
        }
    }

    async fn schedule_extract(&self, state: &mut WorkflowState) -> Result<Phase, EngineError> {
        let template = self.registry.template(SCHEDULE_PROMPT_KEY)?;
        let Some(tree) = state.tree.as_mut() else {
            state.fail("schedule extraction requires a decomposed tree");
            return Ok(Phase::Failed);
        };
        match run_schedule_extract(tree, template, self.transform.as_ref(), &self.model_tag).await {
            Ok(outcome) if outcome.failed => {
                state.fail(
                    outcome
                        .reason
                        .unwrap_or_else(|| "schedule extraction failed".to_string()),
                );
                Ok(Phase::Failed)
            }
            Ok(_) => Ok(Phase::ConditionExtract),
            Err(e) => {
                state.fail(format!("schedule extraction transform error: {}", e));
                Ok(Phase::Failed)
            }
        }
    }

    async fn rule_convert(&self, state: &mut WorkflowState) -> Result<Phase, EngineError> {
        let template = self.registry.template(RULE_CONVERTER_PROMPT_KEY)?;
        let Some(tree) = state.tree.as_mut() else {
            state.fail("rule conversion requires a decomposed tree");
            return Ok(Phase::Failed);
        };
        match run_rule_convert(tree, template, self.transform.as_ref(), &self.model_tag).await {
            Ok(outcome) if outcome.failed => {
                state.fail(
                    outcome
                        .reason
                        .unwrap_or_else(|| "rule conversion failed".to_string()),
                );
                Ok(Phase::Failed)
            }
            Ok(_) => Ok(Phase::Done),
            Err(e) => {
                state.fail(format!("rule conversion transform error: {}", e));
                Ok(Phase::Failed)
            }
        }
    }
}
