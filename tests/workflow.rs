//! End-to-end workflow tests with a scripted transform double.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use text2rule::config::PromptRegistry;
use text2rule::model::NodeType;
use text2rule::transform::{
    Decomposition, RuleOutline, ScheduleFields, SegmentExtraction, SemanticTransform,
};
use text2rule::workflow::{ConversionWorkflow, Phase};

/// Scripted transform: consistency scores pop from a queue, everything else
/// returns fixed well-formed output.
struct ScriptedTransform {
    scores: Mutex<VecDeque<Option<f64>>>,
    decompose_calls: AtomicUsize,
    refine_calls: AtomicUsize,
    last_decompose_prompt: Mutex<String>,
    fail_decompose: bool,
}

impl ScriptedTransform {
    fn with_scores(scores: Vec<Option<f64>>) -> Self {
        Self {
            scores: Mutex::new(scores.into_iter().collect()),
            decompose_calls: AtomicUsize::new(0),
            refine_calls: AtomicUsize::new(0),
            last_decompose_prompt: Mutex::new(String::new()),
            fail_decompose: false,
        }
    }

    fn failing() -> Self {
        let mut t = Self::with_scores(vec![]);
        t.fail_decompose = true;
        t
    }
}

#[async_trait]
impl SemanticTransform for ScriptedTransform {
    async fn decompose(&self, _input: &str, prompt: &str) -> Result<Option<Decomposition>> {
        if self.fail_decompose {
            return Err(anyhow!("provider unreachable"));
        }
        self.decompose_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_decompose_prompt.lock().unwrap() = prompt.to_string();
        Ok(Some(Decomposition {
            normal_statements: "send promo to high spenders, otherwise do nothing".to_string(),
            schedule: "every day at 9am".to_string(),
        }))
    }

    async fn extract_segments(&self, _: &str, _: &str) -> Result<Vec<SegmentExtraction>> {
        Ok(vec![SegmentExtraction {
            rule: "If ARPU >= 10 send promo over SMS".to_string(),
            ..Default::default()
        }])
    }

    async fn parse_schedule(&self, _: &str, _: &str) -> Result<Option<ScheduleFields>> {
        Ok(Some(ScheduleFields {
            schedule_type: "Daily".to_string(),
            repeat: "Yes".to_string(),
            ..Default::default()
        }))
    }

    async fn convert_rule(&self, _: &str, _: &str) -> Result<Option<RuleOutline>> {
        Ok(Some(RuleOutline {
            segments: vec!["ARPU >= 10".to_string(), "Region = 'north'".to_string()],
            actions: "Action: Send Promotion, Channel: SMS, Message_ID: 42".to_string(),
            ..Default::default()
        }))
    }

    async fn score_similarity(&self, _: &str, _: &str, _: &str) -> Result<Option<f64>> {
        Ok(self
            .scores
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Some(0.95)))
    }

    async fn refine_prompt(
        &self,
        _: &str,
        _: &str,
        _: &str,
        _: &str,
        _: &str,
    ) -> Result<Option<String>> {
        let n = self.refine_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Some(format!("refined prompt #{}", n)))
    }
}

fn workflow(transform: Arc<ScriptedTransform>) -> ConversionWorkflow {
    ConversionWorkflow::new(transform, PromptRegistry::builtin(), "test-model")
}

#[tokio::test]
async fn empty_input_aborts_without_touching_the_transform() {
    let transform = Arc::new(ScriptedTransform::with_scores(vec![]));
    let outcome = workflow(transform.clone()).run("").await.unwrap();

    assert_eq!(outcome.phase, Phase::AbortedInvalid);
    assert!(outcome.state.failed);
    assert!(outcome.state.tree.is_none());
    assert!(outcome.rule_json.is_none());
    let validation = outcome.state.validation.unwrap();
    assert!(!validation.is_valid);
    assert!(!validation.issues.is_empty());
    assert_eq!(transform.decompose_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn high_scores_reach_done_without_refinement() {
    let transform = Arc::new(ScriptedTransform::with_scores(vec![Some(0.95), Some(0.9)]));
    let outcome = workflow(transform.clone())
        .run("If ARPU is above 10 send an SMS promotion, every day at 9am")
        .await
        .unwrap();

    assert_eq!(outcome.phase, Phase::Done);
    assert!(outcome.succeeded());
    assert!(!outcome.state.failed);
    assert_eq!(transform.decompose_calls.load(Ordering::SeqCst), 1);
    assert_eq!(transform.refine_calls.load(Ordering::SeqCst), 0);
    assert_eq!(outcome.state.decomposition.retry_count, 0);
    assert_eq!(outcome.state.decomposition.consistency_score, Some(0.95));

    let tree = outcome.state.tree.as_ref().unwrap();
    assert!(tree.find_first(&NodeType::ScheduleDetails).is_some());
    assert!(tree.find_first(&NodeType::IfCondition).is_some());

    let doc = outcome.rule_json.unwrap();
    let rules = &doc[0]["detail"]["rules"];
    assert_eq!(rules["id"], "0");
    assert_eq!(rules["pid"], "#");
    let children = rules["childrens"].as_array().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0]["id"], "0_0");
    assert_eq!(children[0]["childrens"][0]["id"], "0_0_0");
    assert_eq!(rules["schedule"]["field"][2]["value"], "Daily");
}

#[tokio::test]
async fn persistent_low_score_refines_three_times_then_advances() {
    // Decomposition gate fails four attempts, condition gate passes.
    let transform = Arc::new(ScriptedTransform::with_scores(vec![
        Some(0.5),
        Some(0.5),
        Some(0.5),
        Some(0.5),
        Some(0.9),
    ]));
    let outcome = workflow(transform.clone())
        .run("If ARPU is above 10 send an SMS promotion")
        .await
        .unwrap();

    assert_eq!(outcome.phase, Phase::Done);
    assert!(!outcome.state.failed);
    assert_eq!(transform.refine_calls.load(Ordering::SeqCst), 3);
    assert_eq!(transform.decompose_calls.load(Ordering::SeqCst), 4);
    assert_eq!(outcome.state.decomposition.retry_count, 3);
    assert!(outcome.state.decomposition.best_effort);
    assert!(!outcome.state.condition.best_effort);
}

#[tokio::test]
async fn failed_gate_retries_with_the_refined_prompt() {
    let transform = Arc::new(ScriptedTransform::with_scores(vec![
        Some(0.5),
        Some(0.95),
        Some(0.9),
    ]));
    let outcome = workflow(transform.clone())
        .run("If ARPU is above 10 send an SMS promotion")
        .await
        .unwrap();

    assert_eq!(outcome.phase, Phase::Done);
    assert_eq!(transform.decompose_calls.load(Ordering::SeqCst), 2);
    assert_eq!(transform.refine_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        *transform.last_decompose_prompt.lock().unwrap(),
        "refined prompt #1"
    );
    assert!(!outcome.state.decomposition.best_effort);
    assert!(outcome.state.decomposition.feedback.is_some());
}

#[tokio::test]
async fn unavailable_score_is_a_normal_gate_failure() {
    // A `None` score counts as 0.0 and burns a retry; afterwards the run
    // recovers and finishes.
    let transform = Arc::new(ScriptedTransform::with_scores(vec![
        None,
        Some(0.95),
        Some(0.9),
    ]));
    let outcome = workflow(transform.clone())
        .run("If ARPU is above 10 send an SMS promotion")
        .await
        .unwrap();

    assert_eq!(outcome.phase, Phase::Done);
    assert_eq!(transform.refine_calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.state.decomposition.retry_count, 1);
}

#[tokio::test]
async fn transport_error_is_terminal() {
    let transform = Arc::new(ScriptedTransform::failing());
    let outcome = workflow(transform)
        .run("If ARPU is above 10 send an SMS promotion")
        .await
        .unwrap();

    assert_eq!(outcome.phase, Phase::Failed);
    assert!(outcome.state.failed);
    assert!(outcome
        .state
        .failure_reason
        .unwrap()
        .contains("transform error"));
    assert!(outcome.rule_json.is_none());
}

#[tokio::test]
async fn custom_retry_budget_is_honored() {
    let yaml = r#"
prompts:
  statement_decomposition_prompt:
    template: "decompose {{input_text}}"
    consistency_threshold: 0.8
    max_retries: 1
"#;
    let registry = PromptRegistry::from_yaml(yaml).unwrap();
    let transform = Arc::new(ScriptedTransform::with_scores(vec![
        Some(0.5),
        Some(0.5),
        Some(0.9),
    ]));
    let outcome = ConversionWorkflow::new(transform.clone(), registry, "test-model")
        .run("If ARPU is above 10 send an SMS promotion")
        .await
        .unwrap();

    assert_eq!(outcome.phase, Phase::Done);
    assert_eq!(transform.decompose_calls.load(Ordering::SeqCst), 2);
    assert_eq!(transform.refine_calls.load(Ordering::SeqCst), 1);
    assert!(outcome.state.decomposition.best_effort);
}
