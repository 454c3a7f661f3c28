//! Decomposition Stage
//!
//! First transform stage: split the validated input into its normal
//! statement(s) and any schedule text, and build the initial tree. Retries
//! rebuild the tree from scratch, so a refined attempt starts clean.

use anyhow::Result;
use tracing::info;

use crate::model::{NodeType, RuleNode, RuleTree};
use crate::transform::SemanticTransform;

use super::StageOutcome;

pub async fn run_decompose(
    input: &str,
    prompt: &str,
    transform: &dyn SemanticTransform,
    model_tag: &str,
    tree_slot: &mut Option<RuleTree>,
) -> Result<StageOutcome> {
    let Some(decomposition) = transform.decompose(input, prompt).await? else {
        return Ok(StageOutcome::failure("decomposition returned no usable output"));
    };

    if decomposition.normal_statements.trim().is_empty() {
        return Ok(StageOutcome::failure("decomposition produced no statements"));
    }

    let mut root = RuleNode::new(NodeType::Root, input, model_tag);
    root.add_child(RuleNode::new(
        NodeType::NormalStatements,
        decomposition.normal_statements.clone(),
        model_tag,
    ));
    if !decomposition.schedule.trim().is_empty() {
        root.add_child(RuleNode::new(
            NodeType::Schedule,
            decomposition.schedule.clone(),
            model_tag,
        ));
    }

    let mut tree = RuleTree::new();
    tree.set_root(root);
    *tree_slot = Some(tree);

    info!(
        has_schedule = !decomposition.schedule.trim().is_empty(),
        "decomposition complete"
    );

    let snapshot = serde_json::json!({
        "normal_statements": decomposition.normal_statements,
        "schedule": decomposition.schedule,
    })
    .to_string();
    Ok(StageOutcome::ok(snapshot))
}
