//! Rule Conversion Stage
//!
//! Final transform stage: breaks each segment's rule sentence into typed
//! children (segments group, action, policy, schedule, sampling). The
//! segments group additionally gets a deterministic if-condition rendering
//! and the action node a details child, which is what the structured
//! conversion parses later.

use anyhow::Result;
use tracing::{info, warn};

use crate::model::{NodeType, RuleNode, RuleTree};
use crate::transform::SemanticTransform;

use super::StageOutcome;

pub async fn run_rule_convert(
    tree: &mut RuleTree,
    template: &str,
    transform: &dyn SemanticTransform,
    model_tag: &str,
) -> Result<StageOutcome> {
    let targets = tree.nodes_of_type_mut(&NodeType::Segment);
    if targets.is_empty() {
        warn!("no segments to convert");
        return Ok(StageOutcome::ok(""));
    }

    let mut converted = 0usize;
    for node in targets {
        node.clear_children();
        let Some(outline) = transform.convert_rule(&node.text, template).await? else {
            warn!(text = %node.text, "rule did not convert, leaving segment bare");
            continue;
        };

        if !outline.segments.is_empty() {
            let mut group = RuleNode::new(
                NodeType::SegmentsGroup,
                outline.segments.join("\n"),
                model_tag,
            );
            group.add_child(RuleNode::new(
                NodeType::IfCondition,
                render_if_condition(&outline.segments),
                model_tag,
            ));
            node.add_child(group);
        }
        if !outline.actions.trim().is_empty() {
            let mut action = RuleNode::new(NodeType::Action, outline.actions.clone(), model_tag);
            action.add_child(RuleNode::new(
                NodeType::ActionDetails,
                outline.actions.clone(),
                model_tag,
            ));
            node.add_child(action);
        }
        if !outline.policy.trim().is_empty() {
            node.add_child(RuleNode::new(NodeType::Policy, outline.policy, model_tag));
        }
        if !outline.schedule.trim().is_empty() {
            node.add_child(RuleNode::new(NodeType::Schedule, outline.schedule, model_tag));
        }
        if !outline.sampling.trim().is_empty() {
            node.add_child(RuleNode::new(NodeType::Sampling, outline.sampling, model_tag));
        }
        converted += 1;
    }

    info!(converted, "rule conversion complete");
    Ok(StageOutcome::ok(format!("{} rules converted", converted)))
}

/// `["A", "B"]` renders as `if (A) AND (B)`
fn render_if_condition(segments: &[String]) -> String {
    format!("if ({})", segments.join(") AND ("))
}
