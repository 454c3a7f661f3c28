//! Schedule Extraction Stage
//!
//! Turns each schedule node's free text into a single schedule-details
//! child carrying a templated summary. Single attempt, not gated; a policy
//! without scheduling text skips this stage entirely.

use anyhow::Result;
use tracing::{info, warn};

use crate::model::{NodeType, RuleNode, RuleTree};
use crate::transform::SemanticTransform;

use super::StageOutcome;

const FALLBACK_SUMMARY: &str = "No schedule information available";

pub async fn run_schedule_extract(
    tree: &mut RuleTree,
    template: &str,
    transform: &dyn SemanticTransform,
    model_tag: &str,
) -> Result<StageOutcome> {
    let targets = tree.nodes_of_type_mut(&NodeType::Schedule);
    if targets.is_empty() {
        info!("no schedule text in this policy, skipping schedule extraction");
        return Ok(StageOutcome::ok(""));
    }

    let mut summaries = Vec::new();
    for node in targets {
        node.clear_children();
        let summary = match transform.parse_schedule(&node.text, template).await? {
            Some(fields) => fields.summary(),
            None => {
                warn!(text = %node.text, "schedule text did not parse, using fallback");
                FALLBACK_SUMMARY.to_string()
            }
        };
        node.add_child(RuleNode::new(
            NodeType::ScheduleDetails,
            summary.clone(),
            model_tag,
        ));
        summaries.push(summary);
    }

    Ok(StageOutcome::ok(summaries.join("\n")))
}
