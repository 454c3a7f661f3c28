//! Condition Extraction Stage
//!
//! Replaces the children of every normal-statements node with one segment
//! node per extracted targeting rule. Runs inside the second gated loop.

use anyhow::Result;
use tracing::info;

use crate::model::{NodeType, RuleNode, RuleTree};
use crate::transform::SemanticTransform;

use super::StageOutcome;

pub async fn run_condition_extract(
    tree: &mut RuleTree,
    template: &str,
    transform: &dyn SemanticTransform,
    model_tag: &str,
) -> Result<StageOutcome> {
    let targets = tree.nodes_of_type_mut(&NodeType::NormalStatements);
    if targets.is_empty() {
        return Ok(StageOutcome::failure("no statements node to extract conditions from"));
    }

    let mut produced = Vec::new();
    for node in targets {
        node.clear_children();
        let extractions = transform.extract_segments(&node.text, template).await?;
        for extraction in &extractions {
            let text = extraction.display_text();
            node.add_child(RuleNode::new(NodeType::Segment, text.clone(), model_tag));
            produced.push(text);
        }
    }

    info!(segments = produced.len(), "condition extraction complete");
    Ok(StageOutcome::ok(produced.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{Decomposition, RuleOutline, ScheduleFields, SegmentExtraction};
    use async_trait::async_trait;

    struct Extractor(Vec<SegmentExtraction>);

    #[async_trait]
    impl SemanticTransform for Extractor {
        async fn decompose(&self, _: &str, _: &str) -> Result<Option<Decomposition>> {
            Ok(None)
        }
        async fn extract_segments(&self, _: &str, _: &str) -> Result<Vec<SegmentExtraction>> {
            Ok(self.0.clone())
        }
        async fn parse_schedule(&self, _: &str, _: &str) -> Result<Option<ScheduleFields>> {
            Ok(None)
        }
        async fn convert_rule(&self, _: &str, _: &str) -> Result<Option<RuleOutline>> {
            Ok(None)
        }
        async fn score_similarity(&self, _: &str, _: &str, _: &str) -> Result<Option<f64>> {
            Ok(None)
        }
        async fn refine_prompt(
            &self,
            _: &str,
            _: &str,
            _: &str,
            _: &str,
            _: &str,
        ) -> Result<Option<String>> {
            Ok(None)
        }
    }

    fn statements_tree() -> RuleTree {
        let mut root = RuleNode::new(NodeType::Root, "input", "test");
        root.add_child(RuleNode::new(NodeType::NormalStatements, "A, otherwise B", "test"));
        let mut tree = RuleTree::new();
        tree.set_root(root);
        tree
    }

    #[tokio::test]
    async fn test_replaces_children_with_segments() {
        let transform = Extractor(vec![
            SegmentExtraction {
                rule: "If ARPU >= 10 send promo".to_string(),
                ..Default::default()
            },
            SegmentExtraction {
                rule: String::new(),
                condition: "ARPU < 10".to_string(),
                actions: "do nothing".to_string(),
            },
        ]);
        let mut tree = statements_tree();
        // Stale children from an earlier attempt must not survive.
        tree.nodes_of_type_mut(&NodeType::NormalStatements)[0]
            .add_child(RuleNode::new(NodeType::Segment, "stale", "test"));

        let outcome = run_condition_extract(&mut tree, "t", &transform, "test")
            .await
            .unwrap();
        assert!(!outcome.failed);

        let statements = tree.find_first(&NodeType::NormalStatements).unwrap();
        let texts: Vec<_> = statements.children().iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "If ARPU >= 10 send promo",
                "Condition: ARPU < 10 -> Action: do nothing"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_statements_node_fails() {
        let transform = Extractor(vec![]);
        let mut tree = RuleTree::new();
        tree.set_root(RuleNode::new(NodeType::Root, "input", "test"));
        let outcome = run_condition_extract(&mut tree, "t", &transform, "test")
            .await
            .unwrap();
        assert!(outcome.failed);
    }

    #[tokio::test]
    async fn test_empty_extraction_is_not_a_failure() {
        let transform = Extractor(vec![]);
        let mut tree = statements_tree();
        let outcome = run_condition_extract(&mut tree, "t", &transform, "test")
            .await
            .unwrap();
        // The gate rejects the empty result; the controller itself succeeds.
        assert!(!outcome.failed);
        let statements = tree.find_first(&NodeType::NormalStatements).unwrap();
        assert!(statements.children().is_empty());
    }
}
