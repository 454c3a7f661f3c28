//! Consistency Gate
//!
//! Compares a node's original text against the combined text of its direct
//! children and decides whether the stage that produced those children may
//! advance. A score that cannot be obtained counts as 0.0; the gate can
//! fail an attempt but never crashes the workflow.

use anyhow::Result;
use tracing::{info, warn};

use crate::model::{NodeType, RuleTree};
use crate::transform::SemanticTransform;

/// Which part of the tree the gate inspects
#[derive(Debug, Clone)]
pub enum GateScope {
    /// All direct children of the tree root
    Root,
    /// Direct children of each `parent`-typed node, filtered to
    /// `child`-typed nodes
    Within { parent: NodeType, child: NodeType },
}

/// Result of one gate check
#[derive(Debug, Clone)]
pub struct GateOutcome {
    /// Effective score (unavailable scores collapse to 0.0)
    pub score: f64,
    pub passed: bool,
    /// Text of the lowest-scoring checked node
    pub original: String,
    /// Combined children text that was scored
    pub children: String,
    /// Set when the check was decided without a transform call
    pub note: Option<String>,
}

/// Gate over one stage's output
pub struct ConsistencyGate<'a> {
    transform: &'a dyn SemanticTransform,
    template: &'a str,
    threshold: f64,
}

impl<'a> ConsistencyGate<'a> {
    pub fn new(transform: &'a dyn SemanticTransform, template: &'a str, threshold: f64) -> Self {
        Self {
            transform,
            template,
            threshold,
        }
    }

    /// Check the tree under the given scope, storing the score on each
    /// checked node. With several scoped parents the decision uses the
    /// minimum score.
    pub async fn check(&self, tree: &mut RuleTree, scope: &GateScope) -> Result<GateOutcome> {
        let mut worst: Option<GateOutcome> = None;

        match scope {
            GateScope::Root => {
                let Some(root) = tree.root_mut() else {
                    return Ok(self.skipped("no tree to check"));
                };
                let children = join_child_texts(root.children().iter().map(|c| c.text.as_str()));
                let outcome = self.check_one(&root.text, children).await?;
                root.similarity_score = Some(outcome.score);
                worst = Some(outcome);
            }
            GateScope::Within { parent, child } => {
                for node in tree.nodes_of_type_mut(parent) {
                    let children = join_child_texts(
                        node.children()
                            .iter()
                            .filter(|c| c.node_type == *child)
                            .map(|c| c.text.as_str()),
                    );
                    let outcome = self.check_one(&node.text, children).await?;
                    node.similarity_score = Some(outcome.score);
                    let is_worse = worst.as_ref().map_or(true, |w| outcome.score < w.score);
                    if is_worse {
                        worst = Some(outcome);
                    }
                }
            }
        }

        let outcome = worst.unwrap_or_else(|| self.skipped("no children to compare"));
        if outcome.passed {
            info!(score = outcome.score, threshold = self.threshold, "consistency check passed");
        } else {
            warn!(
                score = outcome.score,
                threshold = self.threshold,
                note = outcome.note.as_deref().unwrap_or(""),
                "consistency check failed"
            );
        }
        Ok(outcome)
    }

    async fn check_one(&self, original: &str, children: Option<String>) -> Result<GateOutcome> {
        let Some(children) = children else {
            return Ok(GateOutcome {
                original: original.to_string(),
                ..self.skipped("no children to compare")
            });
        };
        let score = self
            .transform
            .score_similarity(original, &children, self.template)
            .await?;
        // An absent score can never pass the gate.
        let passed = score.map_or(false, |s| s >= self.threshold);
        Ok(GateOutcome {
            score: score.unwrap_or(0.0),
            passed,
            original: original.to_string(),
            children,
            note: score.is_none().then(|| "score unavailable".to_string()),
        })
    }

    fn skipped(&self, note: &str) -> GateOutcome {
        GateOutcome {
            score: 0.0,
            passed: false,
            original: String::new(),
            children: String::new(),
            note: Some(note.to_string()),
        }
    }
}

fn join_child_texts<'i>(texts: impl Iterator<Item = &'i str>) -> Option<String> {
    let collected: Vec<&str> = texts.collect();
    if collected.is_empty() {
        None
    } else {
        Some(collected.join("\n"))
    }
}
