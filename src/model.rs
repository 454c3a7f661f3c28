//! Rule Tree Model
//!
//! Ordered, mutable n-ary tree grown by the workflow stages. Each node owns
//! its children, so the tree is connected and acyclic by construction.

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

/// Node classification used by the stage controllers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    NormalStatements,
    Segment,
    Schedule,
    ScheduleDetails,
    Action,
    ActionDetails,
    Policy,
    Sampling,
    IfCondition,
    SegmentsGroup,
    /// Open-ended tag for node types the engine does not special-case
    Other(String),
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Root => "root",
            NodeType::NormalStatements => "normal_statements",
            NodeType::Segment => "segment",
            NodeType::Schedule => "schedule",
            NodeType::ScheduleDetails => "schedule_details",
            NodeType::Action => "action",
            NodeType::ActionDetails => "action_details",
            NodeType::Policy => "policy",
            NodeType::Sampling => "sampling",
            NodeType::IfCondition => "if_condition",
            NodeType::SegmentsGroup => "segments",
            NodeType::Other(tag) => tag,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single node in the rule tree
#[derive(Debug, Clone)]
pub struct RuleNode {
    pub node_type: NodeType,
    /// Free text carried by the node (statement, summary, rendered rule)
    pub text: String,
    /// Provenance: which model produced this node's text
    pub model_tag: String,
    /// Consistency score, set only on nodes the gate has checked
    pub similarity_score: Option<f64>,
    children: Vec<RuleNode>,
}

impl RuleNode {
    pub fn new(node_type: NodeType, text: impl Into<String>, model_tag: impl Into<String>) -> Self {
        Self {
            node_type,
            text: text.into(),
            model_tag: model_tag.into(),
            similarity_score: None,
            children: Vec::new(),
        }
    }

    /// Append a child, preserving insertion order
    pub fn add_child(&mut self, child: RuleNode) {
        self.children.push(child);
    }

    /// Drop all children. Stages call this before regenerating their output
    /// so a retried attempt starts from the same shape as the first.
    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    pub fn children(&self) -> &[RuleNode] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<RuleNode> {
        &mut self.children
    }

    /// Pre-order search for the first node of the given type
    pub fn find_first(&self, node_type: &NodeType) -> Option<&RuleNode> {
        if self.node_type == *node_type {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_first(node_type))
    }

    fn collect_of_type<'a>(&'a self, node_type: &NodeType, out: &mut Vec<&'a RuleNode>) {
        if self.node_type == *node_type {
            out.push(self);
            return;
        }
        for child in &self.children {
            child.collect_of_type(node_type, out);
        }
    }

    fn collect_of_type_mut<'a>(&'a mut self, node_type: &NodeType, out: &mut Vec<&'a mut RuleNode>) {
        if self.node_type == *node_type {
            // Matched subtrees are owned by their stage; do not descend.
            out.push(self);
            return;
        }
        for child in self.children.iter_mut() {
            child.collect_of_type_mut(node_type, out);
        }
    }
}

/// The tree grown across the workflow, plus a per-depth address cache
#[derive(Debug, Clone, Default)]
pub struct RuleTree {
    root: Option<RuleNode>,
    level_addresses: HashMap<u32, String>,
}

impl RuleTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_root(&mut self, root: RuleNode) {
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<&RuleNode> {
        self.root.as_ref()
    }

    pub fn root_mut(&mut self) -> Option<&mut RuleNode> {
        self.root.as_mut()
    }

    /// Pre-order search for the first node of the given type
    pub fn find_first(&self, node_type: &NodeType) -> Option<&RuleNode> {
        self.root.as_ref().and_then(|r| r.find_first(node_type))
    }

    /// All nodes of the given type in pre-order. The walk does not descend
    /// into a matched node, so each target subtree appears once.
    pub fn nodes_of_type(&self, node_type: &NodeType) -> Vec<&RuleNode> {
        let mut out = Vec::new();
        if let Some(root) = self.root.as_ref() {
            root.collect_of_type(node_type, &mut out);
        }
        out
    }

    /// Mutable variant of [`nodes_of_type`](Self::nodes_of_type)
    pub fn nodes_of_type_mut(&mut self, node_type: &NodeType) -> Vec<&mut RuleNode> {
        let mut out = Vec::new();
        if let Some(root) = self.root.as_mut() {
            root.collect_of_type_mut(node_type, &mut out);
        }
        out
    }

    /// Stable per-depth address, generated lazily and cached for the
    /// lifetime of the tree
    pub fn address_for_level(&mut self, level: u32) -> &str {
        self.level_addresses
            .entry(level)
            .or_insert_with(|| Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> RuleTree {
        let mut root = RuleNode::new(NodeType::Root, "input", "test");
        let mut statements = RuleNode::new(NodeType::NormalStatements, "a, otherwise b", "test");
        statements.add_child(RuleNode::new(NodeType::Segment, "a", "test"));
        statements.add_child(RuleNode::new(NodeType::Segment, "b", "test"));
        root.add_child(statements);
        root.add_child(RuleNode::new(NodeType::Schedule, "daily", "test"));
        let mut tree = RuleTree::new();
        tree.set_root(root);
        tree
    }

    #[test]
    fn test_find_first_is_preorder() {
        let tree = sample_tree();
        let found = tree.find_first(&NodeType::Segment).unwrap();
        assert_eq!(found.text, "a");
    }

    #[test]
    fn test_nodes_of_type_mut_does_not_descend_into_matches() {
        let mut tree = sample_tree();
        let statements = tree.nodes_of_type_mut(&NodeType::NormalStatements);
        assert_eq!(statements.len(), 1);
        // Segments live under the matched node, so a segment query still
        // finds them both.
        let segments = tree.nodes_of_type_mut(&NodeType::Segment);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_clear_children_makes_regeneration_idempotent() {
        let mut tree = sample_tree();
        for _ in 0..3 {
            let targets = tree.nodes_of_type_mut(&NodeType::NormalStatements);
            for node in targets {
                node.clear_children();
                node.add_child(RuleNode::new(NodeType::Segment, "x", "test"));
                node.add_child(RuleNode::new(NodeType::Segment, "y", "test"));
            }
        }
        let statements = tree.find_first(&NodeType::NormalStatements).unwrap();
        assert_eq!(statements.children().len(), 2);
    }

    #[test]
    fn test_address_for_level_is_cached() {
        let mut tree = sample_tree();
        let first = tree.address_for_level(1).to_string();
        let second = tree.address_for_level(1).to_string();
        assert_eq!(first, second);
        assert_ne!(first, tree.address_for_level(2));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let tree = sample_tree();
        let statements = tree.find_first(&NodeType::NormalStatements).unwrap();
        let texts: Vec<_> = statements.children().iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }
}
