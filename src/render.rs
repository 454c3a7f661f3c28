//! ASCII Tree Renderer
//!
//! Read-only rendering of the finished tree for logs and the CLI.

use std::fmt::Write;

use crate::model::{RuleNode, RuleTree};

/// Render the tree with box-drawing branches
pub fn render_ascii(tree: &RuleTree) -> String {
    let mut out = String::new();
    if let Some(root) = tree.root() {
        write_node(&mut out, root, "", true, true);
    } else {
        out.push_str("(empty tree)\n");
    }
    out
}

fn write_node(out: &mut String, node: &RuleNode, prefix: &str, is_last: bool, is_root: bool) {
    let connector = if is_root {
        ""
    } else if is_last {
        "└── "
    } else {
        "├── "
    };
    let score = node
        .similarity_score
        .map(|s| format!(" (score {:.2})", s))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "{}{}{}: {}{}",
        prefix,
        connector,
        node.node_type,
        summarize(&node.text),
        score
    );

    let child_prefix = if is_root {
        String::new()
    } else if is_last {
        format!("{}    ", prefix)
    } else {
        format!("{}│   ", prefix)
    };
    let count = node.children().len();
    for (i, child) in node.children().iter().enumerate() {
        write_node(out, child, &child_prefix, i + 1 == count, false);
    }
}

/// First line only, truncated so wide nodes stay on one row
fn summarize(text: &str) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > 80 {
        let truncated: String = line.chars().take(77).collect();
        format!("{}...", truncated)
    } else {
        line.to_string()
    }
}
