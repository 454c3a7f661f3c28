//! Prompt Refinement
//!
//! Builds the feedback text handed to the refinement call and wraps the
//! transform's rewrite so a useless response falls back to the original
//! prompt instead of derailing the retry loop.

use anyhow::Result;
use tracing::info;

use crate::transform::SemanticTransform;

/// Feedback handed to the refinement prompt after a failed gate check
pub fn build_feedback(
    stage: &str,
    score: f64,
    threshold: f64,
    original: &str,
    children: &str,
) -> String {
    let hint = if score < 0.5 {
        "The derived statements lose most of the original meaning. Re-derive them from scratch."
    } else if score < 0.7 {
        "Significant details from the original are missing or altered. Keep every branch, quantity and channel."
    } else {
        "Minor drift from the original. Tighten the wording so every constraint survives."
    };

    let mut lines = Vec::new();
    lines.push(format!(
        "The {} output failed its consistency check: score {:.2}, required {:.2}.",
        stage, score, threshold
    ));
    lines.push(format!("Original text:\n{}", original));
    if children.is_empty() {
        lines.push("Derived statements: none were produced.".to_string());
    } else {
        let enumerated: Vec<String> = children
            .lines()
            .enumerate()
            .map(|(i, line)| format!("{}. {}", i + 1, line))
            .collect();
        lines.push(format!("Derived statements:\n{}", enumerated.join("\n")));
    }
    lines.push(hint.to_string());
    lines.join("\n")
}

/// Ask the transform for a rewritten prompt; keep the original when the
/// rewrite comes back empty.
pub async fn refine_prompt(
    transform: &dyn SemanticTransform,
    template: &str,
    original_prompt: &str,
    input: &str,
    previous_output: &str,
    feedback: &str,
) -> Result<String> {
    match transform
        .refine_prompt(original_prompt, input, previous_output, feedback, template)
        .await?
    {
        Some(refined) => {
            info!(chars = refined.len(), "prompt refined");
            Ok(refined)
        }
        None => {
            info!("refinement produced nothing, keeping original prompt");
            Ok(original_prompt.to_string())
        }
    }
}
