//! text2rule CLI
//!
//! Runs one policy text through the conversion workflow and prints the
//! resulting tree and rule JSON.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;

use text2rule::config::PromptRegistry;
use text2rule::llm::create_llm_client;
use text2rule::render::render_ascii;
use text2rule::transform::LlmTransform;
use text2rule::workflow::{ConversionWorkflow, Phase};

#[derive(Parser)]
#[command(name = "text2rule", about = "Convert a campaign policy text into a structured rule")]
struct Args {
    /// Policy text to convert (reads stdin when omitted)
    input: Option<String>,

    /// Prompt registry YAML (builtin prompts when omitted)
    #[arg(long)]
    prompts: Option<PathBuf>,

    /// Provider override (anthropic or openai)
    #[arg(long)]
    provider: Option<String>,

    /// Model override
    #[arg(long)]
    model: Option<String>,

    /// Seconds to pause before each model call
    #[arg(long, default_value_t = 12)]
    call_delay: u64,

    /// Print the rule JSON only, skipping the tree rendering
    #[arg(long)]
    json_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "text2rule=info".into()),
        )
        .init();

    let args = Args::parse();
    let input = match args.input {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)?;
            buffer
        }
    };

    let registry = match &args.prompts {
        Some(path) => PromptRegistry::from_path(path)?,
        None => PromptRegistry::builtin(),
    };

    let mut model_config = registry.model().clone();
    if let Some(provider) = args.provider {
        model_config.provider = Some(provider);
    }
    if let Some(model) = args.model {
        model_config.model = Some(model);
    }
    let client = create_llm_client(&model_config)?;
    let model_tag = format!("{}/{}", client.provider_name(), client.model_name());
    let transform =
        LlmTransform::new(client).with_call_delay(Duration::from_secs(args.call_delay));

    let workflow = ConversionWorkflow::new(Arc::new(transform), registry, model_tag);
    let outcome = workflow.run(input.trim()).await?;

    match outcome.phase {
        Phase::Done => {
            if !args.json_only {
                if let Some(tree) = outcome.state.tree.as_ref() {
                    println!("{}", render_ascii(tree));
                }
            }
            if let Some(rule_json) = outcome.rule_json.as_ref() {
                println!("{}", serde_json::to_string_pretty(rule_json)?);
            }
            Ok(())
        }
        Phase::AbortedInvalid => {
            let issues = outcome
                .state
                .validation
                .map(|v| v.issues.join("; "))
                .unwrap_or_default();
            Err(anyhow!("input rejected: {}", issues))
        }
        phase => Err(anyhow!(
            "workflow ended in {:?}: {}",
            phase,
            outcome
                .state
                .failure_reason
                .unwrap_or_else(|| "unknown failure".to_string())
        )),
    }
}
