use std::io::Read;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use triage_models::config::TriageConfig;
use triage_models::request::RequestContext;

#[derive(Parser, Debug)]
#[command(name = "triage", about = "Context-aware sub-agent selection engine")]
struct Cli {
    /// The request to triage. Reads stdin when omitted.
    request: Option<String>,

    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Path to a JSON file with ambient request context (files, errors).
    #[arg(long)]
    context: Option<String>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load config
    let config = match &cli.config {
        Some(path) => {
            let config_str = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {path}"))?;
            toml::from_str::<TriageConfig>(&config_str).with_context(|| "Failed to parse config")?
        }
        None => TriageConfig::default(),
    };

    // Read the request text
    let request_text = match &cli.request {
        Some(text) => text.clone(),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
    };

    // Optional ambient context
    let context = match &cli.context {
        Some(path) => {
            let context_str = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read context: {path}"))?;
            serde_json::from_str::<RequestContext>(&context_str)
                .context("Failed to parse RequestContext JSON")?
        }
        None => RequestContext::default(),
    };

    // Build the selector and run the selection
    let selector = triage::build_selector(config).context("Failed to build selector")?;

    let result = triage::select(&selector, request_text.trim(), &context).await;

    // Output the selection as JSON to stdout
    let output = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{output}");

    Ok(())
}
