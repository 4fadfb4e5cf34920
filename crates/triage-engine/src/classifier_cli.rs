use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use triage_models::candidate::Candidate;
use triage_models::config::ScorerConfig;
use triage_models::request::RequestContext;

use crate::error::EngineError;
use crate::parser::parse_candidates;
use crate::prompts::{classifier_system_prompt, classifier_user_prompt};
use crate::scorer::SignalScorer;

/// Configuration for one classifier CLI invocation.
#[derive(Debug, Clone)]
pub struct ClassifierCliConfig {
    pub command: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for ClassifierCliConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            model: "claude-3-5-haiku-latest".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl From<&ScorerConfig> for ClassifierCliConfig {
    fn from(config: &ScorerConfig) -> Self {
        Self {
            command: config.command.clone(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

/// Invoke the external classifier CLI with a system and user prompt.
/// Returns the raw stdout text.
pub async fn invoke_classifier(
    system_prompt: &str,
    user_prompt: &str,
    config: &ClassifierCliConfig,
) -> Result<String, EngineError> {
    debug!(command = %config.command, model = %config.model, "Invoking classifier CLI");

    let result = tokio::time::timeout(config.timeout, async {
        Command::new(&config.command)
            .args([
                "-p",
                user_prompt,
                "--system-prompt",
                system_prompt,
                "--model",
                &config.model,
                "--output-format",
                "text",
            ])
            .output()
            .await
    })
    .await
    .map_err(|_| EngineError::Timeout(config.timeout.as_secs()))?
    .map_err(|e| EngineError::Classifier(format!("Failed to spawn {}: {e}", config.command)))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        warn!(status = %result.status, stderr = %stderr, "Classifier CLI failed");
        return Err(EngineError::Classifier(format!(
            "{} exited {}: {}",
            config.command, result.status, stderr
        )));
    }

    let stdout = String::from_utf8_lossy(&result.stdout).to_string();
    if stdout.trim().is_empty() {
        return Err(EngineError::Classifier(
            "Classifier returned empty response".to_string(),
        ));
    }

    Ok(stdout)
}

/// Check whether the classifier command is available on the system.
pub async fn check_cli_available(command: &str) -> bool {
    match Command::new(command).arg("--version").output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

/// Scorer backed by the external classifier CLI.
///
/// Any failure (spawn, timeout, bad output) surfaces as an `Err`, which the
/// selection facade degrades into an explanatory empty result.
pub struct CliScorer {
    config: ClassifierCliConfig,
}

impl CliScorer {
    pub fn new(config: ClassifierCliConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SignalScorer for CliScorer {
    fn name(&self) -> &str {
        "classifier_cli"
    }

    async fn score(
        &self,
        request_text: &str,
        context: &RequestContext,
    ) -> Result<Vec<Candidate>, EngineError> {
        let system_prompt = classifier_system_prompt();
        let user_prompt = classifier_user_prompt(request_text, context);
        let raw = invoke_classifier(&system_prompt, &user_prompt, &self.config).await?;
        parse_candidates(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClassifierCliConfig::default();
        assert_eq!(config.command, "claude");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn config_from_scorer_settings() {
        let scorer = ScorerConfig {
            timeout_seconds: 12,
            ..ScorerConfig::default()
        };
        let config = ClassifierCliConfig::from(&scorer);
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.model, scorer.model);
    }

    #[tokio::test]
    async fn missing_command_reports_unavailable() {
        assert!(!check_cli_available("definitely-not-a-real-command-4871").await);
    }
}
