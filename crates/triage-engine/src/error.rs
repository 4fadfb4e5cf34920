use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Classifier CLI error: {0}")]
    Classifier(String),

    #[error("Scorer error: {0}")]
    Scorer(String),

    #[error("Candidate parse error: {0}")]
    Parse(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("Agent runner error: {0}")]
    Runner(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] triage_models::ConfigError),
}
