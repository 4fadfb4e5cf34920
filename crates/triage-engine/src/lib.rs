pub mod classifier_cli;
pub mod constrain;
pub mod error;
pub mod executor;
pub mod expand;
pub mod history;
pub mod parser;
pub mod prompts;
pub mod schedule;
pub mod scorer;
pub mod selector;
pub mod tiers;

pub mod test_support;

pub use classifier_cli::{check_cli_available, invoke_classifier, ClassifierCliConfig, CliScorer};
pub use error::EngineError;
pub use executor::{AgentOutcome, AgentRunner, BatchExecutor, ExecutionReport, OutcomeStatus};
pub use scorer::{RuleScorer, SignalScorer};
pub use selector::{SelectionStore, Selector};
