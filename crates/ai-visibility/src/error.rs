use llm_common::error::LlmError;

/// Failures of the visibility pipeline.
///
/// `Validation` is fatal to a whole request. `Service` and `Parse` are caught per
/// prompt, `Scoring` per domain, and downgraded by the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum VisibilityError {
    #[error("generation service error: {0}")]
    Service(#[from] LlmError),

    #[error("failed to parse analysis JSON: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        /// Reply text after fence-stripping.
        cleaned: String,
    },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("scoring pattern error: {0}")]
    Scoring(#[from] regex::Error),

    #[error("no results generated")]
    NoResults,
}

/// Startup errors for the server binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
}
