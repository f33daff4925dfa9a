pub mod config;
pub mod error;
pub mod extractor;
pub mod matching;
pub mod model;
pub mod normalizer;
pub mod orchestrator;
pub mod prompts;
pub mod scorer;

pub use error::VisibilityError;
pub use model::{Analysis, CompanyAliasGroup, PromptResult, VisibilityReport, VisibilityRequest};
pub use orchestrator::VisibilityOrchestrator;
pub use scorer::VisibilityScorer;
