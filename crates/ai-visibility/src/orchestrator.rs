use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use llm_common::error::LlmError;
use llm_common::generate::TextGenerator;
use tracing::{error, info, warn};

use crate::error::VisibilityError;
use crate::extractor::EntityExtractor;
use crate::model::{Analysis, PromptResult, VisibilityReport, VisibilityRequest};
use crate::normalizer::AliasNormalizer;
use crate::prompts;
use crate::scorer::VisibilityScorer;

/// Runs the scoring pipeline for a batch of prompts.
///
/// Prompts and domains are processed one at a time. A failed prompt records an
/// error in its own `PromptResult`; a failed domain scores 0. Neither affects
/// sibling units.
pub struct VisibilityOrchestrator {
    generator: Arc<dyn TextGenerator>,
    extractor: EntityExtractor,
    normalizer: AliasNormalizer,
    scorer: VisibilityScorer,
    call_timeout: Option<Duration>,
}

impl VisibilityOrchestrator {
    pub fn new(generator: Arc<dyn TextGenerator>, scorer: VisibilityScorer) -> Self {
        Self {
            extractor: EntityExtractor::new(Arc::clone(&generator)),
            generator,
            normalizer: AliasNormalizer::default(),
            scorer,
            call_timeout: None,
        }
    }

    /// Deadline for each generation call; expiry counts as a service failure.
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Validates the request, runs every prompt, and fails only if nothing came back.
    pub async fn check(
        &self,
        request: &VisibilityRequest,
    ) -> Result<VisibilityReport, VisibilityError> {
        validate(request)?;
        let report = self.run(&request.prompts, &request.domains()).await;
        if report.is_empty() {
            error!("no results generated");
            return Err(VisibilityError::NoResults);
        }
        info!(
            prompts = report.len(),
            failed = report.values().filter(|r| r.is_error()).count(),
            "visibility check finished"
        );
        Ok(report)
    }

    /// Scores `domains` for each prompt. Never fails; a repeated prompt overwrites
    /// the earlier entry.
    pub async fn run(&self, prompts: &[String], domains: &[String]) -> VisibilityReport {
        let mut report = VisibilityReport::new();
        for prompt in prompts {
            info!(prompt = %prompt, "processing prompt");
            let result = self.check_prompt(prompt, domains).await;
            if report.insert(prompt.clone(), result).is_some() {
                warn!(prompt = %prompt, "duplicate prompt, keeping the latest result");
            }
        }
        report
    }

    async fn check_prompt(&self, prompt: &str, domains: &[String]) -> PromptResult {
        let raw = match self
            .with_deadline(async {
                let framed = prompts::initial_answer_prompt(prompt);
                self.generator
                    .generate(&framed)
                    .await
                    .map_err(VisibilityError::from)
            })
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(prompt = %prompt, error = %e, "initial generation failed");
                return PromptResult::failed(format!("failed to get initial response: {e}"));
            }
        };

        self.score_answer(raw, domains).await
    }

    /// Extracts, normalizes and scores an answer that was generated elsewhere.
    pub async fn score_answer(&self, raw: String, domains: &[String]) -> PromptResult {
        let analysis = match self.analyze(&raw).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(error = %e, "analysis failed");
                return PromptResult::failed(format!("failed to analyze response: {e}"));
            }
        };

        let mut scores = IndexMap::new();
        for domain in domains {
            let score = match self.scorer.score(&raw, domain, Some(&analysis)) {
                Ok(score) => score,
                Err(e) => {
                    warn!(domain = %domain, error = %e, "scoring failed, using 0");
                    0.0
                }
            };
            scores.insert(domain.clone(), score);
        }
        info!(?scores, "visibility scores");

        PromptResult::scored(scores, raw, analysis)
    }

    async fn analyze(&self, raw: &str) -> Result<Analysis, VisibilityError> {
        let extracted = self.with_deadline(self.extractor.extract(raw)).await?;
        Ok(self.normalizer.normalize(extracted))
    }

    async fn with_deadline<T, F>(&self, fut: F) -> Result<T, VisibilityError>
    where
        F: Future<Output = Result<T, VisibilityError>>,
    {
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| VisibilityError::Service(LlmError::Timeout(limit)))?,
            None => fut.await,
        }
    }
}

/// Rejects requests that cannot produce any result, before any model call.
pub fn validate(request: &VisibilityRequest) -> Result<(), VisibilityError> {
    if request.domain.trim().is_empty() {
        return Err(VisibilityError::Validation("domain is required".to_string()));
    }
    if request.competitors.is_none() {
        return Err(VisibilityError::Validation(
            "competitors is required".to_string(),
        ));
    }
    if request.prompts.iter().all(|p| p.trim().is_empty()) {
        return Err(VisibilityError::Validation(
            "at least one non-empty prompt is required".to_string(),
        ));
    }
    Ok(())
}
