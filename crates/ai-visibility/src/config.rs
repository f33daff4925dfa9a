use std::time::Duration;

use llm_common::openai::OpenAiClientConfig;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const DEFAULT_MODEL: &str = "gemini-pro";

/// Server configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai: OpenAiClientConfig,
    /// The single model used for both the initial answer and the extraction pass.
    pub model: String,
    /// Deadline applied to each generation call. `None` leaves only the HTTP timeout.
    pub call_timeout: Option<Duration>,
    pub scoring: ScoringConfig,
    /// Serve MCP over TCP on this address instead of stdio.
    pub mcp_tcp_listen_addr: Option<String>,
    /// Also serve `POST /api/check-visibility` on this address.
    pub http_listen_addr: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `GEMINI_API_KEY` or `OPENAI_API_KEY`
    ///
    /// Optional:
    /// - `OPENAI_BASE_URL`, `OPENAI_TIMEOUT_SECS`, `OPENAI_MAX_ERROR_BODY_BYTES`
    /// - `VISIBILITY_MODEL` (default "gemini-pro")
    /// - `VISIBILITY_CALL_TIMEOUT_SECS`
    /// - `VISIBILITY_SCORING_CONFIG`: path to a JSON `ScoringConfig`
    /// - `MCP_TCP_LISTEN_ADDR`, `HTTP_LISTEN_ADDR`
    pub fn from_env() -> Result<Self, AppError> {
        let openai = OpenAiClientConfig::from_env();
        if openai.api_key.is_none() {
            return Err(AppError::Config(
                "GEMINI_API_KEY is not set (OPENAI_API_KEY is also accepted)".to_string(),
            ));
        }

        let model = std::env::var("VISIBILITY_MODEL")
            .ok()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let call_timeout = match std::env::var("VISIBILITY_CALL_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| {
                    AppError::Config(format!(
                        "VISIBILITY_CALL_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"
                    ))
                })?;
                Some(Duration::from_secs(secs)).filter(|d| !d.is_zero())
            }
            Err(_) => None,
        };

        let scoring = match std::env::var("VISIBILITY_SCORING_CONFIG") {
            Ok(path) => ScoringConfig::from_file(&path)?,
            Err(_) => ScoringConfig::default(),
        };

        Ok(Self {
            openai,
            model,
            call_timeout,
            scoring,
            mcp_tcp_listen_addr: std::env::var("MCP_TCP_LISTEN_ADDR").ok(),
            http_listen_addr: std::env::var("HTTP_LISTEN_ADDR").ok(),
        })
    }
}

/// Relative weight of each sub-signal in the final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub mention: f64,
    pub position: f64,
    pub leadership: f64,
    pub relevance: f64,
    pub sentiment: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            mention: 0.3,
            position: 0.2,
            leadership: 0.2,
            relevance: 0.2,
            sentiment: 0.1,
        }
    }
}

/// Heuristic constants for `VisibilityScorer`.
///
/// Every field has a default, so a JSON file only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: SignalWeights,
    /// Total name occurrences at which the mention signal saturates.
    pub mention_saturation: f64,
    pub leadership_step: f64,
    pub leadership_cap: f64,
    /// Product-category vocabulary counted by the relevance signal.
    pub relevance_keywords: Vec<String>,
    pub relevance_step: f64,
    pub relevance_keyword_cap: f64,
    /// Positive or authority adjectives looked for near a company name.
    pub sentiment_keywords: Vec<String>,
    pub sentiment_step: f64,
    pub sentiment_keyword_cap: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            mention_saturation: 3.0,
            leadership_step: 0.2,
            leadership_cap: 0.5,
            relevance_keywords: [
                "proxy",
                "proxies",
                "web scraping",
                "data collection",
                "residential ip",
                "datacenter proxy",
                "rotating proxy",
                "ip address",
                "geolocation",
                "anonymity",
                "data extraction",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            relevance_step: 0.05,
            relevance_keyword_cap: 0.25,
            sentiment_keywords: [
                "leader",
                "best",
                "top",
                "reliable",
                "advanced",
                "innovative",
                "comprehensive",
                "excellent",
                "premier",
                "trusted",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            sentiment_step: 0.1,
            sentiment_keyword_cap: 0.2,
        }
    }
}

impl ScoringConfig {
    pub fn from_file(path: &str) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("cannot read scoring config {path}: {e}")))?;
        Self::from_json(&raw)
            .map_err(|e| AppError::Config(format!("invalid scoring config {path}: {e}")))
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
