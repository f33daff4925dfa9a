use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use ai_visibility::{PromptResult, VisibilityOrchestrator, VisibilityReport, VisibilityRequest};

#[derive(Clone)]
pub struct VisibilityServer {
    orchestrator: Arc<VisibilityOrchestrator>,
    tool_router: ToolRouter<VisibilityServer>,
}

impl VisibilityServer {
    pub fn new(orchestrator: Arc<VisibilityOrchestrator>) -> Self {
        Self {
            orchestrator,
            tool_router: Self::tool_router(),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CheckVisibilityParams {
    /// Your own domain, e.g. "brightdata.com".
    domain: String,
    /// Competitor domains to compare against. Pass an empty list for none.
    competitors: Vec<String>,
    /// Prompts to put to the model, e.g. "best residential proxy provider".
    prompts: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ScoreAnswerParams {
    /// An answer that was already generated by some model.
    answer: String,
    /// Domains to score, primary domain first.
    domains: Vec<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
struct CheckVisibilityResponse {
    success: bool,
    visibility: VisibilityReport,
}

#[tool_router]
impl VisibilityServer {
    #[tool(description = "Ask the model about each prompt, extract which companies it mentions, and score how visible each domain is (0-1). Returns per-prompt scores, the raw answer and the extracted analysis; failed prompts carry an error field.")]
    async fn check_visibility(
        &self,
        Parameters(params): Parameters<CheckVisibilityParams>,
    ) -> Result<Json<CheckVisibilityResponse>, String> {
        let request = VisibilityRequest {
            domain: params.domain.trim().to_string(),
            competitors: Some(
                params
                    .competitors
                    .into_iter()
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect(),
            ),
            prompts: params.prompts,
        };
        let visibility = self
            .orchestrator
            .check(&request)
            .await
            .map_err(|e| e.to_string())?;
        Ok(Json(CheckVisibilityResponse {
            success: true,
            visibility,
        }))
    }

    #[tool(description = "Score an existing model answer for the given domains without generating a new one. Runs entity extraction on the answer, then scores each domain (0-1).")]
    async fn score_answer(
        &self,
        Parameters(params): Parameters<ScoreAnswerParams>,
    ) -> Result<Json<PromptResult>, String> {
        if params.answer.trim().is_empty() {
            return Err("answer must not be empty".to_string());
        }
        if params.domains.iter().all(|d| d.trim().is_empty()) {
            return Err("domains must not be empty".to_string());
        }
        let result = self
            .orchestrator
            .score_answer(params.answer, &params.domains)
            .await;
        Ok(Json(result))
    }
}

#[tool_handler]
impl ServerHandler for VisibilityServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "ai-visibility".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "AI visibility checker. Use check_visibility with your domain, competitor \
domains and a list of prompts to see how prominently each company appears in generated \
answers about proxy services. Use score_answer to score text you already have."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VisibilityServer;

    #[test]
    fn tools_publish_output_schemas() {
        let tools = VisibilityServer::tool_router().list_all();
        for name in ["check_visibility", "score_answer"] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }
}
