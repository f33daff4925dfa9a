use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use ai_visibility::{VisibilityError, VisibilityOrchestrator, VisibilityRequest};

pub fn router(orchestrator: Arc<VisibilityOrchestrator>) -> Router {
    Router::new()
        .route("/api/check-visibility", post(check_visibility))
        .with_state(orchestrator)
}

pub async fn serve(addr: &str, orchestrator: Arc<VisibilityOrchestrator>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(listen_addr = %addr, "HTTP endpoint ready");
    axum::serve(listener, router(orchestrator)).await?;
    Ok(())
}

async fn check_visibility(
    State(orchestrator): State<Arc<VisibilityOrchestrator>>,
    body: Result<Json<VisibilityRequest>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection, "rejected request body");
            return failure(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };
    info!(
        domain = %request.domain,
        competitors = request.competitors.as_ref().map_or(0, Vec::len),
        prompts = request.prompts.len(),
        "check-visibility request"
    );

    match orchestrator.check(&request).await {
        Ok(report) => (
            StatusCode::OK,
            Json(json!({ "success": true, "visibility": report })),
        ),
        Err(VisibilityError::Validation(msg)) => {
            warn!(error = %msg, "missing required parameters");
            failure(
                StatusCode::BAD_REQUEST,
                format!("Missing required parameters: {msg}"),
            )
        }
        Err(e) => {
            error!(error = %e, "check-visibility failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn failure(status: StatusCode, message: String) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "success": false, "error": message })))
}
