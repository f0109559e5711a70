use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::error::PaperError;
use crate::paper::{PaperContext, PaperReference, Resolution};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ReadRequest {
    #[serde(flatten)]
    reference: PaperReference,
    /// Custom reading prompt; present selects freeform mode.
    prompt: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/paper/search", post(search))
        .route("/api/paper/read", post(read))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ))
        .route("/health", get(health))
        .with_state(state)
}

/// Shared-secret gate; a missing NEOCORTICA_API_KEY disables it.
async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Some(expected) = &state.api_key {
        let provided = req
            .headers()
            .get("X-API-Key")
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "unauthorized" })),
            )
                .into_response();
        }
    }
    next.run(req).await
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn search(
    State(state): State<AppState>,
    Json(reference): Json<PaperReference>,
) -> Response {
    match search_impl(&state, &reference).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => error_response(e),
    }
}

async fn read(State(state): State<AppState>, Json(request): Json<ReadRequest>) -> Response {
    match read_impl(&state, request).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => error_response(e),
    }
}

async fn search_impl(
    state: &AppState,
    reference: &PaperReference,
) -> Result<serde_json::Value, PaperError> {
    let ctx = resolve_full(state, reference).await?;
    let markdown = state.searcher.paper_md(&ctx).await?;
    Ok(json!({ "title": ctx.title, "url": ctx.url, "markdown": markdown }))
}

async fn read_impl(state: &AppState, request: ReadRequest) -> Result<serde_json::Value, PaperError> {
    let ctx = resolve_full(state, &request.reference).await?;
    let markdown = state.searcher.paper_md(&ctx).await?;
    let response = state
        .reader
        .read(&markdown, request.prompt.as_deref())
        .await?;
    Ok(json!({ "title": ctx.title, "url": ctx.url, "response": response }))
}

/// A partial (title-only) resolution has no identity to fetch by, so the
/// HTTP surface reports it as an error the caller can act on.
async fn resolve_full(
    state: &AppState,
    reference: &PaperReference,
) -> Result<PaperContext, PaperError> {
    match state.searcher.resolve(reference).await? {
        Resolution::Full(ctx) => Ok(ctx),
        Resolution::TitleOnly(title) => Err(PaperError::UnresolvedTitle(title)),
    }
}

fn error_response(e: PaperError) -> Response {
    let status = match &e {
        PaperError::MissingIdentity => StatusCode::BAD_REQUEST,
        PaperError::TitleNotFound(_) | PaperError::UnresolvedTitle(_) => StatusCode::NOT_FOUND,
        PaperError::ConversionStatus(_)
        | PaperError::ConversionRequest(_)
        | PaperError::EmptyContent
        | PaperError::CompletionService(_)
        | PaperError::Network(_) => StatusCode::BAD_GATEWAY,
        PaperError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(%status, error = %e, "request failed");
    (status, Json(json!({ "error": e.to_string() }))).into_response()
}
