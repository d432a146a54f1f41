use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;
use lore_service::{
	CorpusStats, IngestRequest, IngestionReport, RebuildReport, ResearchRequest, ResearchResponse,
	ServiceError,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/research", post(research))
		.route("/v1/papers", post(ingest_papers))
		.route("/v1/corpus/stats", get(corpus_stats))
		.with_state(state)
}

/// Bound to loopback only; rebuilds are not for the public surface.
pub fn admin_router(state: AppState) -> Router {
	Router::new().route("/v1/admin/semantic/rebuild", post(rebuild_semantic)).with_state(state)
}

async fn health() -> Json<serde_json::Value> {
	Json(serde_json::json!({ "status": "ok" }))
}

async fn research(
	State(state): State<AppState>,
	Json(payload): Json<ResearchRequest>,
) -> Result<Json<ResearchResponse>, ApiError> {
	let response = state.service.ensure_sufficient(payload).await?;
	Ok(Json(response))
}

async fn ingest_papers(
	State(state): State<AppState>,
	Json(payload): Json<IngestRequest>,
) -> Result<Json<IngestionReport>, ApiError> {
	let report = state.service.ingest(payload.papers).await?;
	Ok(Json(report))
}

async fn corpus_stats(State(state): State<AppState>) -> Result<Json<CorpusStats>, ApiError> {
	let stats = state.service.corpus_stats().await?;
	Ok(Json(stats))
}

async fn rebuild_semantic(State(state): State<AppState>) -> Result<Json<RebuildReport>, ApiError> {
	let report = state.service.rebuild_semantic().await?;
	Ok(Json(report))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let (status, error_code) = match &err {
			ServiceError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
			ServiceError::KeywordIndexUnavailable { .. } => {
				(StatusCode::SERVICE_UNAVAILABLE, "KEYWORD_INDEX_UNAVAILABLE")
			},
			ServiceError::SemanticIndexUnavailable { .. } => {
				(StatusCode::SERVICE_UNAVAILABLE, "SEMANTIC_INDEX_UNAVAILABLE")
			},
			ServiceError::Embedding { .. } => (StatusCode::BAD_GATEWAY, "EMBEDDING_UPSTREAM"),
		};

		Self { status, error_code, message: err.to_string() }
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code.to_string(), message: self.message };
		(self.status, Json(body)).into_response()
	}
}
