use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use ccdr_domain::Outcome;
use ccdr_service::Error;

use crate::state::AppState;

pub const QUERY_HASH_HEADER: &str = "x-query-hash";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route(
			"/equipment/{tag}",
			post(add_equipment).put(update_equipment).delete(remove_equipment),
		)
		.route("/search/{query}", get(search))
		.route("/feedback", post(feedback))
		.with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
	#[serde(default)]
	pub limit: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
	pub query_hash: String,
	pub tag: String,
	#[serde(default)]
	pub outcome: Option<Outcome>,
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn add_equipment(
	State(state): State<AppState>,
	Path(tag): Path<String>,
) -> Result<StatusCode, ApiError> {
	state.index.add_record(&tag).await?;

	Ok(StatusCode::OK)
}

async fn update_equipment(
	State(state): State<AppState>,
	Path(tag): Path<String>,
) -> Result<StatusCode, ApiError> {
	state.index.update_record(&tag).await?;

	Ok(StatusCode::OK)
}

async fn remove_equipment(
	State(state): State<AppState>,
	Path(tag): Path<String>,
) -> Result<StatusCode, ApiError> {
	state.index.remove_record(&tag)?;

	Ok(StatusCode::OK)
}

async fn search(
	State(state): State<AppState>,
	Path(query): Path<String>,
	Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
	let results = state.index.search(&query, params.limit).await?;

	Ok(([(QUERY_HASH_HEADER, results.query_hash)], Json(results.tags)).into_response())
}

async fn feedback(
	State(state): State<AppState>,
	Json(payload): Json<FeedbackRequest>,
) -> Result<StatusCode, ApiError> {
	state.index.feedback(&payload.query_hash, &payload.tag, payload.outcome.unwrap_or_default())?;

	Ok(StatusCode::OK)
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
impl ApiError {
	fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
		Self { status, error_code, message: message.into() }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		let message = err.to_string();

		match err {
			Error::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, "not_found", message),
			Error::InvalidRequest { .. } =>
				Self::new(StatusCode::BAD_REQUEST, "invalid_request", message),
			Error::InvalidRecord { .. } =>
				Self::new(StatusCode::BAD_REQUEST, "invalid_record", message),
			Error::EmbeddingTimeout { .. } =>
				Self::new(StatusCode::GATEWAY_TIMEOUT, "embedding_timeout", message),
			Error::EmbeddingUnavailable { .. } =>
				Self::new(StatusCode::BAD_GATEWAY, "embedding_unavailable", message),
			Error::UnknownCandidate { .. } | Error::RetrainFailed { .. } | Error::Storage { .. } => {
				tracing::error!(error = %message, "Request failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code.to_string(), message: self.message };

		(self.status, Json(body)).into_response()
	}
}
