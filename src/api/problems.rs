// src/api/problems.rs
// Problem detection, listing and resolution endpoints

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::error::{ApiError, ApiResult, IntoApiError};
use crate::problems::{DetectionReport, ProblemKind, ProblemQuery};
use crate::state::AppState;

/// Optional body of a detection request
#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    pub username: Option<String>,
}

impl RunRequest {
    /// An empty body means a global run; a blank username does too
    fn parse(body: &[u8]) -> ApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| ApiError::bad_request("Invalid request body").with_details(e.to_string()))
    }

    fn scope(&self) -> Option<&str> {
        self.username.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// POST /problems/{category}
pub async fn run_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    body: Bytes,
) -> ApiResult<Json<DetectionReport>> {
    let kind: ProblemKind = category
        .parse()
        .map_err(|e: String| ApiError::not_found("Unknown problem category").with_details(e))?;
    let request = RunRequest::parse(&body)?;
    info!("Running {} detection for {}", kind, request.scope().unwrap_or("all citizens"));

    let report = state
        .problems
        .run(kind, request.scope(), true)
        .await
        .into_api_error(&format!("Failed to detect {kind} problems"))?;
    Ok(Json(report))
}

/// POST /problems/all
pub async fn run_all(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<DetectionReport>> {
    let request = RunRequest::parse(&body)?;
    info!("Running every detector for {}", request.scope().unwrap_or("all citizens"));

    let report = state
        .problems
        .run_all(request.scope(), true)
        .await
        .into_api_error("Failed to detect problems")?;
    Ok(Json(report))
}

/// GET /problems
pub async fn list_problems(
    State(state): State<AppState>,
    Query(query): Query<ProblemQuery>,
) -> ApiResult<Json<Value>> {
    let problems = state
        .problems
        .list(&query)
        .await
        .into_api_error("Failed to list problems")?;
    Ok(Json(json!({ "success": true, "problems": problems })))
}

/// GET /problems/{problemId}
pub async fn get_problem(State(state): State<AppState>, Path(problem_id): Path<String>) -> ApiResult<Json<Value>> {
    let problem = state
        .problems
        .get(&problem_id)
        .await
        .into_api_error("Failed to load problem")?
        .ok_or_else(|| ApiError::not_found("Problem not found"))?;
    Ok(Json(json!({ "success": true, "problem": problem })))
}

/// POST /problems/{problemId}/resolve
pub async fn resolve_problem(
    State(state): State<AppState>,
    Path(problem_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let problem = state
        .problems
        .resolve(&problem_id)
        .await
        .into_api_error("Failed to resolve problem")?
        .ok_or_else(|| ApiError::not_found("Problem not found"))?;
    Ok(Json(json!({ "success": true, "problem": problem })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_request_parsing() {
        assert!(RunRequest::parse(b"").unwrap().scope().is_none());
        assert!(RunRequest::parse(b"  \n").unwrap().scope().is_none());
        assert!(RunRequest::parse(b"{}").unwrap().scope().is_none());
        assert!(RunRequest::parse(br#"{"username": "  "}"#).unwrap().scope().is_none());
        assert_eq!(
            RunRequest::parse(br#"{"username": "marco"}"#).unwrap().scope(),
            Some("marco")
        );
        assert!(RunRequest::parse(b"{nope").is_err());
    }
}
