//! Application endpoints: submit, status by game id, history by identifier.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use portal_core::PortalError;
use review::{storage_error, SubmissionInput};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use storage::{ApplicationStatus, HistoryQuery, PublicApplication, StatusSummary};

use crate::app::AppState;
use crate::routes::ApiError;

fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());
    forwarded.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    })
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// `POST /api/applications`: 201 with the public record, 400 on validation
/// failures, 409 on an active duplicate, 503 when persistence is down.
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut input): Json<SubmissionInput>,
) -> Result<(StatusCode, Json<PublicApplication>), ApiError> {
    input.ip_address = client_ip(&headers);
    input.user_agent = user_agent(&headers);

    let record = state.submissions.submit(input).await?;
    Ok((StatusCode::CREATED, Json(record.to_public())))
}

/// `GET /api/applications/status/:game_id`: latest record or 404.
pub async fn status(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<PublicApplication>, ApiError> {
    let record = state
        .applications
        .find_latest_by_game_id(&game_id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| {
            PortalError::NotFound(format!("No application found for game id {}", game_id))
        })?;

    Ok(Json(record.to_public()))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub applications: Vec<PublicApplication>,
    pub pagination: Pagination,
    pub summary: StatusSummary,
}

/// `GET /api/applications/history/:identifier?page&limit&status`.
///
/// 404 only when the identifier has zero records before filtering; a filter or
/// page that narrows to zero rows is a normal empty page. That asymmetry is
/// preserved behavior, pending a product decision.
pub async fn history(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let status = match params.status.as_deref() {
        None | Some("") | Some("all") => None,
        Some(raw) => match ApplicationStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                return Err(PortalError::Validation(vec![portal_core::FieldError::new(
                    "status",
                    "must be one of: pending, approved, rejected",
                )])
                .into())
            }
        },
    };

    let mut query = HistoryQuery::new(identifier.clone());
    query.status = status;
    query.page = params.page.unwrap_or(1);
    query.limit = params.limit.unwrap_or(storage::DEFAULT_PAGE_SIZE);
    let query = query.normalized();

    let page = state
        .applications
        .history(&query)
        .await
        .map_err(storage_error)?;

    if page.summary.total == 0 {
        return Err(PortalError::NotFound(format!(
            "No applications found for {}",
            identifier
        ))
        .into());
    }

    let total_pages = (page.total_filtered + query.limit - 1) / query.limit;
    Ok(Json(HistoryResponse {
        applications: page.records.iter().map(|r| r.to_public()).collect(),
        pagination: Pagination {
            page: query.page,
            limit: query.limit,
            total: page.total_filtered,
            total_pages,
        },
        summary: page.summary,
    }))
}

/// `GET /health`: liveness only.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
