//! Completion analytics API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{ensure_org, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CompletionRecord, RecordCompletionRequest};
use crate::AppState;

/// Query parameters for listing completion records.
#[derive(Debug, Deserialize)]
pub struct CompletionQuery {
    pub completed: Option<bool>,
}

/// GET /api/organizations/:org_id/completions - List completion records.
pub async fn list_completions(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    Query(query): Query<CompletionQuery>,
) -> ApiResult<Vec<CompletionRecord>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    match state.repo.list_completions(&org_id, query.completed).await {
        Ok(records) => success(records, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/organizations/:org_id/completions - Record an analytics completion event.
pub async fn record_completion(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    Json(request): Json<RecordCompletionRequest>,
) -> ApiResult<CompletionRecord> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    // Validate required fields
    if request.member_id.trim().is_empty() {
        return error(
            AppError::Validation("Member ID is required".to_string()),
            revision_id,
        );
    }
    if request.build_name.trim().is_empty() {
        return error(
            AppError::Validation("Build name is required".to_string()),
            revision_id,
        );
    }

    match state.repo.record_completion(&org_id, &request).await {
        Ok(record) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(record, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
