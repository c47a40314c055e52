//! Training tag API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{ensure_org, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateTagRequest, TrainingTag, UpdateTagRequest};
use crate::AppState;

/// GET /api/organizations/:org_id/tags - List all training tags.
pub async fn list_tags(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> ApiResult<Vec<TrainingTag>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    match state.repo.list_tags(&org_id).await {
        Ok(tags) => success(tags, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/organizations/:org_id/tags/:id - Get a single training tag.
pub async fn get_tag(
    State(state): State<AppState>,
    Path((org_id, id)): Path<(String, String)>,
) -> ApiResult<TrainingTag> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    match state.repo.get_tag(&org_id, &id).await {
        Ok(Some(tag)) => success(tag, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Tag {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/organizations/:org_id/tags - Create a new training tag.
pub async fn create_tag(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    Json(request): Json<CreateTagRequest>,
) -> ApiResult<TrainingTag> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    // Validate required fields
    if request.name.trim().is_empty() {
        return error(
            AppError::Validation("Tag name is required".to_string()),
            revision_id,
        );
    }

    match state.repo.create_tag(&org_id, &request).await {
        Ok(tag) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(tag, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/organizations/:org_id/tags/:id - Update a training tag.
pub async fn update_tag(
    State(state): State<AppState>,
    Path((org_id, id)): Path<(String, String)>,
    Json(request): Json<UpdateTagRequest>,
) -> ApiResult<TrainingTag> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    match state.repo.update_tag(&org_id, &id, &request).await {
        Ok(tag) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(tag, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/organizations/:org_id/tags/:id - Delete a training tag.
///
/// Member and build assignments pointing at the tag are removed with it.
pub async fn delete_tag(
    State(state): State<AppState>,
    Path((org_id, id)): Path<(String, String)>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    match state.repo.delete_tag(&org_id, &id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
