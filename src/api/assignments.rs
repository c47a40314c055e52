//! Bulk assignment API endpoints.
//!
//! Assign and remove operate on the full cross-product of the submitted id
//! sets in a single transaction.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{ensure_org, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{
    BuildTagAssignment, BulkAssignmentOutcome, BulkBuildTagRequest, BulkMemberTagRequest,
    MemberTagAssignment,
};
use crate::AppState;

/// GET /api/organizations/:org_id/member-tags - List all member-tag assignments.
pub async fn list_member_assignments(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> ApiResult<Vec<MemberTagAssignment>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    match state.repo.list_member_assignments(&org_id).await {
        Ok(assignments) => success(assignments, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/organizations/:org_id/member-tags/assign - Bulk-assign members to tags.
pub async fn assign_member_tags(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    Json(request): Json<BulkMemberTagRequest>,
) -> ApiResult<BulkAssignmentOutcome> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    if request.member_ids.is_empty() || request.tag_ids.is_empty() {
        return error(
            AppError::Validation("memberIds and tagIds must be non-empty".to_string()),
            revision_id,
        );
    }

    match state
        .repo
        .assign_member_tags(&org_id, &request.member_ids, &request.tag_ids)
        .await
    {
        Ok(affected) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(BulkAssignmentOutcome { affected }, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/organizations/:org_id/member-tags/remove - Bulk-remove members from tags.
pub async fn remove_member_tags(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    Json(request): Json<BulkMemberTagRequest>,
) -> ApiResult<BulkAssignmentOutcome> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    if request.member_ids.is_empty() || request.tag_ids.is_empty() {
        return error(
            AppError::Validation("memberIds and tagIds must be non-empty".to_string()),
            revision_id,
        );
    }

    match state
        .repo
        .remove_member_tags(&org_id, &request.member_ids, &request.tag_ids)
        .await
    {
        Ok(affected) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(BulkAssignmentOutcome { affected }, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/organizations/:org_id/build-tags - List all build-tag assignments.
pub async fn list_build_assignments(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> ApiResult<Vec<BuildTagAssignment>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    match state.repo.list_build_assignments(&org_id).await {
        Ok(assignments) => success(assignments, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/organizations/:org_id/build-tags/assign - Bulk-assign builds to tags.
pub async fn assign_build_tags(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    Json(request): Json<BulkBuildTagRequest>,
) -> ApiResult<BulkAssignmentOutcome> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    if request.build_names.is_empty() || request.tag_ids.is_empty() {
        return error(
            AppError::Validation("buildNames and tagIds must be non-empty".to_string()),
            revision_id,
        );
    }

    match state
        .repo
        .assign_build_tags(&org_id, &request.build_names, &request.tag_ids)
        .await
    {
        Ok(affected) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(BulkAssignmentOutcome { affected }, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/organizations/:org_id/build-tags/remove - Bulk-remove builds from tags.
pub async fn remove_build_tags(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    Json(request): Json<BulkBuildTagRequest>,
) -> ApiResult<BulkAssignmentOutcome> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    if request.build_names.is_empty() || request.tag_ids.is_empty() {
        return error(
            AppError::Validation("buildNames and tagIds must be non-empty".to_string()),
            revision_id,
        );
    }

    match state
        .repo
        .remove_build_tags(&org_id, &request.build_names, &request.tag_ids)
        .await
    {
        Ok(affected) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(BulkAssignmentOutcome { affected }, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
