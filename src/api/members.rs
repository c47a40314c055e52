//! Member API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{ensure_org, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateMemberRequest, Member, UpdateMemberRequest};
use crate::AppState;

/// GET /api/organizations/:org_id/members - List all members.
pub async fn list_members(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> ApiResult<Vec<Member>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    match state.repo.list_members(&org_id).await {
        Ok(members) => success(members, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/organizations/:org_id/members/:id - Get a single member.
pub async fn get_member(
    State(state): State<AppState>,
    Path((org_id, id)): Path<(String, String)>,
) -> ApiResult<Member> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    match state.repo.get_member(&org_id, &id).await {
        Ok(Some(member)) => success(member, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Member {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/organizations/:org_id/members - Create a new member.
pub async fn create_member(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    Json(request): Json<CreateMemberRequest>,
) -> ApiResult<Member> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    // Validate required fields
    if request.display_name.trim().is_empty() {
        return error(
            AppError::Validation("Display name is required".to_string()),
            revision_id,
        );
    }

    match state.repo.create_member(&org_id, &request).await {
        Ok(member) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(member, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/organizations/:org_id/members/:id - Update a member.
pub async fn update_member(
    State(state): State<AppState>,
    Path((org_id, id)): Path<(String, String)>,
    Json(request): Json<UpdateMemberRequest>,
) -> ApiResult<Member> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    match state.repo.update_member(&org_id, &id, &request).await {
        Ok(member) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(member, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/organizations/:org_id/members/:id - Delete a member.
pub async fn delete_member(
    State(state): State<AppState>,
    Path((org_id, id)): Path<(String, String)>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    match state.repo.delete_member(&org_id, &id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
