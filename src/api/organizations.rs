//! Organization API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateOrganizationRequest, Organization};
use crate::AppState;

/// GET /api/organizations - List all organizations.
pub async fn list_organizations(State(state): State<AppState>) -> ApiResult<Vec<Organization>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_organizations().await {
        Ok(orgs) => success(orgs, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/organizations/:org_id - Get a single organization.
pub async fn get_organization(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> ApiResult<Organization> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_organization(&org_id).await {
        Ok(Some(org)) => success(org, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Organization {} not found", org_id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/organizations - Create a new organization.
pub async fn create_organization(
    State(state): State<AppState>,
    Json(request): Json<CreateOrganizationRequest>,
) -> ApiResult<Organization> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    // Validate required fields
    if request.name.trim().is_empty() {
        return error(
            AppError::Validation("Organization name is required".to_string()),
            revision_id,
        );
    }

    match state.repo.create_organization(&request).await {
        Ok(org) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(org, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/organizations/:org_id - Delete an organization and all scoped data.
pub async fn delete_organization(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_organization(&org_id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
