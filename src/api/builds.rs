//! Build API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{ensure_org, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{Build, CreateBuildRequest, LocalizedText, UpdateBuildRequest};
use crate::AppState;

/// Query parameters for reading builds.
#[derive(Debug, Deserialize)]
pub struct BuildQuery {
    /// Preferred language; when set, localized metadata is resolved to a
    /// plain string in that language.
    pub lang: Option<String>,
}

/// GET /api/organizations/:org_id/builds - List all builds.
pub async fn list_builds(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    Query(query): Query<BuildQuery>,
) -> ApiResult<Vec<Build>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    match state.repo.list_builds(&org_id).await {
        Ok(builds) => {
            let builds = match &query.lang {
                Some(lang) => builds
                    .into_iter()
                    .map(|b| resolve_metadata(b, lang))
                    .collect(),
                None => builds,
            };
            success(builds, revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/organizations/:org_id/builds/:name - Get a single build.
pub async fn get_build(
    State(state): State<AppState>,
    Path((org_id, name)): Path<(String, String)>,
    Query(query): Query<BuildQuery>,
) -> ApiResult<Build> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    match state.repo.get_build(&org_id, &name).await {
        Ok(Some(build)) => {
            let build = match &query.lang {
                Some(lang) => resolve_metadata(build, lang),
                None => build,
            };
            success(build, revision_id)
        }
        Ok(None) => error(
            AppError::NotFound(format!("Build {} not found", name)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// Collapse localized metadata fields to plain strings in the preferred
/// language. Fields an empty mapping cannot resolve are dropped.
fn resolve_metadata(mut build: Build, lang: &str) -> Build {
    build.title = build
        .title
        .as_ref()
        .and_then(|t| t.resolve(lang))
        .map(|s| LocalizedText::Plain(s.to_string()));
    build.description = build
        .description
        .as_ref()
        .and_then(|t| t.resolve(lang))
        .map(|s| LocalizedText::Plain(s.to_string()));
    build
}

/// POST /api/organizations/:org_id/builds - Register a new build.
pub async fn create_build(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    Json(request): Json<CreateBuildRequest>,
) -> ApiResult<Build> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    // Validate required fields
    if request.name.trim().is_empty() {
        return error(
            AppError::Validation("Build name is required".to_string()),
            revision_id,
        );
    }

    match state.repo.create_build(&org_id, &request).await {
        Ok(build) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(build, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/organizations/:org_id/builds/:name - Edit build metadata.
pub async fn update_build(
    State(state): State<AppState>,
    Path((org_id, name)): Path<(String, String)>,
    Json(request): Json<UpdateBuildRequest>,
) -> ApiResult<Build> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    match state.repo.update_build(&org_id, &name, &request).await {
        Ok(build) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(build, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/organizations/:org_id/builds/:name - Delete a build.
///
/// Tag assignments pointing at the build are removed with it.
pub async fn delete_build(
    State(state): State<AppState>,
    Path((org_id, name)): Path<(String, String)>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    match state.repo.delete_build(&org_id, &name).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
