//! Training aggregation API endpoints.
//!
//! These endpoints expose the derived views computed by the `stats` module.
//! The computed overview is memoized per organization keyed by the global
//! revision id, so it is recomputed only after a mutation.

use std::sync::Arc;

use axum::extract::{Path, State};
use chrono::Utc;

use super::{ensure_org, success, ApiResult};
use crate::stats::{self, DashboardMetrics, TrainingOverview, TrainingSnapshot};
use crate::AppState;

/// GET /api/organizations/:org_id/training/overview - Tag-centric and
/// member-centric derived views.
pub async fn get_training_overview(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> ApiResult<TrainingOverview> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    let overview = load_overview(&state, &org_id, revision_id).await;
    success(overview.as_ref().clone(), revision_id)
}

/// GET /api/organizations/:org_id/training/dashboard - Summary metrics for
/// the dashboard.
pub async fn get_dashboard_metrics(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> ApiResult<DashboardMetrics> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    ensure_org(&state, &org_id, revision_id).await?;

    let overview = load_overview(&state, &org_id, revision_id).await;
    let metrics = stats::reduce(&overview, Utc::now());
    success(metrics, revision_id)
}

/// Fetch the cached overview for an organization, recomputing it from a
/// fresh snapshot when the revision has moved.
///
/// A leaf fetch that fails is treated as an empty collection, so the
/// aggregation degrades to transient zero-valued statistics instead of
/// failing the request.
async fn load_overview(
    state: &AppState,
    org_id: &str,
    revision_id: i64,
) -> Arc<TrainingOverview> {
    if let Some(cached) = state.overview_cache.get(org_id, revision_id) {
        return cached;
    }

    let snapshot = load_snapshot(state, org_id).await;
    let overview = Arc::new(stats::aggregate(&snapshot, Utc::now()));
    state
        .overview_cache
        .insert(org_id, revision_id, Arc::clone(&overview));
    overview
}

/// Load a snapshot of the five leaf collections for one organization.
async fn load_snapshot(state: &AppState, org_id: &str) -> TrainingSnapshot {
    let tags = state.repo.list_tags(org_id).await.unwrap_or_else(|e| {
        tracing::warn!("Failed to list tags for aggregation: {}", e);
        Vec::new()
    });
    let members = state.repo.list_members(org_id).await.unwrap_or_else(|e| {
        tracing::warn!("Failed to list members for aggregation: {}", e);
        Vec::new()
    });
    let member_assignments = state
        .repo
        .list_member_assignments(org_id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to list member assignments for aggregation: {}", e);
            Vec::new()
        });
    let build_assignments = state
        .repo
        .list_build_assignments(org_id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to list build assignments for aggregation: {}", e);
            Vec::new()
        });
    let completions = state
        .repo
        .list_completions(org_id, Some(true))
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to list completions for aggregation: {}", e);
            Vec::new()
        });

    TrainingSnapshot {
        tags,
        members,
        member_assignments,
        build_assignments,
        completions,
    }
}
