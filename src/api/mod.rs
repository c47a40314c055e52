//! REST API module.
//!
//! Contains all API routes and handlers following the frontend contract.

mod assignments;
mod builds;
mod completions;
mod members;
mod organizations;
mod revision;
mod tags;
mod training;

pub use assignments::*;
pub use builds::*;
pub use completions::*;
pub use members::*;
pub use organizations::*;
pub use revision::*;
pub use tags::*;
pub use training::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::{AppError, AppErrorWithRevision};
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError, revision_id: i64) -> ApiResult<T> {
    Err(AppErrorWithRevision {
        error: err,
        revision_id,
    })
}

/// Reject requests against an unknown organization with a 404.
pub(crate) async fn ensure_org(
    state: &AppState,
    org_id: &str,
    revision_id: i64,
) -> Result<(), AppErrorWithRevision> {
    match state.repo.get_organization(org_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(AppErrorWithRevision {
            error: AppError::NotFound(format!("Organization {} not found", org_id)),
            revision_id,
        }),
        Err(e) => Err(AppErrorWithRevision {
            error: e,
            revision_id,
        }),
    }
}
