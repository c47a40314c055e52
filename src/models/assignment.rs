//! Assignment join models linking members and builds to training tags.

use serde::{Deserialize, Serialize};

/// A member granted a training plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberTagAssignment {
    pub member_id: String,
    pub tag_id: String,
    pub assigned_at: String,
}

/// A build placed inside a training plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTagAssignment {
    pub build_name: String,
    pub tag_id: String,
    pub assigned_at: String,
}

/// Request body for bulk assigning or removing member-tag links.
///
/// The operation applies to the full cross-product of `member_ids` × `tag_ids`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkMemberTagRequest {
    pub member_ids: Vec<String>,
    pub tag_ids: Vec<String>,
}

/// Request body for bulk assigning or removing build-tag links.
///
/// The operation applies to the full cross-product of `build_names` × `tag_ids`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkBuildTagRequest {
    pub build_names: Vec<String>,
    pub tag_ids: Vec<String>,
}

/// Outcome of a bulk assignment operation.
///
/// `affected` counts join rows actually written or deleted; re-assigning an
/// existing pair or removing a missing one contributes zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAssignmentOutcome {
    pub affected: u64,
}
