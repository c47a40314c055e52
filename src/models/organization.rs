//! Organization model. Organizations are the tenant boundary: every other
//! resource is scoped by an organization id.

use serde::{Deserialize, Serialize};

/// An organization (tenant) owning members, training plans and builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// Request body for creating a new organization.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationRequest {
    pub name: String,
}
