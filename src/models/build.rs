//! Build model matching the frontend Build interface.
//!
//! A build is a unit of interactive training content, identified within an
//! organization by its name.

use serde::{Deserialize, Serialize};

use super::LocalizedText;

/// Kind of interactive content a build contains.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BuildKind {
    Wisetrainer,
    Wisetour,
}

impl BuildKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildKind::Wisetrainer => "wisetrainer",
            BuildKind::Wisetour => "wisetour",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "wisetrainer" => Some(BuildKind::Wisetrainer),
            "wisetour" => Some(BuildKind::Wisetour),
            _ => None,
        }
    }
}

/// A training content unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub org_id: String,
    pub name: String,
    pub kind: BuildKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    pub created_at: String,
    pub modified_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

/// Request body for registering a new build.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuildRequest {
    pub name: String,
    pub kind: BuildKind,
    #[serde(default)]
    pub title: Option<LocalizedText>,
    #[serde(default)]
    pub description: Option<LocalizedText>,
}

/// Request body for editing build metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBuildRequest {
    #[serde(default)]
    pub kind: Option<BuildKind>,
    #[serde(default)]
    pub title: Option<LocalizedText>,
    #[serde(default)]
    pub description: Option<LocalizedText>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}
