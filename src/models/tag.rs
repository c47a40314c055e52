//! Training tag model matching the frontend TrainingTag interface.
//!
//! A tag is a training plan: a named grouping used to batch-assign builds to
//! members, carrying a priority and an optional due date.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Priority of a training plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TagPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TagPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagPriority::Low => "LOW",
            TagPriority::Medium => "MEDIUM",
            TagPriority::High => "HIGH",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(TagPriority::Low),
            "MEDIUM" => Some(TagPriority::Medium),
            "HIGH" => Some(TagPriority::High),
            _ => None,
        }
    }
}

/// A training plan grouping builds and members.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingTag {
    pub id: String,
    pub org_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub priority: TagPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: String,
    pub modified_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

/// Request body for creating a new training tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagRequest {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub priority: TagPriority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Request body for updating an existing training tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTagRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub priority: Option<TagPriority>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}
