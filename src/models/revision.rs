//! Revision metadata used for client-side change detection.

use serde::{Deserialize, Serialize};

/// Current revision of the datastore. Bumped on every successful mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
