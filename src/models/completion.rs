//! Completion records derived from analytics session events.
//!
//! Records are append-only: a member finishing the same build twice yields
//! two rows, and consumers must deduplicate.

use serde::{Deserialize, Serialize};

/// Evidence that a member finished (or attempted) a specific build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub id: String,
    pub member_id: String,
    pub build_name: String,
    pub completed: bool,
    pub recorded_at: String,
}

/// Request body for recording an analytics completion event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCompletionRequest {
    pub member_id: String,
    pub build_name: String,
    #[serde(default = "default_completed")]
    pub completed: bool,
}

fn default_completed() -> bool {
    true
}
