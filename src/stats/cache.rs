//! Revision-keyed memoization of computed overviews.
//!
//! Every successful mutation bumps the global revision counter, so a cached
//! overview is valid exactly as long as the revision it was computed at is
//! still current. Stale entries are replaced on the next recomputation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::TrainingOverview;

struct CachedOverview {
    revision_id: i64,
    overview: Arc<TrainingOverview>,
}

/// Per-organization cache of aggregated training overviews.
#[derive(Default)]
pub struct OverviewCache {
    inner: RwLock<HashMap<String, CachedOverview>>,
}

impl OverviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the overview cached for an organization, if it was computed
    /// at the given revision. A poisoned lock reads as a miss.
    pub fn get(&self, org_id: &str, revision_id: i64) -> Option<Arc<TrainingOverview>> {
        let guard = self.inner.read().ok()?;
        guard
            .get(org_id)
            .filter(|entry| entry.revision_id == revision_id)
            .map(|entry| Arc::clone(&entry.overview))
    }

    /// Store the overview computed for an organization at a revision.
    pub fn insert(&self, org_id: &str, revision_id: i64, overview: Arc<TrainingOverview>) {
        if let Ok(mut guard) = self.inner.write() {
            guard.insert(
                org_id.to_string(),
                CachedOverview {
                    revision_id,
                    overview,
                },
            );
        }
    }
}
