// ── Published monitor state ──

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Thresholds;
use crate::model::{NetworkStatus, SpeedTestResult, Suggestion, WifiInfo};
use crate::store::MetricsStore;
use crate::suggest;

/// Everything one refresh cycle produced, as a single immutable value.
///
/// Snapshots are replaced wholesale; `metrics` is the store as it stood
/// right after the cycle that produced `status`.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub wifi: WifiInfo,
    pub status: NetworkStatus,
    pub metrics: Arc<MetricsStore>,
    pub speed_test: Option<SpeedTestResult>,
    /// Completion time of the last refresh cycle; `None` before the first.
    pub updated_at: Option<DateTime<Utc>>,
    /// Incremented on every publish.
    pub generation: u64,
}

impl Snapshot {
    pub fn initial(history_capacity: usize) -> Self {
        Self {
            wifi: WifiInfo::disconnected(),
            status: NetworkStatus::unknown(),
            metrics: Arc::new(MetricsStore::new(history_capacity)),
            speed_test: None,
            updated_at: None,
            generation: 0,
        }
    }

    pub fn suggestions(&self, thresholds: &Thresholds) -> Vec<Suggestion> {
        suggest::analyze(self, thresholds)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::initial(MetricsStore::default().capacity())
    }
}
