//! Pipeline stage freshness snapshots.
//!
//! Recomputed on every inspection; only the latest snapshot is ever
//! reported. Freshness is independent of credentials: a service can be
//! fully authenticated while its artifacts rot, and vice versa.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Newest artifact found for one service at one pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFreshness {
    /// Owning service id.
    pub service_id: String,

    /// Stage name from the configured ordered sequence.
    pub stage: String,

    /// Position of the stage in the ordered sequence.
    pub stage_index: usize,

    /// Newest matching artifact path, if any.
    pub newest_artifact: Option<PathBuf>,

    /// Modification time of the newest artifact.
    pub newest_at: Option<DateTime<Utc>>,

    /// Artifact age in days at inspection time.
    pub age_days: Option<f64>,

    /// Older than the service's stale threshold.
    pub stale: bool,

    /// Data entered an earlier stage but did not propagate here.
    pub stuck: bool,
}

impl StageFreshness {
    /// A stage with no matching artifact for the service.
    pub fn empty(service_id: String, stage: String, stage_index: usize) -> Self {
        Self {
            service_id,
            stage,
            stage_index,
            newest_artifact: None,
            newest_at: None,
            age_days: None,
            stale: false,
            stuck: false,
        }
    }

    pub fn has_artifact(&self) -> bool {
        self.newest_at.is_some()
    }
}

/// Per-run collection of stage freshness records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreshnessSnapshot {
    /// Inspection instant all ages are relative to.
    pub taken_at: DateTime<Utc>,

    /// One record per (service, stage) pair, stage order preserved.
    pub records: Vec<StageFreshness>,

    /// Configured stage directories that do not exist on disk.
    pub missing_stages: Vec<String>,
}

impl FreshnessSnapshot {
    /// Records for one service, in stage order.
    pub fn for_service(&self, service_id: &str) -> Vec<&StageFreshness> {
        self.records
            .iter()
            .filter(|r| r.service_id == service_id)
            .collect()
    }

    pub fn stale_count(&self, service_id: &str) -> usize {
        self.for_service(service_id)
            .iter()
            .filter(|r| r.stale)
            .count()
    }

    pub fn stuck_count(&self, service_id: &str) -> usize {
        self.for_service(service_id)
            .iter()
            .filter(|r| r.stuck)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record_has_no_artifact() {
        let record = StageFreshness::empty("spotify".to_string(), "landing".to_string(), 0);
        assert!(!record.has_artifact());
        assert!(!record.stale);
        assert!(!record.stuck);
    }

    #[test]
    fn test_snapshot_filters_by_service() {
        let snapshot = FreshnessSnapshot {
            taken_at: Utc::now(),
            records: vec![
                StageFreshness::empty("a".to_string(), "landing".to_string(), 0),
                StageFreshness {
                    stale: true,
                    ..StageFreshness::empty("b".to_string(), "landing".to_string(), 0)
                },
                StageFreshness {
                    stuck: true,
                    ..StageFreshness::empty("b".to_string(), "raw".to_string(), 1)
                },
            ],
            missing_stages: vec![],
        };

        assert_eq!(snapshot.for_service("a").len(), 1);
        assert_eq!(snapshot.for_service("b").len(), 2);
        assert_eq!(snapshot.stale_count("b"), 1);
        assert_eq!(snapshot.stuck_count("b"), 1);
        assert_eq!(snapshot.stale_count("a"), 0);
    }
}
