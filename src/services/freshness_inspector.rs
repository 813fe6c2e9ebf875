//! Pipeline stage freshness inspection.
//!
//! Walks the configured stage directories, finds the newest artifact per
//! (service, stage) pair by filename hint, and flags stages that are
//! stale or stuck. Read-only; safe to run while refresh attempts are in
//! flight.

use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::domain::models::{
    FreshnessSnapshot, PipelineConfig, ServiceDefinition, StageFreshness,
};

/// Inspects most-recent-artifact timestamps across pipeline stages.
#[derive(Debug, Clone)]
pub struct ZoneFreshnessInspector {
    config: PipelineConfig,
}

impl ZoneFreshnessInspector {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Snapshot freshness for every service at every stage, ages
    /// relative to `now`.
    pub fn inspect(&self, services: &[ServiceDefinition], now: DateTime<Utc>) -> FreshnessSnapshot {
        let root = Path::new(&self.config.root);
        let mut missing_stages = Vec::new();
        let mut stage_files: Vec<Vec<(PathBuf, DateTime<Utc>)>> = Vec::new();

        for stage in &self.config.stages {
            let dir = root.join(stage);
            if dir.is_dir() {
                let mut files = Vec::new();
                collect_files(&dir, &mut files);
                debug!(stage = %stage, files = files.len(), "scanned stage directory");
                stage_files.push(files);
            } else {
                warn!(stage = %stage, path = %dir.display(), "stage directory missing");
                missing_stages.push(stage.clone());
                stage_files.push(Vec::new());
            }
        }

        let mut records = Vec::new();
        for service in services {
            let hints = service.artifact_hints();
            let mut per_service: Vec<StageFreshness> = Vec::new();

            for (stage_index, stage) in self.config.stages.iter().enumerate() {
                let newest = stage_files[stage_index]
                    .iter()
                    .filter(|(path, _)| matches_hints(path, &hints))
                    .max_by_key(|(_, mtime)| *mtime);

                let mut record =
                    StageFreshness::empty(service.id.clone(), stage.clone(), stage_index);
                if let Some((path, mtime)) = newest {
                    let age_days = age_in_days(now, *mtime);
                    record.newest_artifact = Some(path.clone());
                    record.newest_at = Some(*mtime);
                    record.age_days = Some(age_days);
                    record.stale = age_days > service.stale_after_days as f64;
                }
                per_service.push(record);
            }

            mark_stuck(&mut per_service, self.config.propagation_lag_days);
            records.extend(per_service);
        }

        FreshnessSnapshot {
            taken_at: now,
            records,
            missing_stages,
        }
    }
}

fn age_in_days(now: DateTime<Utc>, then: DateTime<Utc>) -> f64 {
    now.signed_duration_since(then).num_seconds() as f64 / 86_400.0
}

/// Flags later stages whose data stopped propagating: empty while the
/// previous stage has data, or trailing it by more than the allowed lag.
/// `records` must be one service's stages in sequence order.
fn mark_stuck(records: &mut [StageFreshness], lag_days: i64) {
    for later in 1..records.len() {
        let Some(earlier_at) = records[later - 1].newest_at else {
            continue;
        };
        let stuck = match records[later].newest_at {
            None => true,
            Some(later_at) => {
                earlier_at.signed_duration_since(later_at) > Duration::days(lag_days)
            }
        };
        if stuck {
            records[later].stuck = true;
        }
    }
}

fn matches_hints(path: &Path, hints: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let name = name.to_lowercase();
    hints.iter().any(|hint| name.contains(hint))
}

fn collect_files(dir: &Path, files: &mut Vec<(PathBuf, DateTime<Utc>)>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(path = %dir.display(), error = %err, "failed to read stage directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, files);
        } else if let Ok(metadata) = entry.metadata() {
            if let Ok(modified) = metadata.modified() {
                files.push((path, DateTime::<Utc>::from(modified)));
            }
        }
    }
}
