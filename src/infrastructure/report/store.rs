//! Health report persistence.
//!
//! The latest report is the baseline the next run diffs against for
//! notifications, so the JSON write goes through a temp file and rename
//! to keep a readable snapshot on disk at all times.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::render::render_report;
use crate::domain::errors::WardenResult;
use crate::domain::models::{HealthReport, PipelineConfig};

pub struct ReportStore {
    json_path: PathBuf,
    text_path: PathBuf,
}

impl ReportStore {
    pub fn new(pipeline: &PipelineConfig) -> Self {
        Self {
            json_path: PathBuf::from(&pipeline.report_path),
            text_path: PathBuf::from(&pipeline.report_text_path),
        }
    }

    pub fn at(json_path: impl Into<PathBuf>, text_path: impl Into<PathBuf>) -> Self {
        Self {
            json_path: json_path.into(),
            text_path: text_path.into(),
        }
    }

    /// Persist the report as JSON plus its plain-text rendering.
    pub fn save(&self, report: &HealthReport) -> WardenResult<()> {
        let json = serde_json::to_string_pretty(report)?;
        write_atomically(&self.json_path, &json)?;
        write_atomically(&self.text_path, &render_report(report))?;
        Ok(())
    }

    /// Load the previously persisted report, if any.
    ///
    /// A missing or unreadable baseline degrades to "no baseline"; it
    /// must never fail a run.
    pub fn load_previous(&self) -> Option<HealthReport> {
        let content = match fs::read_to_string(&self.json_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.json_path.display(), error = %e, "could not read previous report");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(path = %self.json_path.display(), error = %e, "previous report is malformed");
                None
            }
        }
    }
}

fn write_atomically(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
