use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;

use crate::models::types::{ProbeResult, RunReport};
use crate::traits::publisher::Publisher;

/// Keeps a timestamped copy of every run under `dir`.
pub struct ArchivePublisher {
    pub dir: PathBuf,
}

#[derive(Serialize)]
struct ArchiveEnvelope<'a> {
    timestamp: String,
    models_count: usize,
    success_count: usize,
    failed_count: usize,
    results: &'a [ProbeResult],
}

impl ArchivePublisher {
    pub fn file_name(at: DateTime<Utc>) -> String {
        format!("results_{}.json", at.format("%Y-%m-%dT%H-%M-%S"))
    }

    pub fn write_at(&self, report: &RunReport, at: DateTime<Utc>) -> Result<PathBuf, Box<dyn Error + Send + Sync>> {
        let summary = report.summary();
        let envelope = ArchiveEnvelope {
            timestamp: at.to_rfc3339(),
            models_count: summary.total,
            success_count: summary.succeeded(),
            failed_count: summary.failed.len(),
            results: report.results(),
        };
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(Self::file_name(at));
        std::fs::write(&path, serde_json::to_string_pretty(&envelope)?)?;
        Ok(path)
    }
}

#[async_trait]
impl Publisher for ArchivePublisher {
    fn name(&self) -> &str { "archive" }

    async fn publish(&self, report: &RunReport) -> Result<(), Box<dyn Error + Send + Sync>> {
        let path = self.write_at(report, Utc::now())?;
        tracing::info!(path = %path.display(), "report archived");
        Ok(())
    }
}
