use async_trait::async_trait;
use std::error::Error;
use std::path::PathBuf;

use crate::models::types::RunReport;
use crate::traits::publisher::Publisher;

/// Writes the report as a pretty JSON array, replacing any previous file.
pub struct FilePublisher {
    pub path: PathBuf,
}

#[async_trait]
impl Publisher for FilePublisher {
    fn name(&self) -> &str { "file" }

    async fn publish(&self, report: &RunReport) -> Result<(), Box<dyn Error + Send + Sync>> {
        let json = serde_json::to_string_pretty(report)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, format!("{}\n", json))?;
        tracing::info!(path = %self.path.display(), results = report.len(), "report written");
        Ok(())
    }
}
