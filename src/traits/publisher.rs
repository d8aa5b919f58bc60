use async_trait::async_trait;
use std::error::Error;

use crate::models::types::{ModelId, ProbeResult, RunReport};

/// Receives run progress and the final report.
///
/// Progress hooks are display-only and cannot fail the run; `publish`
/// is where a sink persists the report.
#[async_trait]
pub trait Publisher: Send + Sync {
    fn name(&self) -> &str;

    async fn on_run_started(&self, _total: usize) {}

    async fn on_probe_started(&self, _index: usize, _total: usize, _model: &ModelId) {}

    async fn on_probe_finished(&self, _index: usize, _total: usize, _result: &ProbeResult) {}

    async fn publish(&self, report: &RunReport) -> Result<(), Box<dyn Error + Send + Sync>>;
}
