use async_trait::async_trait;
use std::error::Error;

use crate::models::types::{ModelId, ProbeOutcome, ProbeResult, RunReport, round_secs};
use crate::services::text::{trim_with_ellipsis, truncate_chars};
use crate::traits::publisher::Publisher;

pub const DEFAULT_RESPONSE_PREVIEW_CHARS: usize = 1500;
pub const DEFAULT_ERROR_PREVIEW_CHARS: usize = 100;

#[cfg(test)]
static CAPTURED: once_cell::sync::Lazy<std::sync::Mutex<Vec<String>>> =
    once_cell::sync::Lazy::new(|| std::sync::Mutex::new(Vec::new()));

pub struct ConsolePublisher {
    pub response_max_chars: usize,
    pub error_max_chars: usize,
}

impl Default for ConsolePublisher {
    fn default() -> Self {
        Self {
            response_max_chars: DEFAULT_RESPONSE_PREVIEW_CHARS,
            error_max_chars: DEFAULT_ERROR_PREVIEW_CHARS,
        }
    }
}

impl ConsolePublisher {
    pub fn header_lines(&self, total: usize) -> Vec<String> {
        vec![
            "=".repeat(60),
            format!("MODEL COMPARISON ({} models)", total),
            "=".repeat(60),
        ]
    }

    pub fn progress_lines(&self, index: usize, total: usize, model: &ModelId) -> Vec<String> {
        vec![String::new(), format!("[{}/{}] {}", index + 1, total, model), "-".repeat(40)]
    }

    pub fn result_lines(&self, result: &ProbeResult) -> Vec<String> {
        match &result.outcome {
            ProbeOutcome::Success { response } => vec![
                format!("✓ SUCCESS in {:.2}s", result.elapsed.as_secs_f64()),
                trim_with_ellipsis(response, self.response_max_chars),
            ],
            ProbeOutcome::Error { error } => {
                vec![format!("✗ ERROR: {}", truncate_chars(error, self.error_max_chars))]
            }
        }
    }

    pub fn summary_lines(&self, report: &RunReport) -> Vec<String> {
        let summary = report.summary();
        let mut lines = vec![
            String::new(),
            "=".repeat(60),
            "SUMMARY".to_string(),
            "=".repeat(60),
            String::new(),
            format!("Successful: {}", summary.ratio()),
            format!("Failed: {}/{}", summary.failed.len(), summary.total),
        ];
        if !summary.fastest.is_empty() {
            lines.push(String::new());
            lines.push("By speed:".to_string());
            for (model, elapsed) in &summary.fastest {
                lines.push(format!("  {}: {}s", model, round_secs(*elapsed)));
            }
        }
        if !summary.failed.is_empty() {
            lines.push(String::new());
            lines.push("Failed models:".to_string());
            for (model, error) in &summary.failed {
                lines.push(format!("  {}: {}", model, truncate_chars(error, self.error_max_chars)));
            }
        }
        lines
    }

    fn emit(&self, lines: Vec<String>) {
        #[cfg(test)]
        {
            if let Ok(mut captured) = CAPTURED.lock() {
                captured.extend(lines);
            }
        }
        #[cfg(not(test))]
        {
            for line in lines {
                println!("{}", line);
            }
        }
    }
}

#[async_trait]
impl Publisher for ConsolePublisher {
    fn name(&self) -> &str { "console" }

    async fn on_run_started(&self, total: usize) {
        self.emit(self.header_lines(total));
    }

    async fn on_probe_started(&self, index: usize, total: usize, model: &ModelId) {
        self.emit(self.progress_lines(index, total, model));
    }

    async fn on_probe_finished(&self, _index: usize, _total: usize, result: &ProbeResult) {
        self.emit(self.result_lines(result));
    }

    async fn publish(&self, report: &RunReport) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.emit(self.summary_lines(report));
        tracing::info!(results = report.len(), "console publisher output");
        Ok(())
    }
}
