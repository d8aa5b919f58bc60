pub mod cli;
pub mod errors;
pub mod models;
pub mod publishers;
pub mod services;
pub mod traits;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::models::types::RunReport;
use crate::publishers::console::{DEFAULT_ERROR_PREVIEW_CHARS, DEFAULT_RESPONSE_PREVIEW_CHARS};
use crate::publishers::{ArchivePublisher, ConsolePublisher, FilePublisher, Publisher};
use crate::services::catalog::filter_chat_models;
use crate::services::chat_api_http::HttpChatApi;
use crate::services::credentials::load_api_key;
use crate::services::probe_runner::ProbeRunner;
use crate::services::settings::{AppConfig, LoggingConfig, load_config};
use crate::traits::chat_api::ChatApi;

static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Loads the YAML config if a path is given, else the built-in defaults.
pub fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(p) => Ok(load_config(p)?),
        None => Ok(AppConfig::default()),
    }
}

/// Initialize structured logging (default to info if neither RUST_LOG nor config sets a level).
/// Logs go to stderr so stdout stays reserved for the report.
pub fn init_logging(cfg: &LoggingConfig) {
    let log_spec = std::env::var("RUST_LOG")
        .ok()
        .or_else(|| cfg.level.clone())
        .unwrap_or_else(|| "info".to_string());

    let file_layer = cfg.dir.as_ref().map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, "modelprobe.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        fmt::layer().with_writer(writer).with_ansi(false).with_target(false)
    });

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new(log_spec))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
        .with(file_layer)
        .try_init();
}

fn build_chat_api(cfg: &AppConfig) -> Result<HttpChatApi> {
    let provider = &cfg.provider;
    let api_key = load_api_key(&provider.credential_file(), &provider.credential_key())
        .context("configuration error")?;
    Ok(HttpChatApi::from_config(provider, api_key)?)
}

/// Probes every configured model and publishes the report.
///
/// Configuration problems abort before any request is sent. Individual
/// model failures are part of the returned report.
pub async fn run_probe(cfg: &AppConfig) -> Result<RunReport> {
    cfg.validate().context("configuration error")?;
    let prompt = cfg.probe.prompt().context("configuration error")?;
    let chat_api: Arc<dyn ChatApi> = Arc::new(build_chat_api(cfg)?);

    let console: Option<Arc<ConsolePublisher>> = cfg.output.console_enabled().then(|| {
        Arc::new(ConsolePublisher {
            response_max_chars: cfg.output.console_max_chars.unwrap_or(DEFAULT_RESPONSE_PREVIEW_CHARS),
            error_max_chars: cfg.output.console_error_chars.unwrap_or(DEFAULT_ERROR_PREVIEW_CHARS),
        })
    });
    let listeners: Vec<Arc<dyn Publisher>> = console
        .iter()
        .map(|c| Arc::clone(c) as Arc<dyn Publisher>)
        .collect();

    let mut sinks: Vec<Arc<dyn Publisher>> = vec![Arc::new(FilePublisher { path: cfg.output.file_path() })];
    if let Some(dir) = cfg.output.archive_dir.clone() {
        sinks.push(Arc::new(ArchivePublisher { dir }));
    }

    let runner = ProbeRunner::builder()
        .chat_api(chat_api)
        .targets(cfg.probe.models())
        .prompt(prompt)
        .params(cfg.probe.sampling())
        .pause(cfg.probe.pause())
        .pause_after_last(cfg.probe.pause_after_last())
        .call_timeout(cfg.provider.request_timeout())
        .concurrency(cfg.probe.concurrency())
        .listeners(listeners.clone())
        .build();

    let report = runner.run().await;

    let mut failed: Vec<String> = Vec::new();
    for sink in &sinks {
        if let Err(e) = sink.publish(&report).await {
            error!(publisher = sink.name(), error = %e, "failed to publish report");
            failed.push(format!("{}: {}", sink.name(), e));
        }
    }
    for l in &listeners {
        if let Err(e) = l.publish(&report).await {
            warn!(publisher = l.name(), error = %e, "failed to print summary");
        }
    }

    if !failed.is_empty() {
        match serde_json::to_string(&report) {
            Ok(json) => error!(report = %json, "report could not be saved; dumping it to the log"),
            Err(e) => error!(error = %e, "report could not be serialized"),
        }
        return Err(anyhow!("failed to save report ({})", failed.join("; ")));
    }

    info!(path = %cfg.output.file_path().display(), "results saved");
    Ok(report)
}

/// Chat models the configured provider currently offers, sorted.
pub async fn list_models(cfg: &AppConfig) -> Result<Vec<String>> {
    let api = build_chat_api(cfg)?;
    let ids = api
        .list_models()
        .await
        .with_context(|| format!("failed to list models from {}", api.base_url()))?;
    let models = filter_chat_models(cfg.provider.kind, ids);
    info!(count = models.len(), "models listed");
    Ok(models)
}
