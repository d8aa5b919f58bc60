use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::services::settings::AppConfig;

/// modelprobe - latency and availability benchmark for hosted chat models
#[derive(Parser, Debug)]
#[command(name = "modelprobe", version, about, long_about = None)]
pub struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send the prompt to every model and write the report (default)
    Run(RunArgs),
    /// List chat models offered by the provider
    Models(CredentialArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct CredentialArgs {
    /// KEY=VALUE file holding the API key
    #[arg(long)]
    pub credential_file: Option<PathBuf>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Comma-separated model ids, replacing the configured list
    #[arg(short, long, value_delimiter = ',')]
    pub models: Vec<String>,

    /// Report file (JSON array)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// File whose content is sent as the prompt
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,

    /// Pause after each call, in milliseconds
    #[arg(long)]
    pub pause_ms: Option<u64>,

    /// Calls in flight at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Directory for timestamped copies of each report
    #[arg(long)]
    pub archive_dir: Option<PathBuf>,

    /// Suppress progress and summary output
    #[arg(long)]
    pub quiet: bool,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

impl CredentialArgs {
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(path) = &self.credential_file {
            cfg.provider.credential_file = Some(path.clone());
        }
    }
}

impl RunArgs {
    /// Command-line values override the configuration file.
    pub fn apply(&self, cfg: &mut AppConfig) {
        if !self.models.is_empty() {
            cfg.probe.models = Some(self.models.clone());
        }
        if let Some(path) = &self.output {
            cfg.output.file_path = Some(path.clone());
        }
        if let Some(path) = &self.prompt_file {
            // an explicit file beats an inline prompt from the config
            cfg.probe.prompt = None;
            cfg.probe.prompt_file = Some(path.clone());
        }
        if let Some(ms) = self.pause_ms {
            cfg.probe.pause_ms = Some(ms);
        }
        if let Some(n) = self.concurrency {
            cfg.probe.concurrency = Some(n);
        }
        if let Some(dir) = &self.archive_dir {
            cfg.output.archive_dir = Some(dir.clone());
        }
        if self.quiet {
            cfg.output.console_enabled = Some(false);
        }
        self.credentials.apply(cfg);
    }
}
