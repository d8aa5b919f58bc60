use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strum_macros::{Display, EnumString};

use crate::errors::ConfigError;
use crate::models::chat::SamplingParams;
use crate::models::types::ModelId;

const DEFAULT_PROMPT: &str = include_str!("../../resources/default_prompt.txt");

const DEFAULT_MODELS: &[&str] = &[
    "llama-3.1-8b-instant",
    "llama-3.3-70b-versatile",
    "meta-llama/llama-4-maverick-17b-128e-instruct",
    "meta-llama/llama-4-scout-17b-16e-instruct",
    "moonshotai/kimi-k2-instruct",
    "qwen/qwen3-32b",
];

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub probe: ProbeConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Groq,
    OpenRouter,
}

impl ProviderKind {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
            ProviderKind::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }

    pub fn default_credential_key(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "EXPO_PUBLIC_GROQ_API_KEY",
            ProviderKind::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    /// Substrings marking catalog entries that are not chat models.
    pub fn non_chat_markers(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::Groq => &["whisper", "tts", "guard", "orpheus"],
            ProviderKind::OpenRouter => &["embed", "moderation", "whisper", "tts"],
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub base_url: Option<String>,
    pub credential_file: Option<PathBuf>,
    pub credential_key: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl ProviderConfig {
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.kind.default_base_url().to_string())
    }

    pub fn credential_file(&self) -> PathBuf {
        self.credential_file.clone().unwrap_or_else(|| PathBuf::from(".env"))
    }

    pub fn credential_key(&self) -> String {
        self.credential_key
            .clone()
            .unwrap_or_else(|| self.kind.default_credential_key().to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(60))
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ProbeConfig {
    pub models: Option<Vec<String>>,
    pub prompt: Option<String>,
    pub prompt_file: Option<PathBuf>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub pause_ms: Option<u64>,
    pub pause_after_last: Option<bool>,
    pub concurrency: Option<usize>,
}

impl ProbeConfig {
    pub fn models(&self) -> Vec<ModelId> {
        match &self.models {
            Some(list) => list.iter().map(|m| ModelId::from(m.trim())).collect(),
            None => DEFAULT_MODELS.iter().copied().map(ModelId::from).collect(),
        }
    }

    /// Inline prompt wins over `prompt_file`; neither means the built-in prompt.
    pub fn prompt(&self) -> Result<String, ConfigError> {
        if let Some(p) = &self.prompt {
            return Ok(p.clone());
        }
        if let Some(path) = &self.prompt_file {
            return fs::read_to_string(path).map_err(|source| ConfigError::Prompt {
                path: path.clone(),
                source,
            });
        }
        Ok(DEFAULT_PROMPT.to_string())
    }

    pub fn sampling(&self) -> SamplingParams {
        let defaults = SamplingParams::default();
        SamplingParams {
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
        }
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms.unwrap_or(2000))
    }

    pub fn pause_after_last(&self) -> bool {
        self.pause_after_last.unwrap_or(true)
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency.unwrap_or(1)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub file_path: Option<PathBuf>,
    pub archive_dir: Option<PathBuf>,
    pub console_enabled: Option<bool>,
    pub console_max_chars: Option<usize>,
    pub console_error_chars: Option<usize>,
}

impl OutputConfig {
    pub fn file_path(&self) -> PathBuf {
        self.file_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("groq_results.json"))
    }

    pub fn console_enabled(&self) -> bool {
        self.console_enabled.unwrap_or(true)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub dir: Option<PathBuf>,
}

impl AppConfig {
    /// Rejects settings no run could honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sampling = self.probe.sampling();
        if !(0.0..=2.0).contains(&sampling.temperature) {
            return Err(ConfigError::Invalid(format!(
                "probe.temperature must be within 0.0..=2.0, got {}",
                sampling.temperature
            )));
        }
        if sampling.max_tokens == 0 {
            return Err(ConfigError::Invalid("probe.max_tokens must be positive".into()));
        }
        if self.probe.concurrency() == 0 {
            return Err(ConfigError::Invalid("probe.concurrency must be at least 1".into()));
        }
        if self.provider.request_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid("provider.request_timeout_secs must be positive".into()));
        }
        if let Some(models) = &self.probe.models {
            if models.iter().any(|m| m.trim().is_empty()) {
                return Err(ConfigError::Invalid("probe.models contains an empty model id".into()));
            }
        }
        Ok(())
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: AppConfig = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    cfg.validate()?;
    Ok(cfg)
}
