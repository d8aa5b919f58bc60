use std::time::Duration;

use bon::bon;
use derive_more::{AsRef, Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString, IntoStaticStr};

use crate::errors::ChatError;
use crate::services::text::truncate_chars;

/// Maximum number of characters kept from a failure message in the report.
pub const ERROR_MAX_CHARS: usize = 200;

/// Identifier of a remote model as the provider names it, e.g. `qwen/qwen3-32b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, From, Into, Display, AsRef, FromStr)]
#[serde(transparent)]
pub struct ModelId(String);

#[bon]
impl ModelId {
    #[builder]
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for ModelId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Status column of a report row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbeStatus {
    Success,
    Error,
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a single probe produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Full completion text, never truncated.
    Success { response: String },
    /// Failure cause, at most [`ERROR_MAX_CHARS`] characters.
    Error { error: String },
}

impl ProbeOutcome {
    pub fn failure(err: &ChatError) -> Self {
        Self::failure_message(&err.to_string())
    }

    pub fn failure_message(message: &str) -> Self {
        Self::Error {
            error: truncate_chars(message, ERROR_MAX_CHARS),
        }
    }

    pub fn status(&self) -> ProbeStatus {
        match self {
            Self::Success { .. } => ProbeStatus::Success,
            Self::Error { .. } => ProbeStatus::Error,
        }
    }
}

/// One row of the run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ProbeRecord", try_from = "ProbeRecord")]
pub struct ProbeResult {
    pub model: ModelId,
    pub outcome: ProbeOutcome,
    pub elapsed: Duration,
}

impl ProbeResult {
    pub fn new(model: ModelId, outcome: ProbeOutcome, elapsed: Duration) -> Self {
        Self { model, outcome, elapsed }
    }

    pub fn status(&self) -> ProbeStatus {
        self.outcome.status()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Success { .. })
    }

    /// Elapsed seconds rounded to two decimals, as written to the report.
    pub fn time_secs(&self) -> f64 {
        round_secs(self.elapsed)
    }

    pub fn response(&self) -> Option<&str> {
        match &self.outcome {
            ProbeOutcome::Success { response } => Some(response),
            ProbeOutcome::Error { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            ProbeOutcome::Error { error } => Some(error),
            ProbeOutcome::Success { .. } => None,
        }
    }
}

pub fn round_secs(d: Duration) -> f64 {
    (d.as_secs_f64() * 100.0).round() / 100.0
}

/// Flat JSON shape of a report row: `model`, `status`, `time`, then `response` or `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProbeRecord {
    model: ModelId,
    status: ProbeStatus,
    time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<ProbeResult> for ProbeRecord {
    fn from(r: ProbeResult) -> Self {
        let time = r.time_secs();
        let status = r.status();
        let (response, error) = match r.outcome {
            ProbeOutcome::Success { response } => (Some(response), None),
            ProbeOutcome::Error { error } => (None, Some(error)),
        };
        Self { model: r.model, status, time, response, error }
    }
}

impl TryFrom<ProbeRecord> for ProbeResult {
    type Error = String;

    fn try_from(rec: ProbeRecord) -> Result<Self, Self::Error> {
        let elapsed = Duration::try_from_secs_f64(rec.time)
            .map_err(|e| format!("invalid time {} for model {}: {}", rec.time, rec.model, e))?;
        let outcome = match (rec.status, rec.response, rec.error) {
            (ProbeStatus::Success, Some(response), None) => ProbeOutcome::Success { response },
            (ProbeStatus::Error, None, Some(error)) => ProbeOutcome::Error { error },
            (status, _, _) => {
                return Err(format!(
                    "row for model {} with status {} must carry exactly one of response/error",
                    rec.model, status
                ));
            }
        };
        Ok(Self {
            model: rec.model,
            outcome,
            elapsed,
        })
    }
}

/// Ordered results of one run, serialized as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunReport {
    results: Vec<ProbeResult>,
}

impl RunReport {
    pub fn new(results: Vec<ProbeResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[ProbeResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn summary(&self) -> RunSummary {
        let mut fastest: Vec<(ModelId, Duration)> = self
            .results
            .iter()
            .filter(|r| r.is_success())
            .map(|r| (r.model.clone(), r.elapsed))
            .collect();
        // stable: ties keep run order
        fastest.sort_by_key(|(_, elapsed)| *elapsed);
        let failed = self
            .results
            .iter()
            .filter_map(|r| r.error().map(|e| (r.model.clone(), e.to_string())))
            .collect();
        RunSummary {
            total: self.results.len(),
            fastest,
            failed,
        }
    }
}

/// Aggregate view of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    /// Successful models, ascending by elapsed time.
    pub fastest: Vec<(ModelId, Duration)>,
    /// Failed models with their stored error text, in run order.
    pub failed: Vec<(ModelId, String)>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.fastest.len()
    }

    /// `succeeded/total`, e.g. `1/2`.
    pub fn ratio(&self) -> String {
        format!("{}/{}", self.succeeded(), self.total)
    }
}
