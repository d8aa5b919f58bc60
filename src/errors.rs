use std::path::PathBuf;
use std::time::Duration;

/// Failures of a single chat-completion call. These never abort a run;
/// they become error rows in the report.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Transport failure (connect, DNS, TLS, body read).
    #[error("HTTP error: {}", error_chain(.0))]
    Http(#[from] reqwest::Error),
    /// Provider answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    /// The call did not finish within the per-call bound.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Body could not be decoded as a chat completion.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// Completion decoded but carried no text.
    #[error("empty response: {0}")]
    EmptyResponse(String),
}

/// Renders `err` followed by each distinct message in its `source()` chain.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let msg = cause.to_string();
        if !out.contains(&msg) {
            out.push_str(": ");
            out.push_str(&msg);
        }
        source = cause.source();
    }
    out
}

/// Problems detected before any probe runs. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to read prompt file {}: {source}", .path.display())]
    Prompt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("credential file {} could not be read: {source}", .path.display())]
    CredentialFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("credential {key} not found in {}", .path.display())]
    MissingCredential { key: String, path: PathBuf },
    #[error("credential {key} in {} is empty", .path.display())]
    EmptyCredential { key: String, path: PathBuf },
    #[error("invalid base url {url}: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}
