use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::errors::ConfigError;

/// Reads the secret stored under `key` in a file of `KEY=VALUE` lines.
///
/// The value is the literal text after the first `=`, trimmed; no quoting or
/// `$VAR` expansion is applied. Blank lines, `#` comments and lines without
/// `=` are skipped. When the file does not exist the process environment is
/// consulted instead, so a key exported by the shell works too.
pub fn load_api_key(path: &Path, key: &str) -> Result<String, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), key, "credential file absent, checking environment");
        return match std::env::var(key) {
            Ok(value) => non_empty(value, key, path),
            Err(_) => Err(ConfigError::MissingCredential {
                key: key.to_string(),
                path: path.to_path_buf(),
            }),
        };
    }

    let text = fs::read_to_string(path).map_err(|source| ConfigError::CredentialFile {
        path: path.to_path_buf(),
        source,
    })?;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.split_once('=') {
            Some((name, value)) if name.trim() == key => return non_empty(value.to_string(), key, path),
            Some(_) => {}
            None => warn!(path = %path.display(), line = lineno + 1, "credential file: skipping line without '='"),
        }
    }

    Err(ConfigError::MissingCredential {
        key: key.to_string(),
        path: path.to_path_buf(),
    })
}

fn non_empty(value: String, key: &str, path: &Path) -> Result<String, ConfigError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ConfigError::EmptyCredential {
            key: key.to_string(),
            path: path.to_path_buf(),
        });
    }
    Ok(value)
}
