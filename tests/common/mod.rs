#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use assert_fs::TempDir;
use assert_fs::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use modelprobe::services::settings::AppConfig;

pub const KEY_NAME: &str = "EXPO_PUBLIC_GROQ_API_KEY";
pub const KEY_VALUE: &str = "gsk_test_key";

/// `.env`-style file with the Groq key among unrelated entries.
pub fn write_credentials(dir: &TempDir) -> PathBuf {
    let env = dir.child(".env");
    env.write_str(&format!("EXPO_PUBLIC_FIREBASE_API_KEY=unrelated\n{}={}\n", KEY_NAME, KEY_VALUE))
        .unwrap();
    env.path().to_path_buf()
}

pub fn test_config(base: &str, credentials: PathBuf, output: PathBuf, models: &[&str]) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.provider.base_url = Some(base.to_string());
    cfg.provider.credential_file = Some(credentials);
    cfg.provider.request_timeout_secs = Some(5);
    cfg.probe.models = Some(models.iter().map(|m| m.to_string()).collect());
    cfg.probe.prompt = Some("Output ONLY JSON array".to_string());
    cfg.probe.pause_ms = Some(0);
    cfg.output.file_path = Some(output);
    cfg.output.console_enabled = Some(false);
    cfg
}

pub fn completion_body(text: &str) -> Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1700000000,
        "model": "test",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

pub async fn mount_completion(server: &MockServer, model: &str, text: &str, delay: Duration) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": model})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(text)).set_delay(delay))
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_api_error(server: &MockServer, model: &str, status: u16, message: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": model})))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_json(json!({"error": {"message": message, "type": "invalid_request_error"}})),
        )
        .expect(1)
        .mount(server)
        .await;
}

pub async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map(|r| r.len()).unwrap_or(0)
}

pub fn read_report(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}
