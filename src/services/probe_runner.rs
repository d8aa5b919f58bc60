use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use futures_util::stream::{self, StreamExt};
use tokio::time::{Instant, sleep, timeout};
use tracing::{info, warn};

use crate::errors::ChatError;
use crate::models::chat::{ChatRequest, SamplingParams};
use crate::models::types::{ModelId, ProbeOutcome, ProbeResult, RunReport};
use crate::services::pacer::Pacer;
use crate::traits::chat_api::ChatApi;
use crate::traits::publisher::Publisher;

pub const DEFAULT_PAUSE: Duration = Duration::from_secs(2);
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Sends one prompt to every target and collects one result per target.
///
/// With `concurrency == 1` targets are probed strictly in order with a fixed
/// pause after each call (including the last unless `pause_after_last` is off).
/// With more, up to `concurrency` calls are in flight, call starts are spaced
/// by `pause`, and results still come back in target order.
#[derive(Builder)]
pub struct ProbeRunner {
    chat_api: Arc<dyn ChatApi>,
    targets: Vec<ModelId>,
    #[builder(into)]
    prompt: String,
    #[builder(default)]
    params: SamplingParams,
    #[builder(default = DEFAULT_PAUSE)]
    pause: Duration,
    #[builder(default = true)]
    pause_after_last: bool,
    #[builder(default = DEFAULT_CALL_TIMEOUT)]
    call_timeout: Duration,
    #[builder(default = 1)]
    concurrency: usize,
    #[builder(default)]
    listeners: Vec<Arc<dyn Publisher>>,
}

impl ProbeRunner {
    pub fn targets(&self) -> &[ModelId] {
        &self.targets
    }

    pub async fn run(&self) -> RunReport {
        let total = self.targets.len();
        info!(total, concurrency = self.concurrency, pause_ms = self.pause.as_millis() as u64, "probe run: start");
        for l in &self.listeners {
            l.on_run_started(total).await;
        }

        let results = if self.concurrency <= 1 {
            self.run_sequential().await
        } else {
            self.run_concurrent().await
        };

        let report = RunReport::new(results);
        let summary = report.summary();
        info!(succeeded = summary.succeeded(), total = summary.total, "probe run: done");
        report
    }

    async fn run_sequential(&self) -> Vec<ProbeResult> {
        let total = self.targets.len();
        let mut results = Vec::with_capacity(total);
        for (index, model) in self.targets.iter().enumerate() {
            results.push(self.probe(index, model).await);
            let is_last = index + 1 == total;
            if !is_last || self.pause_after_last {
                sleep(self.pause).await;
            }
        }
        results
    }

    async fn run_concurrent(&self) -> Vec<ProbeResult> {
        let pacer = Pacer::new(self.pause);
        let pacer = &pacer;
        stream::iter(self.targets.iter().enumerate())
            .map(|(index, model)| async move {
                pacer.wait().await;
                self.probe(index, model).await
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// One start → call → classify → record cycle. Never fails.
    async fn probe(&self, index: usize, model: &ModelId) -> ProbeResult {
        let total = self.targets.len();
        for l in &self.listeners {
            l.on_probe_started(index, total, model).await;
        }

        let request = ChatRequest::user_prompt(model.clone(), &self.prompt, self.params);
        let started = Instant::now();
        let outcome = match timeout(self.call_timeout, self.chat_api.chat_completion(&request)).await {
            Ok(Ok(response)) => ProbeOutcome::Success { response },
            Ok(Err(e)) => ProbeOutcome::failure(&e),
            Err(_) => ProbeOutcome::failure(&ChatError::Timeout(self.call_timeout)),
        };
        let elapsed = started.elapsed();

        let result = ProbeResult::new(model.clone(), outcome, elapsed);
        match result.error() {
            None => info!(model = %model, index = index + 1, total, time = result.time_secs(), "probe succeeded"),
            Some(err) => warn!(model = %model, index = index + 1, total, time = result.time_secs(), error = %err, "probe failed"),
        }

        for l in &self.listeners {
            l.on_probe_finished(index, total, &result).await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::{ERROR_MAX_CHARS, ProbeStatus};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Clone)]
    enum Reply {
        Text(&'static str),
        Api(u16, String),
        Hang,
    }

    /// Answers each model after a fixed delay with a scripted reply.
    struct ScriptedChatApi {
        script: HashMap<String, (Duration, Reply)>,
        calls: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedChatApi {
        fn new(entries: Vec<(&str, u64, Reply)>) -> Arc<Self> {
            let script = entries
                .into_iter()
                .map(|(m, ms, r)| (m.to_string(), (Duration::from_millis(ms), r)))
                .collect();
            Arc::new(Self { script, calls: Mutex::new(Vec::new()) })
        }

        fn called_models(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|r| r.model.to_string()).collect()
        }
    }

    #[async_trait]
    impl ChatApi for ScriptedChatApi {
        async fn chat_completion(&self, request: &ChatRequest) -> Result<String, ChatError> {
            self.calls.lock().unwrap().push(request.clone());
            let (delay, reply) = self
                .script
                .get(request.model.as_str())
                .cloned()
                .unwrap_or((Duration::ZERO, Reply::Api(404, "model not found".into())));
            sleep(delay).await;
            match reply {
                Reply::Text(t) => Ok(t.to_string()),
                Reply::Api(status, message) => Err(ChatError::Api { status, message }),
                Reply::Hang => {
                    sleep(Duration::from_secs(3600)).await;
                    Ok("too late".into())
                }
            }
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        fn name(&self) -> &str {
            "recording"
        }
        async fn on_run_started(&self, total: usize) {
            self.events.lock().unwrap().push(format!("run {}", total));
        }
        async fn on_probe_started(&self, index: usize, total: usize, model: &ModelId) {
            self.events.lock().unwrap().push(format!("start {}/{} {}", index + 1, total, model));
        }
        async fn on_probe_finished(&self, index: usize, _total: usize, result: &ProbeResult) {
            self.events.lock().unwrap().push(format!("done {} {}", index + 1, result.status()));
        }
        async fn publish(&self, _report: &RunReport) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }
    }

    fn models(ids: &[&str]) -> Vec<ModelId> {
        ids.iter().copied().map(ModelId::from).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn success_and_timeout_are_both_recorded() {
        let api = ScriptedChatApi::new(vec![("model-A", 500, Reply::Text("ok")), ("model-B", 0, Reply::Hang)]);
        let runner = ProbeRunner::builder()
            .chat_api(api.clone())
            .targets(models(&["model-A", "model-B"]))
            .prompt("p")
            .call_timeout(Duration::from_millis(1200))
            .build();

        let report = runner.run().await;

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!([
                {"model": "model-A", "status": "SUCCESS", "time": 0.5, "response": "ok"},
                {"model": "model-B", "status": "ERROR", "time": 1.2, "error": "request timed out after 1.2s"}
            ])
        );
        assert_eq!(report.summary().ratio(), "1/2");
        assert_eq!(api.called_models(), vec!["model-A", "model-B"]);
    }

    #[tokio::test(start_paused = true)]
    async fn one_result_per_target_in_order() {
        let api = ScriptedChatApi::new(vec![
            ("a", 300, Reply::Text("A")),
            ("b", 100, Reply::Api(429, "Rate limit reached".into())),
            ("c", 200, Reply::Text("C")),
            ("d", 50, Reply::Api(401, "Invalid API Key".into())),
        ]);
        let runner = ProbeRunner::builder()
            .chat_api(api.clone())
            .targets(models(&["a", "b", "c", "d", "unknown"]))
            .prompt("p")
            .build();

        let report = runner.run().await;
        let order: Vec<&str> = report.results().iter().map(|r| r.model.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c", "d", "unknown"]);
        let statuses: Vec<ProbeStatus> = report.results().iter().map(|r| r.status()).collect();
        assert_eq!(
            statuses,
            vec![ProbeStatus::Success, ProbeStatus::Error, ProbeStatus::Success, ProbeStatus::Error, ProbeStatus::Error]
        );
        assert_eq!(report.results()[1].error(), Some("API error 429: Rate limit reached"));
        assert_eq!(report.results()[4].error(), Some("API error 404: model not found"));

        let summary = report.summary();
        let fastest: Vec<&str> = summary.fastest.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(fastest, vec!["c", "a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn sends_prompt_as_single_user_message_with_params() {
        let api = ScriptedChatApi::new(vec![("m", 0, Reply::Text("x"))]);
        let params = SamplingParams { temperature: 0.2, max_tokens: 64 };
        let runner = ProbeRunner::builder()
            .chat_api(api.clone())
            .targets(models(&["m"]))
            .prompt("hello there")
            .params(params)
            .build();
        runner.run().await;

        let calls = api.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ChatRequest::user_prompt(ModelId::from("m"), "hello there", params));
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_after_every_call_including_last() {
        let api = ScriptedChatApi::new(vec![("a", 100, Reply::Text("A")), ("b", 100, Reply::Text("B"))]);
        let start = Instant::now();
        ProbeRunner::builder()
            .chat_api(api.clone())
            .targets(models(&["a", "b"]))
            .prompt("p")
            .build()
            .run()
            .await;
        assert_eq!(start.elapsed(), Duration::from_millis(100 + 2000 + 100 + 2000));

        let start = Instant::now();
        ProbeRunner::builder()
            .chat_api(api)
            .targets(models(&["a", "b"]))
            .prompt("p")
            .pause_after_last(false)
            .build()
            .run()
            .await;
        assert_eq!(start.elapsed(), Duration::from_millis(100 + 2000 + 100));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_target_list_makes_no_calls() {
        let api = ScriptedChatApi::new(vec![]);
        let start = Instant::now();
        let report = ProbeRunner::builder()
            .chat_api(api.clone())
            .targets(Vec::new())
            .prompt("p")
            .build()
            .run()
            .await;
        assert!(report.is_empty());
        assert_eq!(report.summary().ratio(), "0/0");
        assert!(api.called_models().is_empty());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn long_errors_are_bounded() {
        let api = ScriptedChatApi::new(vec![("m", 0, Reply::Api(500, "e".repeat(5000)))]);
        let report = ProbeRunner::builder()
            .chat_api(api)
            .targets(models(&["m"]))
            .prompt("p")
            .build()
            .run()
            .await;
        let err = report.results()[0].error().unwrap();
        assert_eq!(err.chars().count(), ERROR_MAX_CHARS);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_runs_differ_only_in_timing() {
        let script = || {
            ScriptedChatApi::new(vec![
                ("a", 10, Reply::Text("A")),
                ("b", 20, Reply::Api(503, "over capacity".into())),
            ])
        };
        let strip = |report: RunReport| -> Vec<(ModelId, ProbeOutcome)> {
            report.results().iter().map(|r| (r.model.clone(), r.outcome.clone())).collect()
        };
        let first = ProbeRunner::builder().chat_api(script()).targets(models(&["a", "b"])).prompt("p").build();
        let second = ProbeRunner::builder().chat_api(script()).targets(models(&["a", "b"])).prompt("p").build();
        assert_eq!(strip(first.run().await), strip(second.run().await));
    }

    #[tokio::test(start_paused = true)]
    async fn listeners_see_progress_in_order() {
        let api = ScriptedChatApi::new(vec![("a", 0, Reply::Text("A")), ("b", 0, Reply::Api(400, "bad".into()))]);
        let recorder = Arc::new(RecordingPublisher::default());
        ProbeRunner::builder()
            .chat_api(api)
            .targets(models(&["a", "b"]))
            .prompt("p")
            .listeners(vec![recorder.clone() as Arc<dyn Publisher>])
            .build()
            .run()
            .await;
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["run 2", "start 1/2 a", "done 1 SUCCESS", "start 2/2 b", "done 2 ERROR"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_mode_keeps_order_and_isolates_failures() {
        let api = ScriptedChatApi::new(vec![
            ("slow", 5000, Reply::Text("S")),
            ("broken", 10, Reply::Api(500, "boom".into())),
            ("fast", 10, Reply::Text("F")),
        ]);
        let start = Instant::now();
        let report = ProbeRunner::builder()
            .chat_api(api.clone())
            .targets(models(&["slow", "broken", "fast"]))
            .prompt("p")
            .pause(Duration::from_millis(100))
            .concurrency(3)
            .build()
            .run()
            .await;

        let order: Vec<&str> = report.results().iter().map(|r| r.model.as_str()).collect();
        assert_eq!(order, vec!["slow", "broken", "fast"]);
        assert_eq!(report.results()[1].error(), Some("API error 500: boom"));
        assert_eq!(report.results()[2].response(), Some("F"));
        let mut called = api.called_models();
        called.sort();
        assert_eq!(called, vec!["broken", "fast", "slow"]);
        // calls overlap: total is bounded by the slow call, not the sum
        assert!(start.elapsed() < Duration::from_millis(5500));
    }
}
