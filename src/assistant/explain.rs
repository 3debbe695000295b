//! Per-function explanations, requested once the code has been idle
//!
//! Every change restarts the debounce timer. Once the timer fires the
//! provider call is detached, so a newer trigger never cancels a request
//! that is already in flight; whichever finishes last owns the display.

use super::parse::{parse_explanations, ExplanationEntry};
use super::prompts::explain_prompt;
use super::provider::Provider;
use super::status::{PipelineKind, PipelineStatus, StatusCell};
use super::ExplainMode;
use crate::editor::EditorEvents;
use crate::util::truncate;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

pub const NO_FUNCTIONS: &str = "No functions found for analysis.";
pub const UNABLE_TO_PARSE: &str =
    "Unable to parse AI response. Try editing code or switching mode.";

const REPLY_PREVIEW_CHARS: usize = 120;

/// Render entries as `name: explanation` lines
pub fn render_explanations(entries: &[ExplanationEntry]) -> String {
    if entries.is_empty() {
        return NO_FUNCTIONS.to_string();
    }
    entries
        .iter()
        .map(|e| format!("{}: {}", e.function_name, e.explanation))
        .collect::<Vec<_>>()
        .join("\n")
}

struct Analyzer {
    provider: Arc<dyn Provider>,
    events: Arc<dyn EditorEvents>,
    status: StatusCell,
}

impl Analyzer {
    async fn analyze(&self, mode: ExplainMode, file_name: &str, code: &str) -> PipelineStatus {
        self.status
            .set(PipelineStatus::Running(format!("Analyzing {}...", file_name)));

        let prompt = explain_prompt(mode, file_name, code);
        debug!(file = file_name, ?mode, prompt_len = prompt.len(), "requesting explanations");

        let outcome = match self.provider.generate(&prompt).await {
            Ok(raw) => match parse_explanations(&raw) {
                Ok(entries) => {
                    self.events.on_explanation_ready(&render_explanations(&entries));
                    PipelineStatus::Succeeded(format!("Explained {} function(s).", entries.len()))
                }
                Err(err) => {
                    warn!(
                        file = file_name,
                        error = %err,
                        reply = %truncate(&raw, REPLY_PREVIEW_CHARS),
                        "explanation reply rejected"
                    );
                    self.fail(UNABLE_TO_PARSE.to_string())
                }
            },
            Err(err) => match err.missing_credential() {
                Some(credential) => self.fail(format!("Set {} to enable AI features.", credential)),
                None => {
                    warn!(file = file_name, error = %err, "explanation request failed");
                    self.fail(UNABLE_TO_PARSE.to_string())
                }
            },
        };

        self.status.set(outcome.clone());
        outcome
    }

    /// Failures replace the explanation display as well as the status
    fn fail(&self, message: String) -> PipelineStatus {
        self.events.on_explanation_ready(&message);
        PipelineStatus::Failed(message)
    }
}

pub struct ExplainPipeline {
    analyzer: Arc<Analyzer>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl ExplainPipeline {
    pub fn new(
        provider: Arc<dyn Provider>,
        events: Arc<dyn EditorEvents>,
        delay: Duration,
    ) -> Self {
        let status = StatusCell::new(PipelineKind::Explain, Arc::clone(&events));
        Self {
            analyzer: Arc::new(Analyzer {
                provider,
                events,
                status,
            }),
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn status(&self) -> PipelineStatus {
        self.analyzer.status.get()
    }

    /// Restart the debounce timer for the latest code.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule(&self, mode: ExplainMode, file_name: &str, code: &str) {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = pending.take() {
            previous.abort();
            trace!("explain debounce restarted");
        }

        let analyzer = Arc::clone(&self.analyzer);
        let delay = self.delay;
        let file_name = file_name.to_string();
        let code = code.to_string();
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(async move {
                analyzer.analyze(mode, &file_name, &code).await;
            });
        }));
    }

    /// Drop a pending (not yet fired) analysis. Returns true if one was waiting.
    pub fn cancel_pending(&self) -> bool {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// Analyze immediately, bypassing the debounce timer
    pub async fn analyze_now(
        &self,
        mode: ExplainMode,
        file_name: &str,
        code: &str,
    ) -> PipelineStatus {
        self.analyzer.analyze(mode, file_name, code).await
    }
}

impl Drop for ExplainPipeline {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(handle) = pending.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::ProviderError;
    use async_trait::async_trait;
    use tokio::sync::{mpsc, Notify};

    struct RecordingProvider {
        reply: Result<&'static str, &'static str>,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingProvider {
        fn replying(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn missing_key() -> Arc<Self> {
            Arc::new(Self {
                reply: Err("GEMINI_API_KEY"),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Provider for RecordingProvider {
        async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .map(str::to_string)
                .map_err(|credential| ProviderError::MissingCredential {
                    credential: credential.to_string(),
                })
        }
    }

    /// First call parks until `release` fires; later calls answer at once
    #[derive(Default)]
    struct GatedProvider {
        release: Notify,
        prompts: Mutex<Vec<String>>,
    }

    impl GatedProvider {
        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Provider for GatedProvider {
        async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
            let call = {
                let mut prompts = self.prompts.lock().unwrap();
                prompts.push(prompt.to_string());
                prompts.len()
            };
            if call == 1 {
                self.release.notified().await;
                return Ok(r#"[{"functionName":"first","explanation":"old code"}]"#.to_string());
            }
            Ok(r#"[{"functionName":"second","explanation":"new code"}]"#.to_string())
        }
    }

    struct Display(mpsc::UnboundedSender<String>);

    impl EditorEvents for Display {
        fn on_explanation_ready(&self, display_text: &str) {
            let _ = self.0.send(display_text.to_string());
        }
    }

    fn display() -> (Arc<Display>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Display(tx)), rx)
    }

    #[test]
    fn test_render_explanations() {
        let entries = vec![
            ExplanationEntry {
                function_name: "add".into(),
                explanation: "Adds two numbers.".into(),
            },
            ExplanationEntry {
                function_name: "main".into(),
                explanation: "Entry point.".into(),
            },
        ];
        assert_eq!(
            render_explanations(&entries),
            "add: Adds two numbers.\nmain: Entry point."
        );
        assert_eq!(render_explanations(&[]), NO_FUNCTIONS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_changes_triggers_one_analysis_with_latest_code() {
        let provider = RecordingProvider::replying(r#"[{"functionName":"f","explanation":"e"}]"#);
        let (events, mut rx) = display();
        let pipeline = ExplainPipeline::new(provider.clone(), events, Duration::from_millis(1500));

        pipeline.schedule(ExplainMode::Teacher, "a.py", "def first(): pass");
        tokio::time::sleep(Duration::from_millis(500)).await;
        pipeline.schedule(ExplainMode::Teacher, "a.py", "def second(): pass");

        assert_eq!(rx.recv().await.unwrap(), "f: e");
        tokio::time::sleep(Duration::from_secs(10)).await;

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("def second(): pass"));
        assert!(!prompts[0].contains("def first(): pass"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_changes_outside_window_each_trigger() {
        let provider = RecordingProvider::replying("[]");
        let (events, mut rx) = display();
        let pipeline = ExplainPipeline::new(provider.clone(), events, Duration::from_millis(100));

        pipeline.schedule(ExplainMode::Reviewer, "a.py", "one");
        assert_eq!(rx.recv().await.unwrap(), NO_FUNCTIONS);
        pipeline.schedule(ExplainMode::Reviewer, "a.py", "two");
        assert_eq!(rx.recv().await.unwrap(), NO_FUNCTIONS);

        assert_eq!(provider.prompts.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_pending_prevents_analysis() {
        let provider = RecordingProvider::replying("[]");
        let (events, _rx) = display();
        let pipeline = ExplainPipeline::new(provider.clone(), events, Duration::from_millis(100));

        pipeline.schedule(ExplainMode::Teacher, "a.py", "code");
        assert!(pipeline.cancel_pending());
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(provider.prompts.lock().unwrap().is_empty());
        assert!(!pipeline.cancel_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_trigger_does_not_cancel_in_flight_call() {
        let provider = Arc::new(GatedProvider::default());
        let (events, mut rx) = display();
        let pipeline = ExplainPipeline::new(provider.clone(), events, Duration::from_millis(100));

        pipeline.schedule(ExplainMode::Teacher, "a.py", "v1");
        while provider.calls() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        pipeline.schedule(ExplainMode::Teacher, "a.py", "v2");

        assert_eq!(rx.recv().await.unwrap(), "second: new code");
        provider.release.notify_one();
        assert_eq!(rx.recv().await.unwrap(), "first: old code");

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("v1"));
        assert!(prompts[1].contains("v2"));
    }

    #[tokio::test]
    async fn test_missing_credential_message() {
        let (events, mut rx) = display();
        let pipeline =
            ExplainPipeline::new(RecordingProvider::missing_key(), events, Duration::ZERO);

        let status = pipeline.analyze_now(ExplainMode::Teacher, "a.py", "code").await;

        let expected = "Set GEMINI_API_KEY to enable AI features.";
        assert_eq!(status, PipelineStatus::Failed(expected.into()));
        assert_eq!(rx.recv().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_unparseable_reply_shows_recovery_hint() {
        let (events, mut rx) = display();
        let pipeline = ExplainPipeline::new(
            RecordingProvider::replying("I found two functions!"),
            events,
            Duration::ZERO,
        );

        let status = pipeline.analyze_now(ExplainMode::Reviewer, "a.py", "code").await;

        assert_eq!(status.message(), UNABLE_TO_PARSE);
        assert_eq!(rx.recv().await.unwrap(), UNABLE_TO_PARSE);
        assert_eq!(pipeline.status(), status);
    }

    #[tokio::test]
    async fn test_reviewer_mode_uses_review_prompt() {
        let provider = RecordingProvider::replying("[]");
        let (events, _rx) = display();
        let pipeline = ExplainPipeline::new(provider.clone(), events, Duration::ZERO);

        pipeline.analyze_now(ExplainMode::Reviewer, "a.py", "code").await;

        assert!(provider.prompts.lock().unwrap()[0].starts_with("You are a senior code reviewer."));
    }
}
