//! The assistant side panel: mode switching over the two pipelines
//!
//! Explanations and agent edits never run for the same mode. Entering Vibe
//! drops any pending explanation; leaving it re-arms the debounce with the
//! last code the panel saw.

use super::edit::EditPipeline;
use super::explain::ExplainPipeline;
use super::gemini::GeminiProvider;
use super::provider::Provider;
use super::status::PipelineStatus;
use super::AssistantMode;
use crate::config::AssistantSettings;
use crate::editor::EditorEvents;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Default)]
struct PanelState {
    mode: AssistantMode,
    /// Last `(file, code)` pair handed to `observe`
    observed: Option<(String, String)>,
}

pub struct AssistantPanel {
    state: Mutex<PanelState>,
    explain: ExplainPipeline,
    edit: EditPipeline,
    busy: AtomicBool,
}

/// Clears the busy flag when the edit task ends, even if it is dropped mid-await
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AssistantPanel {
    pub fn new(
        settings: &AssistantSettings,
        provider: Arc<dyn Provider>,
        events: Arc<dyn EditorEvents>,
    ) -> Self {
        Self {
            state: Mutex::new(PanelState::default()),
            explain: ExplainPipeline::new(
                Arc::clone(&provider),
                Arc::clone(&events),
                settings.explain_debounce,
            ),
            edit: EditPipeline::new(provider, events),
            busy: AtomicBool::new(false),
        }
    }

    /// Panel backed by the Gemini provider
    pub fn with_gemini(
        settings: &AssistantSettings,
        events: Arc<dyn EditorEvents>,
    ) -> anyhow::Result<Self> {
        let provider = GeminiProvider::new(settings)?;
        Ok(Self::new(settings, Arc::new(provider), events))
    }

    pub fn mode(&self) -> AssistantMode {
        self.lock_state().mode
    }

    /// Switch modes. Must be called from within a Tokio runtime.
    pub fn set_mode(&self, mode: AssistantMode) {
        let mut state = self.lock_state();
        if state.mode == mode {
            return;
        }
        state.mode = mode;
        debug!(?mode, "assistant mode changed");

        match mode.explain_mode() {
            None => {
                self.explain.cancel_pending();
            }
            Some(explain_mode) => {
                if let Some((file, code)) = &state.observed {
                    self.explain.schedule(explain_mode, file, code);
                }
            }
        }
    }

    /// Record the active file's latest code. Must be called from within a
    /// Tokio runtime.
    pub fn observe(&self, file_name: &str, code: &str) {
        let mut state = self.lock_state();
        let unchanged = state
            .observed
            .as_ref()
            .is_some_and(|(f, c)| f == file_name && c == code);
        if unchanged {
            return;
        }
        state.observed = Some((file_name.to_string(), code.to_string()));

        if let Some(explain_mode) = state.mode.explain_mode() {
            self.explain.schedule(explain_mode, file_name, code);
        }
    }

    /// Whether an agent edit is in flight (the Vibe trigger is disabled)
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run an agent edit. Returns `None` without touching the pipeline while
    /// a previous task is still running.
    pub async fn run_vibe_task(
        &self,
        file_name: &str,
        content: &str,
        request: &str,
    ) -> Option<PipelineStatus> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(file = file_name, "vibe task ignored while another is running");
            return None;
        }
        let _guard = BusyGuard(&self.busy);
        Some(self.edit.run_edit_task(file_name, content, request).await)
    }

    pub fn explain_status(&self) -> PipelineStatus {
        self.explain.status()
    }

    pub fn edit_status(&self) -> PipelineStatus {
        self.edit.status()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, PanelState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::ProviderError;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::{mpsc, Notify};

    /// Records prompts; optionally parks each call until released
    struct StubProvider {
        reply: &'static str,
        prompts: Mutex<Vec<String>>,
        gate: Option<Arc<Notify>>,
    }

    impl StubProvider {
        fn new(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply,
                prompts: Mutex::new(Vec::new()),
                gate: None,
            })
        }

        fn gated(reply: &'static str, gate: Arc<Notify>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                prompts: Mutex::new(Vec::new()),
                gate: Some(gate),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Provider for StubProvider {
        async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(self.reply.to_string())
        }
    }

    struct Explanations(mpsc::UnboundedSender<String>);

    impl EditorEvents for Explanations {
        fn on_explanation_ready(&self, display_text: &str) {
            let _ = self.0.send(display_text.to_string());
        }
    }

    fn settings() -> AssistantSettings {
        AssistantSettings {
            explain_debounce: Duration::from_millis(1500),
            ..AssistantSettings::default()
        }
    }

    fn panel(provider: Arc<StubProvider>) -> (AssistantPanel, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let panel = AssistantPanel::new(&settings(), provider, Arc::new(Explanations(tx)));
        (panel, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_vibe_mode_never_explains() {
        let provider = StubProvider::new("[]");
        let (panel, _rx) = panel(provider.clone());

        panel.set_mode(AssistantMode::Vibe);
        panel.observe("a.py", "def f(): pass");
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(provider.prompts().is_empty());
        assert_eq!(panel.explain_status(), PipelineStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entering_vibe_cancels_pending_explanation() {
        let provider = StubProvider::new("[]");
        let (panel, _rx) = panel(provider.clone());

        panel.observe("a.py", "def f(): pass");
        tokio::time::sleep(Duration::from_millis(1000)).await;
        panel.set_mode(AssistantMode::Vibe);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(provider.prompts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_switch_reschedules_with_last_code() {
        let provider = StubProvider::new("[]");
        let (panel, mut rx) = panel(provider.clone());

        panel.observe("a.py", "def f(): pass");
        panel.set_mode(AssistantMode::Reviewer);
        rx.recv().await.unwrap();

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("You are a senior code reviewer."));
        assert!(prompts[0].contains("def f(): pass"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_vibe_explains_last_observed_code() {
        let provider = StubProvider::new("[]");
        let (panel, mut rx) = panel(provider.clone());

        panel.set_mode(AssistantMode::Vibe);
        panel.observe("a.py", "x = 1");
        panel.set_mode(AssistantMode::Teacher);

        assert_eq!(rx.recv().await.unwrap(), "No functions found for analysis.");
        assert!(provider.prompts()[0].contains("x = 1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_code_does_not_retrigger() {
        let provider = StubProvider::new("[]");
        let (panel, mut rx) = panel(provider.clone());

        panel.observe("a.py", "x = 1");
        rx.recv().await.unwrap();
        panel.observe("a.py", "x = 1");
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(provider.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_vibe_trigger_disabled_while_running() {
        let gate = Arc::new(Notify::new());
        let provider = StubProvider::gated(r#"{"updatedContent":"new"}"#, gate.clone());
        let (panel, _rx) = panel(provider.clone());
        let panel = Arc::new(panel);
        panel.set_mode(AssistantMode::Vibe);

        let first = tokio::spawn({
            let panel = Arc::clone(&panel);
            async move { panel.run_vibe_task("a.py", "old", "rewrite").await }
        });
        while provider.prompts().is_empty() {
            tokio::task::yield_now().await;
        }

        assert!(panel.is_busy());
        assert_eq!(panel.run_vibe_task("a.py", "old", "again").await, None);

        gate.notify_one();
        let status = first.await.unwrap().unwrap();

        assert_eq!(status.message(), "Applied update to a.py.");
        assert_eq!(provider.prompts().len(), 1);
        assert!(!panel.is_busy());
        assert_eq!(panel.edit_status(), status);
    }
}
