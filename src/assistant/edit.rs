//! Vibe agent loop: one prompt, one provider call, one full-file commit
//!
//! The pipeline does not queue or cancel; callers keep the trigger disabled
//! while a task is running.

use super::parse::{parse_edit, EditResult, MalformedResponse};
use super::prompts::edit_prompt;
use super::provider::Provider;
use super::status::{PipelineKind, PipelineStatus, StatusCell};
use crate::editor::EditorEvents;
use crate::util::truncate;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const NO_ACTIVE_FILE: &str = "No active file content available.";
pub const EMPTY_PROMPT: &str = "Enter a task prompt first.";
pub const GENERATING: &str = "Generating edits...";
pub const APPLY_FAILED: &str = "Unable to apply edits. Try refining the prompt.";
pub const NO_APPLICABLE_EDIT: &str = "Agent returned no applicable edit.";

const REPLY_PREVIEW_CHARS: usize = 120;

pub struct EditPipeline {
    provider: Arc<dyn Provider>,
    events: Arc<dyn EditorEvents>,
    status: StatusCell,
}

impl EditPipeline {
    pub fn new(provider: Arc<dyn Provider>, events: Arc<dyn EditorEvents>) -> Self {
        let status = StatusCell::new(PipelineKind::Edit, Arc::clone(&events));
        Self {
            provider,
            events,
            status,
        }
    }

    pub fn status(&self) -> PipelineStatus {
        self.status.get()
    }

    /// Run one agent turn against the active file and return the final status.
    ///
    /// Input problems are reported without calling the provider. On success
    /// the editor receives `updatedContent` verbatim.
    pub async fn run_edit_task(
        &self,
        file_name: &str,
        content: &str,
        request: &str,
    ) -> PipelineStatus {
        let outcome = self.execute(file_name, content, request).await;
        self.status.set(outcome.clone());
        outcome
    }

    async fn execute(&self, file_name: &str, content: &str, request: &str) -> PipelineStatus {
        if file_name.is_empty() || content.is_empty() {
            return PipelineStatus::Failed(NO_ACTIVE_FILE.to_string());
        }
        let request = request.trim();
        if request.is_empty() {
            return PipelineStatus::Failed(EMPTY_PROMPT.to_string());
        }

        self.status.set(PipelineStatus::Running(GENERATING.to_string()));

        let prompt = edit_prompt(request, file_name, content);
        debug!(file = file_name, prompt_len = prompt.len(), "requesting edit");

        let raw = match self.provider.generate(&prompt).await {
            Ok(raw) => raw,
            Err(err) => {
                if let Some(credential) = err.missing_credential() {
                    return PipelineStatus::Failed(format!("Set {} to use Vibe Coder.", credential));
                }
                warn!(file = file_name, error = %err, "edit request failed");
                return PipelineStatus::Failed(APPLY_FAILED.to_string());
            }
        };

        let edit = match parse_edit(&raw) {
            Ok(edit) => edit,
            Err(err @ MalformedResponse::Shape(_)) => {
                warn!(file = file_name, error = %err, "edit reply has no usable content");
                return PipelineStatus::Failed(NO_APPLICABLE_EDIT.to_string());
            }
            Err(err) => {
                warn!(
                    file = file_name,
                    error = %err,
                    reply = %truncate(&raw, REPLY_PREVIEW_CHARS),
                    "edit reply could not be decoded"
                );
                return PipelineStatus::Failed(APPLY_FAILED.to_string());
            }
        };

        self.commit(file_name, edit)
    }

    fn commit(&self, file_name: &str, edit: EditResult) -> PipelineStatus {
        if edit.updated_content.is_empty() {
            return PipelineStatus::Failed(NO_APPLICABLE_EDIT.to_string());
        }

        self.events.on_content_replaced(&edit.updated_content);
        info!(
            file = file_name,
            bytes = edit.updated_content.len(),
            "applied agent edit"
        );

        PipelineStatus::Succeeded(match edit.summary {
            Some(summary) => format!("{} (updated {})", summary, file_name),
            None => format!("Applied update to {}.", file_name),
        })
    }
}
