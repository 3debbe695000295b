//! Editor boundary
//!
//! The presentation layer implements [`EditorEvents`] to receive results;
//! every method defaults to a no-op so hosts only wire what they render.

mod selection;

pub use selection::{selected_text, SelectionBounds, SelectionTracker};

use crate::assistant::{PipelineKind, PipelineStatus};

pub trait EditorEvents: Send + Sync {
    /// The agent committed a full-file replacement of the active file
    fn on_content_replaced(&self, _new_content: &str) {}

    fn on_explanation_ready(&self, _display_text: &str) {}

    fn on_status_changed(&self, _pipeline: PipelineKind, _status: &PipelineStatus) {}

    fn on_selection_changed(&self, _text: &str) {}
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEvents;

impl EditorEvents for NoopEvents {}
