use crate::editor::EditorEvents;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Which pipeline a status update belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    Explain,
    Edit,
}

/// User-visible state of one pipeline; every message is display-ready
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum PipelineStatus {
    Idle,
    Running(String),
    Succeeded(String),
    Failed(String),
}

impl PipelineStatus {
    pub fn message(&self) -> &str {
        match self {
            PipelineStatus::Idle => "Ready",
            PipelineStatus::Running(msg)
            | PipelineStatus::Succeeded(msg)
            | PipelineStatus::Failed(msg) => msg,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, PipelineStatus::Running(_))
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Single status slot per pipeline. Last write wins.
#[derive(Clone)]
pub(crate) struct StatusCell {
    kind: PipelineKind,
    inner: Arc<Mutex<PipelineStatus>>,
    events: Arc<dyn EditorEvents>,
}

impl StatusCell {
    pub(crate) fn new(kind: PipelineKind, events: Arc<dyn EditorEvents>) -> Self {
        Self {
            kind,
            inner: Arc::new(Mutex::new(PipelineStatus::Idle)),
            events,
        }
    }

    pub(crate) fn set(&self, status: PipelineStatus) {
        if let Ok(mut current) = self.inner.lock() {
            *current = status.clone();
        }
        self.events.on_status_changed(self.kind, &status);
    }

    pub(crate) fn get(&self) -> PipelineStatus {
        self.inner
            .lock()
            .map(|s| s.clone())
            .unwrap_or(PipelineStatus::Idle)
    }
}
